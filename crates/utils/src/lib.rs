pub mod cid;
pub mod clock;
pub mod frame;
pub mod logs;
pub mod rng;
