use bevy::prelude::*;

/// Number of simulation ticks executed since the run started.
#[derive(Resource, Default, Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub struct FrameCount {
    pub frame: u32,
}

/// Convert a duration in seconds into a whole number of ticks, rounding to nearest.
pub fn seconds_to_ticks(seconds: f32, tick_rate: u32) -> u32 {
    (seconds.max(0.0) * tick_rate as f32).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_round_to_ticks() {
        assert_eq!(seconds_to_ticks(0.2, 60), 12);
        assert_eq!(seconds_to_ticks(-1.0, 60), 0);
    }
}
