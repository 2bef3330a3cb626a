use std::path::PathBuf;

use utils::cid::run_log_suffix;

pub mod cli;

#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub seed: u64,
    pub max_ticks: u32,
    pub log_suffix: String,
    pub realtime: bool,
    pub json: bool,
}

impl From<cli::Opt> for RunArgs {
    fn from(opt: cli::Opt) -> Self {
        let seed = opt.seed.unwrap_or_else(rand::random::<u64>);
        Self {
            config: opt.config,
            seed,
            max_ticks: opt.max_ticks,
            log_suffix: opt.log_suffix.unwrap_or_else(|| run_log_suffix(seed)),
            realtime: opt.realtime,
            json: opt.json,
        }
    }
}

pub fn get_args() -> RunArgs {
    use clap::Parser;
    cli::Opt::parse().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn explicit_seed_names_the_log() {
        let args: RunArgs = cli::Opt::parse_from(["swarmshot", "--seed", "12", "--json"]).into();
        assert_eq!(args.seed, 12);
        assert!(args.json);
        assert!(args.log_suffix.starts_with("seed12_"));
        assert_eq!(args.max_ticks, 36_000);
    }
}
