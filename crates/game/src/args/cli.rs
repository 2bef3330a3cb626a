use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[clap(about = "Run the swarmshot simulation headless with a scripted player")]
pub struct Opt {
    /// RON run configuration; built-in defaults when absent
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    #[clap(short, long)]
    pub seed: Option<u64>,
    /// Stop after this many ticks even if the run is still going
    #[clap(long, default_value_t = 60 * 60 * 10)]
    pub max_ticks: u32,
    #[clap(long)]
    pub log_suffix: Option<String>,
    /// Pace steps on the wall clock instead of a synthetic fixed-step clock
    #[clap(long)]
    pub realtime: bool,
    /// Print the final summary as JSON
    #[clap(long)]
    pub json: bool,
}
