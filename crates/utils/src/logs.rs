use chrono::Local;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber: one plain-text file under `logs/` plus stdout.
/// The returned guard must be kept alive for the file writer to flush.
pub fn setup_logging(suffix: Option<String>) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let log_directory = Path::new("logs");

    if !log_directory.exists() {
        fs::create_dir_all(log_directory)?;
    }

    let suffix = suffix.unwrap_or_else(|| Local::now().format("%Y-%m-%d_%H-%M-%S").to_string());

    let log_filename = format!("sim_run_{}.log", suffix);
    let log_file_path = log_directory.join(log_filename);

    let file_appender = match fs::File::create(&log_file_path) {
        Ok(file) => file,
        Err(e) => {
            // Stderr only when the file can't be created.
            eprintln!("Failed to create log file {:?}: {}", log_file_path, e);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            let subscriber = tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
                .with(fmt::Layer::new().with_writer(non_blocking_writer));
            tracing::subscriber::set_global_default(subscriber)?;
            return Ok(guard);
        }
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            fmt::Layer::new()
                .with_writer(non_blocking_writer)
                .without_time()
                .with_ansi(false),
        )
        .with(fmt::Layer::new().with_writer(std::io::stdout));

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Logging initialized. Log file: {:?}", log_file_path);

    Ok(guard)
}
