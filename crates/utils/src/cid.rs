use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random alphanumeric tag used to tell concurrent runs apart in log file names.
pub fn generate_random_correlation_id_with_length(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn generate_random_correlation_id() -> String {
    generate_random_correlation_id_with_length(6)
}

/// Log suffix for a run: the seed keeps runs greppable, the id keeps them unique.
pub fn run_log_suffix(seed: u64) -> String {
    format!("seed{}_{}", seed, generate_random_correlation_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_has_requested_length() {
        assert_eq!(generate_random_correlation_id_with_length(10).len(), 10);
        assert!(run_log_suffix(42).starts_with("seed42_"));
    }
}
