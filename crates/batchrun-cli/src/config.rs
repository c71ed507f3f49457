//! Dispatch configuration from a config file and command-line flags.

use std::path::PathBuf;

use batchrun_core::DispatchConfig;
use clap::Args;

use crate::error::CliError;

/// Flags shared by `plan` and `run`. Each one overrides the config file,
/// which overrides the defaults.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// JSON file with dispatch configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum items per batch
    #[arg(short = 'b', long)]
    pub max_batch_size: Option<usize>,

    /// Split into this many near-equal batches instead
    #[arg(long)]
    pub batch_count: Option<usize>,

    /// Platform limit the batch size is checked against
    #[arg(long)]
    pub batch_size_ceiling: Option<usize>,

    /// Concurrent items within one batch
    #[arg(short = 'p', long)]
    pub max_parallel: Option<usize>,

    /// Batches running at the same time
    #[arg(long)]
    pub max_concurrent_batches: Option<usize>,

    /// Stop starting new items in a batch after its first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Per-item timeout in milliseconds (0 disables)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl ConfigArgs {
    /// Layer defaults, config file and flags, then validate.
    pub fn resolve(&self) -> Result<DispatchConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| CliError::ConfigFile {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => DispatchConfig::default(),
        };

        if let Some(size) = self.max_batch_size {
            config.max_batch_size = size;
        }
        if let Some(count) = self.batch_count {
            config.batch_count = Some(count);
        }
        if let Some(ceiling) = self.batch_size_ceiling {
            config.batch_size_ceiling = ceiling;
        }
        if let Some(parallel) = self.max_parallel {
            config.max_parallel_per_batch = Some(parallel);
        }
        if let Some(batches) = self.max_concurrent_batches {
            config.max_concurrent_batches = Some(batches);
        }
        if self.fail_fast {
            config.fail_fast_per_batch = true;
        }
        if let Some(ms) = self.timeout_ms {
            config.per_item_timeout_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchrun_core::CoreError;

    #[test]
    fn test_flags_override_defaults() {
        let args = ConfigArgs {
            max_batch_size: Some(100),
            max_parallel: Some(4),
            fail_fast: true,
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.max_parallel_per_batch, Some(4));
        assert!(config.fail_fast_per_batch);
        assert_eq!(config.max_concurrent_batches, None);
    }

    #[test]
    fn test_config_file_then_flags() {
        let path = std::env::temp_dir().join(format!("batchrun-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_batch_size": 10, "per_item_timeout_ms": 500}"#).unwrap();

        let args = ConfigArgs {
            config: Some(path.clone()),
            timeout_ms: Some(50),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.per_item_timeout_ms, 50);
    }

    #[test]
    fn test_out_of_range_batch_size_rejected() {
        let args = ConfigArgs {
            max_batch_size: Some(300),
            ..Default::default()
        };
        assert!(matches!(
            args.resolve(),
            Err(CliError::Core(CoreError::InvalidConfiguration(_)))
        ));
    }
}
