// src/config/mpqs_config.rs

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::relations::LargePrimeStrategy;

/// Process-wide tuning knobs, independent of any one factoring session's
/// digit-size-derived parameters (§6). Grounded on the teacher's
/// `GnfsConfig::load` file-then-env precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpqsConfig {
    /// Output directory for session snapshots.
    pub output_dir: String,

    /// Number of sieve worker threads (default: rayon's own default).
    pub threads: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    pub log_level: String,

    /// Upper bound on driver retry rounds before giving up (§4.9).
    pub max_rounds: usize,

    /// Cadence of progress events, in sieve polynomials processed.
    pub progress_interval: usize,
}

impl Default for MpqsConfig {
    fn default() -> Self {
        MpqsConfig {
            output_dir: ".".to_string(),
            threads: None,
            log_level: "info".to_string(),
            max_rounds: 100,
            progress_interval: 50,
        }
    }
}

impl MpqsConfig {
    /// Load with precedence: config file (`mpqs.toml`/`mpqs.yaml`) → env
    /// vars (`MPQS_*`) → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::with_defaults(Config::builder());

        if Path::new("mpqs.toml").exists() {
            builder = builder.add_source(File::with_name("mpqs.toml"));
        } else if Path::new("mpqs.yaml").exists() {
            builder = builder.add_source(File::with_name("mpqs.yaml"));
        }

        builder = builder.add_source(Environment::with_prefix("MPQS").separator("_").try_parsing(true));

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder = Self::with_defaults(Config::builder());

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(Environment::with_prefix("MPQS").separator("_").try_parsing(true));

        builder.build()?.try_deserialize()
    }

    fn with_defaults(builder: config::ConfigBuilder<config::builder::DefaultState>) -> config::ConfigBuilder<config::builder::DefaultState> {
        builder
            .set_default("output_dir", ".")
            .unwrap()
            .set_default("threads", None::<i64>)
            .unwrap()
            .set_default("log_level", "info")
            .unwrap()
            .set_default("max_rounds", 100)
            .unwrap()
            .set_default("progress_interval", 50)
            .unwrap()
    }
}

/// The digit-count-keyed parameter table from §6: factor base size, sieve
/// half-interval, large-prime tolerance, small-prime cutoff, and which
/// large-prime strategy to run by default at that scale.
#[derive(Debug, Clone, Copy)]
pub struct SizeParameters {
    pub digits: u32,
    pub factor_base_size: usize,
    pub sieve_interval: i64,
    pub large_prime_tolerance: i64,
    pub small_prime_cutoff: i64,
    pub strategy: LargePrimeStrategy,
}

const SIZE_TABLE: &[SizeParameters] = &[
    SizeParameters { digits: 24, factor_base_size: 100, sieve_interval: 5_000, large_prime_tolerance: 128 * 100, small_prime_cutoff: 11, strategy: LargePrimeStrategy::One },
    SizeParameters { digits: 30, factor_base_size: 200, sieve_interval: 10_000, large_prime_tolerance: 128 * 250, small_prime_cutoff: 17, strategy: LargePrimeStrategy::One },
    SizeParameters { digits: 36, factor_base_size: 400, sieve_interval: 25_000, large_prime_tolerance: 128 * 600, small_prime_cutoff: 23, strategy: LargePrimeStrategy::Two },
    SizeParameters { digits: 42, factor_base_size: 900, sieve_interval: 50_000, large_prime_tolerance: 128 * 1_300, small_prime_cutoff: 29, strategy: LargePrimeStrategy::Two },
    SizeParameters { digits: 48, factor_base_size: 1_700, sieve_interval: 100_000, large_prime_tolerance: 128 * 2_500, small_prime_cutoff: 31, strategy: LargePrimeStrategy::Two },
    SizeParameters { digits: 54, factor_base_size: 3_400, sieve_interval: 175_000, large_prime_tolerance: 128 * 4_500, small_prime_cutoff: 37, strategy: LargePrimeStrategy::Three },
    SizeParameters { digits: 60, factor_base_size: 6_000, sieve_interval: 300_000, large_prime_tolerance: 128 * 8_000, small_prime_cutoff: 41, strategy: LargePrimeStrategy::Three },
];

/// Looks up the smallest table entry whose digit count is >= `digits`,
/// falling back to the largest entry scaled linearly for anything bigger
/// (mirrors `factorbase::factor_base_size_for_digits`'s extrapolation rule).
pub fn size_parameters_for_digits(digits: u32) -> SizeParameters {
    for entry in SIZE_TABLE {
        if digits <= entry.digits {
            return *entry;
        }
    }
    let last = SIZE_TABLE.last().copied().unwrap();
    let extra = digits.saturating_sub(last.digits);
    SizeParameters {
        digits,
        factor_base_size: last.factor_base_size + (extra as usize) * 400,
        sieve_interval: last.sieve_interval + (extra as i64) * 20_000,
        large_prime_tolerance: last.large_prime_tolerance + (extra as i64) * 128 * 800,
        small_prime_cutoff: last.small_prime_cutoff,
        strategy: LargePrimeStrategy::Three,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = MpqsConfig::default();
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_rounds, 100);
    }

    #[test]
    fn load_without_file_falls_back_to_defaults() {
        let config = MpqsConfig::load().unwrap_or_else(|_| MpqsConfig::default());
        assert_eq!(config.output_dir, ".");
    }

    #[test]
    fn size_table_exact_hit() {
        let params = size_parameters_for_digits(24);
        assert_eq!(params.factor_base_size, 100);
        assert_eq!(params.strategy, LargePrimeStrategy::One);
    }

    #[test]
    fn size_table_extrapolates_past_the_end() {
        let params = size_parameters_for_digits(90);
        assert!(params.factor_base_size > 6_000);
        assert_eq!(params.strategy, LargePrimeStrategy::Three);
    }
}
