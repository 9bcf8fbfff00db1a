// src/persist/snapshot.rs

use std::fs;
use std::path::Path;

use num::bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::bigint::calc::serde_decimal;
use crate::core::error::MpqsResult;
use crate::factorbase::FactorBase;
use crate::relations::{LargePrimeStrategy, Relation};

/// Everything needed to resume a session: the chosen factor base, the
/// polynomial stream's cursor, and every full relation found so far.
///
/// Partial (large-prime) relations are intentionally not persisted -- on
/// resume they're rebuilt from scratch as the sieve revisits the interval,
/// which is simpler than round-tripping each strategy's internal graph and
/// costs only a bounded amount of re-sieving (§6 Open Questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(with = "serde_decimal")]
    pub n: BigInt,
    pub factor_base: FactorBase,
    pub strategy: LargePrimeStrategy,
    pub sieve_interval_m: i64,
    pub small_prime_cutoff: i64,
    pub large_prime_tolerance: i64,
    #[serde(with = "serde_decimal")]
    pub cursor_lower_d: BigInt,
    #[serde(with = "serde_decimal")]
    pub cursor_higher_d: BigInt,
    pub cursor_next_higher: bool,
    pub round: usize,
    pub relations: Vec<Relation>,
}

impl SessionSnapshot {
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> MpqsResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> MpqsResult<Self> {
        let json = fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&json)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factorbase::FactorBasePrime;

    fn sample() -> SessionSnapshot {
        SessionSnapshot {
            n: BigInt::from(91),
            factor_base: FactorBase {
                k: 1,
                primes: vec![FactorBasePrime { p: -1, log_p: 0.0, r: 0 }],
            },
            strategy: LargePrimeStrategy::Two,
            sieve_interval_m: 1000,
            small_prime_cutoff: 7,
            large_prime_tolerance: 5000,
            cursor_lower_d: BigInt::from(103),
            cursor_higher_d: BigInt::from(107),
            cursor_next_higher: true,
            round: 3,
            relations: Vec::new(),
        }
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let snapshot = sample();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.n, snapshot.n);
        assert_eq!(back.cursor_lower_d, snapshot.cursor_lower_d);
        assert_eq!(back.strategy, snapshot.strategy);
        assert_eq!(back.round, snapshot.round);
    }

    #[test]
    fn file_round_trip() {
        let snapshot = sample();
        let dir = std::env::temp_dir().join(format!("mpqs-snapshot-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");
        snapshot.save_to_file(&path).unwrap();
        let back = SessionSnapshot::load_from_file(&path).unwrap();
        assert_eq!(back.n, snapshot.n);
        fs::remove_dir_all(&dir).ok();
    }
}
