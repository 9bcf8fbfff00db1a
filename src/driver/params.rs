// src/driver/params.rs

use num::bigint::BigInt;
use num::Signed;

use crate::config::size_parameters_for_digits;
use crate::relations::LargePrimeStrategy;

/// Per-`n` parameters derived from its digit count, per §6's table.
#[derive(Debug, Clone, Copy)]
pub struct FactoringParams {
    pub factor_base_size: usize,
    pub sieve_interval_m: i64,
    pub large_prime_tolerance: i64,
    pub small_prime_cutoff: i64,
    pub strategy: LargePrimeStrategy,
}

pub fn params_for(n: &BigInt) -> FactoringParams {
    let digits = n.abs().to_string().len() as u32;
    let sp = size_parameters_for_digits(digits);
    FactoringParams {
        factor_base_size: sp.factor_base_size,
        sieve_interval_m: sp.sieve_interval,
        large_prime_tolerance: sp.large_prime_tolerance,
        small_prime_cutoff: sp.small_prime_cutoff,
        strategy: sp.strategy,
    }
}

/// A generous upper bound on the sieve-of-Eratosthenes limit needed to find
/// `count` primes satisfying an extra ~50% filter (the Legendre-symbol test
/// in `factorbase::collect_factor_base`), via the standard `n ln n` prime
/// density estimate.
pub fn estimate_prime_sieve_limit(count: usize) -> usize {
    let count = count.max(16) as f64;
    let needed = count * 2.2;
    (needed * (needed.ln() + 2.0)).ceil() as usize + 1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_for_small_n_matches_size_table_floor() {
        let n = BigInt::from(9_073 * 9_091i64);
        let params = params_for(&n);
        assert_eq!(params.factor_base_size, 100);
    }

    #[test]
    fn sieve_limit_grows_with_count() {
        assert!(estimate_prime_sieve_limit(6000) > estimate_prime_sieve_limit(100));
    }
}
