// src/primes/oracle.rs

use log::debug;
use num::bigint::BigInt;
use num::{One, Signed, ToPrimitive, Zero};

use crate::bigint::bitarray::BigBitArray;
use crate::core::error::{MpqsError, MpqsResult};

/// Deterministic Miller-Rabin witness set sufficient for all n < 3.3*10^24,
/// well past the 64-bit range §4.3 asks for.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Sieve of Eratosthenes up to a configured limit, plus deterministic
/// Miller-Rabin above it. Grounded on the teacher's
/// `integer_math::fast_prime_sieve::FastPrimeSieve` for the sieve-then-iterate
/// shape and `integer_math::factorization_factory::FactorizationFactory::is_probable_prime`
/// for the Miller-Rabin fallback, rewritten over `BigBitArray` for O(1)
/// `is_prime_fast` instead of the teacher's raw `u32` cull buffer.
pub struct PrimeOracle {
    /// bit i set means (2i+1) composite, for i>=1; i=0 is a stand-in for "2".
    sieve: BigBitArray,
    capacity: usize,
}

impl PrimeOracle {
    /// Build the sieve over [0, ceil((limit+1)/64)*64). Per §4.3's algorithm
    /// note, the effective upper sieve bound may exceed `limit`, rounded up
    /// to the next multiple of 64 minus one.
    pub fn init(limit: u64) -> Self {
        let capacity = (limit as usize) + 1;
        let mut sieve = BigBitArray::new(capacity);
        let rounded_capacity = sieve.capacity();

        // odd_count covers odd numbers 3, 5, 7, ... up to rounded_capacity-1
        let odd_count = rounded_capacity / 2;
        let mut composite = vec![false; odd_count];
        let mut i = 1usize; // represents value 3
        while (2 * i + 1) * (2 * i + 1) < rounded_capacity {
            if !composite[i] {
                let p = 2 * i + 1;
                let mut j = (p * p - 1) / 2;
                while j < odd_count {
                    composite[j] = true;
                    j += p;
                }
            }
            i += 1;
        }
        for idx in 0..rounded_capacity {
            if idx == 0 {
                continue; // 2 handled specially below
            }
            if idx % 2 == 0 {
                sieve.set(idx, true); // even numbers > 2 are composite
            } else {
                let odd_idx = idx / 2;
                if odd_idx >= 1 && composite.get(odd_idx).copied().unwrap_or(false) {
                    sieve.set(idx, true);
                }
            }
        }
        // idx 0 and idx 1 (value 0 and 1) are neither prime; mark composite
        // so is_prime_fast(0)/is_prime_fast(1) both answer false.
        sieve.set(0, true);
        if rounded_capacity > 1 {
            sieve.set(1, true);
        }
        // value 2 (idx 2) is prime: leave its bit clear.

        debug!("PrimeOracle sieve built to capacity {}", rounded_capacity);
        PrimeOracle {
            sieve,
            capacity: rounded_capacity,
        }
    }

    pub fn sieve_capacity(&self) -> u64 {
        self.capacity as u64
    }

    /// Answers purely from the sieve; fails if n is outside sieve capacity.
    pub fn is_prime_fast(&self, n: u64) -> MpqsResult<bool> {
        if n as usize >= self.capacity {
            return Err(MpqsError::PreconditionViolated(format!(
                "is_prime_fast: {} >= sieve capacity {}",
                n, self.capacity
            )));
        }
        Ok(!self.sieve.get(n as usize))
    }

    /// Answers from the sieve when in range, else deterministic Miller-Rabin.
    pub fn is_prime(&self, n: &BigInt) -> bool {
        if n.is_negative() {
            return false;
        }
        if let Some(small) = n.to_u64() {
            if (small as usize) < self.capacity {
                return !self.sieve.get(small as usize);
            }
        }
        Self::miller_rabin(n)
    }

    pub fn iterate(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.capacity as u64).filter(move |&n| !self.sieve.get(n as usize))
    }

    /// Deterministic Miller-Rabin with the fixed §4.3 base set.
    pub fn miller_rabin(n: &BigInt) -> bool {
        if n.is_negative() {
            return false;
        }
        let two = BigInt::from(2);
        if n < &two {
            return false;
        }
        if n == &two || n == &BigInt::from(3) {
            return true;
        }
        if (n % &two).is_zero() {
            return false;
        }

        let n_minus_1 = n - BigInt::one();
        let mut d = n_minus_1.clone();
        let mut s: u32 = 0;
        while (&d % &two).is_zero() {
            d /= &two;
            s += 1;
        }

        'witness: for &a in MILLER_RABIN_BASES.iter() {
            let a = BigInt::from(a);
            if &a >= n {
                continue;
            }
            let mut x = a.modpow(&d, n);
            if x == BigInt::one() || x == n_minus_1 {
                continue;
            }
            for _ in 1..s {
                x = (&x * &x) % n;
                if x == n_minus_1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sieve_matches_known_small_primes() {
        let oracle = PrimeOracle::init(100);
        let known = [2u64, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97];
        for n in 0..100u64 {
            let expected = known.contains(&n);
            assert_eq!(oracle.is_prime_fast(n).unwrap(), expected, "n={}", n);
        }
    }

    #[test]
    fn is_prime_fast_fails_out_of_range() {
        let oracle = PrimeOracle::init(64);
        assert!(oracle.is_prime_fast(oracle.sieve_capacity()).is_err());
    }

    #[test]
    fn iterate_is_ascending_and_finite() {
        let oracle = PrimeOracle::init(50);
        let primes: Vec<u64> = oracle.iterate().collect();
        assert_eq!(primes.first(), Some(&2));
        assert!(primes.windows(2).all(|w| w[0] < w[1]));
        assert!(primes.contains(&47));
    }

    #[test]
    fn miller_rabin_matches_sieve_in_range() {
        let oracle = PrimeOracle::init(1000);
        for n in 0..1000u64 {
            let sieve_answer = oracle.is_prime_fast(n).unwrap();
            let mr_answer = PrimeOracle::miller_rabin(&BigInt::from(n));
            assert_eq!(sieve_answer, mr_answer, "n={}", n);
        }
    }

    #[test]
    fn miller_rabin_above_sieve_limit() {
        // 104729 is the 10000th prime.
        assert!(PrimeOracle::miller_rabin(&BigInt::from(104729)));
        assert!(!PrimeOracle::miller_rabin(&BigInt::from(104730)));
    }
}
