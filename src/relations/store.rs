// src/relations/store.rs

use num::bigint::BigInt;
use num::One;

use crate::algorithms::pollard_rho::pollard_rho_brent;
use crate::bigint::bitarray::BigBitArray;
use crate::primes::oracle::PrimeOracle;
use crate::relations::relation::LargePrimeStrategy;

const POLLARD_RHO_MAX_ITERATIONS: usize = 100_000;

/// Outcome of classifying a sieve residual `R`, §4.7.
pub enum Classification {
    /// R = 1: a fully smooth candidate.
    Full,
    /// R ≤ maxFactor: already accounted for by the factor base.
    Discard,
    /// R is itself a single usable large prime.
    OneLargePrime(i64),
    /// R split into two distinct usable large primes.
    TwoLargePrimes(i64, i64),
    /// R split into three distinct usable large primes.
    ThreeLargePrimes(i64, i64, i64),
}

/// Classifies a sieve residual against the large-prime bounds, per §4.7's
/// ordered rules. `strategy` gates how deep Pollard-rho splitting goes: the
/// three-large-prime path only runs under `LargePrimeStrategy::Three`.
pub fn classify_residual(r: &BigInt, max_factor: i64, max_large_prime: i64, strategy: LargePrimeStrategy) -> Classification {
    if r.is_one() {
        return Classification::Full;
    }

    let max_factor_big = BigInt::from(max_factor);
    if r <= &max_factor_big {
        return Classification::Discard;
    }

    let max_large_prime_big = BigInt::from(max_large_prime);
    let max_factor_sq = &max_factor_big * &max_factor_big;
    if r <= &max_factor_sq && r <= &max_large_prime_big {
        // R must actually be prime to be usable as a single large prime.
        if PrimeOracle::miller_rabin(r) {
            return prime_to_i64(r)
                .map(Classification::OneLargePrime)
                .unwrap_or(Classification::Discard);
        }
        return Classification::Discard;
    }

    let max_factor_cube = &max_factor_sq * &max_factor_big;
    if r <= &max_factor_cube && !PrimeOracle::miller_rabin(r) {
        return classify_two_large_primes(r, &max_large_prime_big);
    }

    if strategy == LargePrimeStrategy::Three {
        let max_factor_4 = &max_factor_cube * &max_factor_big;
        if r <= &max_factor_4 && !PrimeOracle::miller_rabin(r) {
            return classify_three_large_primes(r, &max_large_prime_big);
        }
    }

    Classification::Discard
}

fn prime_to_i64(p: &BigInt) -> Option<i64> {
    use num::ToPrimitive;
    p.to_i64()
}

fn classify_two_large_primes(r: &BigInt, max_large_prime: &BigInt) -> Classification {
    match pollard_rho_brent(r, POLLARD_RHO_MAX_ITERATIONS) {
        Some((p, q)) => {
            if p == q {
                // R is a perfect square: emits a full Relation directly.
                return Classification::Full;
            }
            if &p > max_large_prime || &q > max_large_prime {
                return Classification::Discard;
            }
            match (prime_to_i64(&p), prime_to_i64(&q)) {
                (Some(p), Some(q)) => Classification::TwoLargePrimes(p, q),
                _ => Classification::Discard,
            }
        }
        None => Classification::Discard,
    }
}

fn classify_three_large_primes(r: &BigInt, max_large_prime: &BigInt) -> Classification {
    let (p1, rest) = match pollard_rho_brent(r, POLLARD_RHO_MAX_ITERATIONS) {
        Some(pair) => pair,
        None => return Classification::Discard,
    };

    // rho returns the smaller factor first; split whichever half is still
    // composite further, in case the first split produced the prime one.
    let (prime_a, composite_b) = if PrimeOracle::miller_rabin(&p1) { (p1, rest) } else { (rest, p1) };

    if !PrimeOracle::miller_rabin(&composite_b) {
        let (p2, p3) = match pollard_rho_brent(&composite_b, POLLARD_RHO_MAX_ITERATIONS) {
            Some(pair) => pair,
            None => return Classification::Discard,
        };
        if !PrimeOracle::miller_rabin(&p2) || !PrimeOracle::miller_rabin(&p3) {
            return Classification::Discard;
        }
        return finish_three(prime_a, p2, p3, max_large_prime);
    }

    // composite_b turned out prime too: R was only two distinct primes times
    // a repeated one, or genuinely two-prime. Treat as a 2-LP outcome.
    if prime_a == composite_b {
        return Classification::Full;
    }
    match (prime_to_i64(&prime_a), prime_to_i64(&composite_b)) {
        (Some(a), Some(b)) if BigInt::from(a) <= *max_large_prime && BigInt::from(b) <= *max_large_prime => {
            Classification::TwoLargePrimes(a, b)
        }
        _ => Classification::Discard,
    }
}

fn finish_three(a: BigInt, b: BigInt, c: BigInt, max_large_prime: &BigInt) -> Classification {
    if &a > max_large_prime || &b > max_large_prime || &c > max_large_prime {
        return Classification::Discard;
    }
    // If exactly two of the three primes coincide, the relation reduces to
    // a 1-LP partial on the remaining prime (§4.7).
    let pairs_equal = [(a == b, &c), (a == c, &b), (b == c, &a)];
    for (equal, remaining) in pairs_equal {
        if equal {
            return match prime_to_i64(remaining) {
                Some(r) => Classification::OneLargePrime(r),
                None => Classification::Discard,
            };
        }
    }
    if a == b && b == c {
        return Classification::Full;
    }
    match (prime_to_i64(&a), prime_to_i64(&b), prime_to_i64(&c)) {
        (Some(a), Some(b), Some(c)) => Classification::ThreeLargePrimes(a, b, c),
        _ => Classification::Discard,
    }
}

/// The seam the sieve engine posts through (§9: "trait/interface boundaries
/// only at the 3 external seams"). Implementations serialize internal
/// mutation with fine-grained per-sublist locks so sieve workers can call
/// `try_add` concurrently.
pub trait RelationSink: Send + Sync {
    /// Classifies `residual` and stores either a full Relation or a partial,
    /// or discards it if unusable. Never fails.
    fn try_add(&self, q_of_x: BigInt, x: BigInt, d: BigInt, exp_vec: BigBitArray, residual: BigInt);
}
