// src/algorithms/pollard_rho.rs

use log::debug;
use num::bigint::BigInt;
use num::{Integer, One, Zero};

use crate::bigint::calc::BigIntCalc;

/// Brent's cycle-detection variant of Pollard's rho, used only internally by
/// the relations store to split a composite residual with two or three
/// large-prime factors (§4.7, §9). Not a standalone factoring entry point —
/// the core consumes a residual already known to be composite and bounded
/// by `maxFactor^4`.
///
/// Grounded on, and trimmed from, the teacher's
/// `algorithms::pollard_rho::pollard_rho_brent`: kept as Brent's variant only
/// (the plain Floyd variant is dropped, §2 names Brent's specifically).
pub(crate) fn pollard_rho_brent(n: &BigInt, max_iterations: usize) -> Option<(BigInt, BigInt)> {
    if n <= &BigInt::one() {
        return None;
    }
    if n.is_even() {
        let two = BigInt::from(2);
        let quotient = n / &two;
        return Some((two, quotient));
    }

    for &c in &[1, 2, 3, 5, 7] {
        if let Some(factors) = pollard_rho_brent_with_c(n, max_iterations, c) {
            return Some(factors);
        }
    }
    None
}

fn pollard_rho_brent_with_c(n: &BigInt, max_iterations: usize, c: i32) -> Option<(BigInt, BigInt)> {
    let c_bigint = BigInt::from(c);
    let one = BigInt::one();

    let mut y = BigInt::from(2);
    let mut r = 1usize;
    let mut q = BigInt::one();

    let mut iterations = 0usize;

    loop {
        let x = y.clone();
        for _ in 0..r {
            y = (&y * &y + &c_bigint) % n;
        }

        let mut k = 0usize;
        while k < r && iterations < max_iterations {
            let ys = y.clone();
            let m = (r - k).min(100);

            for _ in 0..m {
                y = (&y * &y + &c_bigint) % n;
                let diff = if &x > &y { &x - &y } else { &y - &x };
                q = (&q * &diff) % n;
                iterations += 1;
            }

            let d = BigIntCalc::gcd(&q, n);

            if &d > &one {
                if &d == n {
                    let mut d2 = BigInt::one();
                    let mut y2 = ys;
                    while &d2 == &one {
                        y2 = (&y2 * &y2 + &c_bigint) % n;
                        let diff = if &x > &y2 { &x - &y2 } else { &y2 - &x };
                        d2 = BigIntCalc::gcd(&diff, n);
                    }
                    if &d2 < n {
                        let quotient = n / &d2;
                        debug!("pollard_rho_brent: found factor after {} iterations", iterations);
                        return Some(if &d2 <= &quotient { (d2, quotient) } else { (quotient, d2) });
                    }
                } else {
                    let quotient = n / &d;
                    debug!("pollard_rho_brent: found factor after {} iterations", iterations);
                    return Some(if &d <= &quotient { (d, quotient) } else { (quotient, d) });
                }
            }

            k += m;
        }

        if iterations >= max_iterations {
            break;
        }
        r *= 2;
    }

    debug!("pollard_rho_brent: no factor found after {} iterations", iterations);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_small_composite() {
        let n = BigInt::from(8051); // 83 * 97
        let (p, q) = pollard_rho_brent(&n, 100_000).unwrap();
        assert_eq!(&p * &q, n);
        assert!(p > BigInt::one() && p < n);
    }

    #[test]
    fn splits_larger_semiprime() {
        let n = BigInt::from(1_000_730_021i64); // 31193 * 32069
        let (p, q) = pollard_rho_brent(&n, 100_000).unwrap();
        assert_eq!(&p * &q, n);
    }

    #[test]
    fn handles_even_input() {
        let n = BigInt::from(1000);
        let (p, q) = pollard_rho_brent(&n, 1000).unwrap();
        assert_eq!(&p * &q, n);
        assert_eq!(p, BigInt::from(2));
    }
}
