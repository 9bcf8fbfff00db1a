// src/polynomial/stream.rs

use log::debug;
use num::bigint::BigInt;
use num::{Integer, One, Zero};

use crate::bigint::calc::BigIntCalc;
use crate::core::error::{MpqsError, MpqsResult};
use crate::primes::oracle::PrimeOracle;

/// One MPQS polynomial Q(x) = a·x² + 2b·x + c, §3/§4.5.
///
/// Invariants (checked with `debug_assert!` at construction): a = d²,
/// b² ≡ kN (mod a), c = (b² − kN)/a exactly (so a·Q(x) = (a·x+b)² − kN,
/// giving the reported `x = a·x+b` the congruence `x² ≡ a·Q(x) (mod N)`),
/// inv2d = (2d)⁻¹ mod kN.
#[derive(Debug, Clone)]
pub struct Polynomial {
    pub d: BigInt,
    pub a: BigInt,
    pub b: BigInt,
    pub c: BigInt,
    pub inv2d: BigInt,
}

impl Polynomial {
    /// Q(x) = a·x² + 2b·x + c
    pub fn evaluate(&self, x: &BigInt) -> BigInt {
        &self.a * x * x + BigInt::from(2) * &self.b * x + &self.c
    }

    /// EvaluateLHS(x) = a·x + b, the relation's reported "x" per §4.6 step 5.
    pub fn evaluate_lhs(&self, x: &BigInt) -> BigInt {
        &self.a * x + &self.b
    }
}

/// Lazy, restartable stream of MPQS polynomials. Grounded on
/// `algorithms::siqs::polynomial::generate_polynomial` for the overall
/// "generate coefficients, verify the invariant, verify exact division"
/// shape, but follows §4.5's single-prime a=d² construction (Hensel lift of
/// sqrt(kN) mod d to mod d²) rather than the teacher's multi-prime CRT
/// scheme. The alternating lower/higher cursor walk is grounded on
/// `core::sieve_range::SieveRange::get_sieve_range_continuation`'s
/// `flip_flop` alternation, adapted to alternate between a "lower" and
/// "higher" prime-d cursor instead of signed integers.
pub struct PolynomialStream {
    kn: BigInt,
    max_factor_base: i64,
    lower_d: BigInt,
    higher_d: BigInt,
    /// true => the next polynomial should come from the higher cursor.
    next_d_higher: bool,
    /// once the lower cursor drops at/below max_factor_base, only the
    /// higher cursor is used, per §4.5.
    lower_exhausted: bool,
    seen: std::collections::HashSet<String>,
}

impl PolynomialStream {
    /// `d0 = floor(sqrt(sqrt(kN)/(4M)))`, adjusted to be odd, is the seed
    /// around which the stream alternates.
    pub fn new(kn: BigInt, sieve_interval_m: u64, max_factor_base: i64) -> Self {
        let sqrt_kn = BigIntCalc::isqrt(&kn);
        let inner = &sqrt_kn / BigInt::from(4 * sieve_interval_m);
        let mut d0 = BigIntCalc::isqrt(&inner);
        if d0.is_even() {
            d0 += BigInt::one();
        }

        PolynomialStream {
            kn,
            max_factor_base,
            lower_d: d0.clone(),
            higher_d: d0,
            next_d_higher: false,
            lower_exhausted: false,
            seen: std::collections::HashSet::new(),
        }
    }

    pub fn resume(
        kn: BigInt,
        max_factor_base: i64,
        lower_d: BigInt,
        higher_d: BigInt,
        next_d_higher: bool,
    ) -> Self {
        PolynomialStream {
            kn,
            max_factor_base,
            lower_d,
            higher_d,
            next_d_higher,
            lower_exhausted: false,
            seen: std::collections::HashSet::new(),
        }
    }

    pub fn cursor(&self) -> (BigInt, BigInt, bool) {
        (self.lower_d.clone(), self.higher_d.clone(), self.next_d_higher)
    }

    /// Walks a cursor to the next candidate d ≡ 3 (mod 4): valid d values
    /// differ by multiples of 4, so each step moves by ±4.
    fn step_down(d: &BigInt) -> BigInt {
        let mut candidate = d - BigInt::from(4);
        while &candidate % BigInt::from(4) != BigInt::from(3) {
            candidate -= BigInt::one();
        }
        candidate
    }

    fn step_up(d: &BigInt) -> BigInt {
        let mut candidate = d + BigInt::from(4);
        while &candidate % BigInt::from(4) != BigInt::from(3) {
            candidate += BigInt::one();
        }
        candidate
    }

    fn is_valid_d(&self, d: &BigInt) -> bool {
        if d <= &BigInt::from(self.max_factor_base) {
            return false;
        }
        if d % BigInt::from(4) != BigInt::from(3) {
            return false;
        }
        if !PrimeOracle::miller_rabin(d) {
            return false;
        }
        BigIntCalc::jacobi(&self.kn, d) == 1
    }

    /// Advance a cursor until it lands on a usable d (or falls below the
    /// factor-base bound, in which case `None` is returned).
    fn advance_lower(&mut self) -> Option<BigInt> {
        loop {
            if self.lower_d <= BigInt::from(self.max_factor_base) {
                self.lower_exhausted = true;
                return None;
            }
            let candidate = self.lower_d.clone();
            self.lower_d = Self::step_down(&self.lower_d);
            if self.is_valid_d(&candidate) && !self.seen.contains(&candidate.to_string()) {
                return Some(candidate);
            }
        }
    }

    fn advance_higher(&mut self) -> BigInt {
        loop {
            let candidate = self.higher_d.clone();
            self.higher_d = Self::step_up(&self.higher_d);
            if self.is_valid_d(&candidate) && !self.seen.contains(&candidate.to_string()) {
                return candidate;
            }
        }
    }

    fn next_d(&mut self) -> BigInt {
        let d = if self.lower_exhausted {
            self.advance_higher()
        } else if self.next_d_higher {
            self.next_d_higher = false;
            self.advance_higher()
        } else {
            match self.advance_lower() {
                Some(d) => {
                    self.next_d_higher = true;
                    d
                }
                None => self.advance_higher(),
            }
        };
        self.seen.insert(d.to_string());
        d
    }

    /// Produce the next polynomial in the stream. Builds `a = d²`, Hensel
    /// lifts `sqrt(kN) mod d` to `mod d²`, and caches `inv2d`.
    pub fn next(&mut self) -> MpqsResult<Polynomial> {
        let d = self.next_d();
        let a = &d * &d;

        // h1 = kN^((d+1)/4) mod d: a square root of kN mod d (valid since
        // d ≡ 3 mod 4 makes this exponent an integer and (kN|d)=1).
        let exp1 = (&d + BigInt::one()) / BigInt::from(4);
        let h1 = self.kn.modpow(&exp1, &d);

        // h0 = kN^((d-3)/4) mod d, made even.
        let exp0 = (&d - BigInt::from(3)) / BigInt::from(4);
        let mut h0 = self.kn.modpow(&exp0, &d);
        if h0.is_odd() {
            h0 += &d;
        }

        let numerator = (&self.kn - &h1 * &h1) / &d;
        let h2 = ((&h0 / BigInt::from(2)) * numerator.mod_floor(&d)).mod_floor(&d);

        let mut b = (&h1 + &h2 * &d).mod_floor(&a);
        if b.is_even() {
            b = &a - &b;
        }

        debug_assert!(
            (&b * &b).mod_floor(&a) == self.kn.mod_floor(&a),
            "polynomial invariant violated: b^2 !\u{2261} kN (mod a)"
        );
        if (&b * &b).mod_floor(&a) != self.kn.mod_floor(&a) {
            return Err(MpqsError::InternalInvariant(format!(
                "b^2 \u{2261} kN (mod a) failed for d={}",
                d
            )));
        }

        let b_sq_minus_kn = &b * &b - &self.kn;
        if !b_sq_minus_kn.is_multiple_of(&a) {
            return Err(MpqsError::InternalInvariant(format!(
                "(b^2 - kN) not divisible by a for d={}",
                d
            )));
        }
        let c = &b_sq_minus_kn / &a;

        let inv2d = BigIntCalc::modinv(&(BigInt::from(2) * &d), &self.kn)?;

        debug!("generated polynomial for d={}", d);
        Ok(Polynomial { d, a, b, c, inv2d })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_kn() -> BigInt {
        // kN = 3*10247*10267 style small composite, large enough to have
        // d candidates above a tiny max_factor_base.
        BigInt::from(105_205_349i64)
    }

    #[test]
    fn produced_d_values_satisfy_invariants() {
        let kn = small_kn();
        let mut stream = PolynomialStream::new(kn.clone(), 2000, 50);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            let poly = stream.next().unwrap();
            assert_eq!(&poly.d % BigInt::from(4), BigInt::from(3));
            assert!(poly.d > BigInt::from(50));
            assert_eq!(poly.a, &poly.d * &poly.d);
            assert_eq!((&poly.b * &poly.b).mod_floor(&poly.a), kn.mod_floor(&poly.a));
            assert!((&poly.b * &poly.b - &kn).is_multiple_of(&poly.a));
            assert_eq!(&poly.a * &poly.c, &poly.b * &poly.b - &kn);
            assert!(seen.insert(poly.d.clone()), "duplicate d produced: {}", poly.d);
        }
    }

    #[test]
    fn evaluate_matches_definition() {
        let kn = small_kn();
        let mut stream = PolynomialStream::new(kn, 2000, 50);
        let poly = stream.next().unwrap();
        let x = BigInt::from(7);
        let expected = &poly.a * &x * &x + BigInt::from(2) * &poly.b * &x + &poly.c;
        assert_eq!(poly.evaluate(&x), expected);
    }

    #[test]
    fn reported_x_squared_equals_a_times_q_of_x_mod_kn() {
        let kn = small_kn();
        let mut stream = PolynomialStream::new(kn.clone(), 2000, 50);
        let poly = stream.next().unwrap();
        for x in [-13i64, 0, 7, 250] {
            let x_big = BigInt::from(x);
            let lhs = poly.evaluate_lhs(&x_big);
            let q = poly.evaluate(&x_big);
            assert_eq!((&lhs * &lhs).mod_floor(&kn), (&poly.a * &q).mod_floor(&kn));
        }
    }
}
