// src/bigint/calc.rs

use num::bigint::{BigInt, Sign};
use num::{Integer, One, Signed, ToPrimitive, Zero};

use crate::core::error::{MpqsError, MpqsResult};

/// Pure arbitrary-precision arithmetic helpers shared by the factor base,
/// polynomial stream, and sieve. Grounded on the teacher's
/// `integer_math::gcd::GCD` / `Polynomial::algorithms::{legendre_symbol,
/// tonelli_shanks}` / `square_root::finite_field_arithmetic::modular_multiplicative_inverse`,
/// generalized to the exact signatures this crate needs.
pub struct BigIntCalc;

impl BigIntCalc {
    pub fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
        a.abs().gcd(&b.abs())
    }

    pub fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
        a.abs().lcm(&b.abs())
    }

    /// Integer square root via Newton's method: returns r with r² ≤ n < (r+1)².
    pub fn isqrt(n: &BigInt) -> BigInt {
        if n.is_negative() {
            panic!("isqrt requires a non-negative input");
        }
        if n.is_zero() {
            return BigInt::zero();
        }
        let mut x = n.clone();
        let mut y = (&x + BigInt::one()) / BigInt::from(2);
        while y < x {
            x = y.clone();
            y = (&x + n / &x) / BigInt::from(2);
        }
        x
    }

    /// Integer k-th root: returns r with r^k ≤ n < (r+1)^k. Used to test for
    /// perfect powers before MPQS is attempted.
    pub fn iroot(n: &BigInt, k: u32) -> BigInt {
        if n.is_negative() {
            panic!("iroot requires a non-negative input");
        }
        if k == 0 {
            panic!("iroot requires k >= 1");
        }
        if n.is_zero() || k == 1 {
            return n.clone();
        }
        let mut lo = BigInt::zero();
        let mut hi = n.clone();
        while &lo < &hi {
            let mid = (&lo + &hi + BigInt::one()) / BigInt::from(2);
            if mid.pow(k) <= *n {
                lo = mid;
            } else {
                hi = &mid - BigInt::one();
            }
        }
        lo
    }

    /// True if n = b^k for some b > 1, k > 1.
    pub fn is_perfect_power(n: &BigInt) -> bool {
        if *n < BigInt::from(4) {
            return false;
        }
        let bits = n.bits();
        let max_k = bits.max(2) as u32;
        for k in 2..=max_k {
            let r = Self::iroot(n, k);
            if r > BigInt::one() && r.pow(k) == *n {
                return true;
            }
        }
        false
    }

    pub fn modpow(a: &BigInt, e: &BigInt, m: &BigInt) -> BigInt {
        a.modpow(e, m)
    }

    /// Extended-Euclid modular inverse. Fails if gcd(a,m) != 1.
    pub fn modinv(a: &BigInt, m: &BigInt) -> MpqsResult<BigInt> {
        let (g, x, _) = Self::extended_gcd(a, m);
        if g != BigInt::one() {
            return Err(MpqsError::PreconditionViolated(format!(
                "modinv: gcd({}, {}) = {} != 1",
                a, m, g
            )));
        }
        Ok(x.mod_floor(m))
    }

    /// Returns (g, x, y) with a*x + b*y = g = gcd(a,b).
    pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
        if b.is_zero() {
            return (a.clone(), BigInt::one(), BigInt::zero());
        }
        let (g, x1, y1) = Self::extended_gcd(b, &a.mod_floor(b));
        let x = y1.clone();
        let y = x1 - (a / b) * y1;
        (g, x, y)
    }

    /// Jacobi symbol (a|n) for odd n > 0.
    pub fn jacobi(a: &BigInt, n: &BigInt) -> i32 {
        if n.is_negative() || n.is_zero() || n.is_even() {
            panic!("jacobi requires odd n > 0");
        }
        let mut a = a.mod_floor(n);
        let mut n = n.clone();
        let mut result = 1;
        while !a.is_zero() {
            while a.is_even() {
                a /= 2;
                let r8 = (&n % BigInt::from(8)).to_i32().unwrap();
                if r8 == 3 || r8 == 5 {
                    result = -result;
                }
            }
            std::mem::swap(&mut a, &mut n);
            if (&a % BigInt::from(4)) == BigInt::from(3) && (&n % BigInt::from(4)) == BigInt::from(3) {
                result = -result;
            }
            a = a.mod_floor(&n);
        }
        if n.is_one() {
            result
        } else {
            0
        }
    }

    /// Legendre symbol for odd prime p: (a|p) ∈ {-1, 0, 1} via Euler's criterion.
    pub fn legendre(a: &BigInt, p: &BigInt) -> i32 {
        let a_mod = a.mod_floor(p);
        if a_mod.is_zero() {
            return 0;
        }
        let exp = (p - BigInt::one()) / BigInt::from(2);
        let r = a_mod.modpow(&exp, p);
        if r == BigInt::one() {
            1
        } else {
            -1
        }
    }

    /// Tonelli–Shanks modular square root: for odd prime p with (a|p)=1,
    /// returns one root in [0,p).
    pub fn modsqrt(a: &BigInt, p: &BigInt) -> MpqsResult<BigInt> {
        let a_mod = a.mod_floor(p);
        if a_mod.is_zero() {
            return Ok(BigInt::zero());
        }
        if Self::legendre(&a_mod, p) != 1 {
            return Err(MpqsError::PreconditionViolated(format!(
                "modsqrt: {} is not a quadratic residue mod {}",
                a, p
            )));
        }

        let three = BigInt::from(3);
        if (p % BigInt::from(4)) == three {
            return Ok(a_mod.modpow(&((p + BigInt::one()) / BigInt::from(4)), p));
        }

        let mut q = p - BigInt::one();
        let mut s: u32 = 0;
        while q.is_even() {
            q /= 2;
            s += 1;
        }

        // Find a quadratic non-residue z.
        let mut z = BigInt::from(2);
        while Self::legendre(&z, p) != -1 {
            z += BigInt::one();
        }

        let mut m = s;
        let mut c = z.modpow(&q, p);
        let mut t = a_mod.modpow(&q, p);
        let mut r = a_mod.modpow(&((&q + BigInt::one()) / BigInt::from(2)), p);

        loop {
            if t.is_one() {
                return Ok(r);
            }
            let mut i = 0u32;
            let mut t_pow = t.clone();
            while !t_pow.is_one() {
                t_pow = (&t_pow * &t_pow).mod_floor(p);
                i += 1;
                if i == m {
                    return Err(MpqsError::InternalInvariant(
                        "tonelli-shanks: t never reached 1 before exponent exhausted".into(),
                    ));
                }
            }
            let b_exp = BigInt::from(2).pow(m - i - 1);
            let b = c.modpow(&b_exp, p);
            m = i;
            c = (&b * &b).mod_floor(p);
            t = (&t * &c).mod_floor(p);
            r = (&r * &b).mod_floor(p);
        }
    }

    pub fn to_decimal_string(n: &BigInt) -> String {
        n.to_string()
    }

    pub fn from_decimal_string(s: &str) -> MpqsResult<BigInt> {
        s.parse::<BigInt>()
            .map_err(|e| MpqsError::PreconditionViolated(format!("invalid decimal bigint '{}': {}", s, e)))
    }

    pub fn from_bytes_be(bytes: &[u8]) -> BigInt {
        BigInt::from_bytes_be(Sign::Plus, bytes)
    }
}

/// `#[serde(with = "crate::bigint::calc::serde_decimal")]`: serializes a
/// `BigInt` as a signed decimal string matching `-?[0-9]*`, per §6.
pub mod serde_decimal {
    use num::bigint::BigInt;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        value.to_string().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<BigInt>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_exact_and_inexact() {
        assert_eq!(BigIntCalc::isqrt(&BigInt::from(16)), BigInt::from(4));
        assert_eq!(BigIntCalc::isqrt(&BigInt::from(17)), BigInt::from(4));
        assert_eq!(BigIntCalc::isqrt(&BigInt::from(0)), BigInt::from(0));
    }

    #[test]
    fn iroot_cube() {
        assert_eq!(BigIntCalc::iroot(&BigInt::from(27), 3), BigInt::from(3));
        assert_eq!(BigIntCalc::iroot(&BigInt::from(26), 3), BigInt::from(2));
    }

    #[test]
    fn perfect_power_detection() {
        assert!(BigIntCalc::is_perfect_power(&BigInt::from(64)));
        assert!(BigIntCalc::is_perfect_power(&BigInt::from(9)));
        assert!(!BigIntCalc::is_perfect_power(&BigInt::from(15)));
    }

    #[test]
    fn modinv_round_trip() {
        let a = BigInt::from(7);
        let m = BigInt::from(40);
        let inv = BigIntCalc::modinv(&a, &m).unwrap();
        assert_eq!((&a * &inv).mod_floor(&m), BigInt::one());
    }

    #[test]
    fn modinv_fails_when_not_coprime() {
        assert!(BigIntCalc::modinv(&BigInt::from(4), &BigInt::from(8)).is_err());
    }

    #[test]
    fn modsqrt_matches_a_mod_p() {
        // p = 13, a = 4: roots are 2 and 11.
        let p = BigInt::from(13);
        let a = BigInt::from(4);
        let r = BigIntCalc::modsqrt(&a, &p).unwrap();
        assert_eq!((&r * &r).mod_floor(&p), a);
    }

    #[test]
    fn modsqrt_p_mod_8_eq_5_path() {
        // p = 17 (17 mod 4 == 1, exercises the general Tonelli-Shanks path).
        let p = BigInt::from(17);
        let a = BigInt::from(15);
        let r = BigIntCalc::modsqrt(&a, &p).unwrap();
        assert_eq!((&r * &r).mod_floor(&p), a.mod_floor(&p));
    }

    #[test]
    fn jacobi_matches_legendre_for_prime_modulus() {
        let p = BigInt::from(13);
        for a in 1..13 {
            let a = BigInt::from(a);
            assert_eq!(BigIntCalc::jacobi(&a, &p), BigIntCalc::legendre(&a, &p));
        }
    }
}
