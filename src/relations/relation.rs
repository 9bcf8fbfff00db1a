// src/relations/relation.rs

use num::bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::bigint::bitarray::BigBitArray;
use crate::bigint::calc::serde_decimal;

/// Which strategy a Relations store implements, set once per session (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LargePrimeStrategy {
    One,
    Two,
    Three,
}

/// How a full Relation was produced. Serializes by name per §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "FullyFactored")]
    Full,
    #[serde(rename = "OneLargePrime")]
    OneLp,
    #[serde(rename = "TwoLargePrimes")]
    TwoLp,
    #[serde(rename = "ThreeLargePrimes")]
    ThreeLp,
}

/// A fully-smooth relation: the reported `x = a·x+b` satisfies
/// `x² ≡ a·Q_of_x (mod N)` where `a = d²`, `Q_of_x` factors completely over
/// the factor base with parities in `exp_vec` (§3). `d` is carried so the
/// congruence-of-squares step can undo the `a = d²` scaling: a null subset's
/// product of `Q_of_x` is only a perfect square once each relation's `d` is
/// multiplied back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    #[serde(with = "serde_decimal")]
    pub q_of_x: BigInt,
    #[serde(with = "serde_decimal")]
    pub x: BigInt,
    #[serde(with = "serde_decimal")]
    pub d: BigInt,
    pub exp_vec: BigBitArray,
    pub origin: Origin,
}

/// A partial relation with 1, 2, or 3 unresolved large primes, §3.
/// `large_primes` holds exactly `large_primes.len()` primes in
/// `maxFactorBase < p_i <= maxLargePrime`; empty for none stored (never
/// constructed that way — callers always know the count up front).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialRelation {
    #[serde(with = "serde_decimal")]
    pub q_of_x: BigInt,
    #[serde(with = "serde_decimal")]
    pub x: BigInt,
    #[serde(with = "serde_decimal")]
    pub d: BigInt,
    pub exp_vec: BigBitArray,
    pub large_primes: Vec<i64>,
}

impl PartialRelation {
    pub fn new(q_of_x: BigInt, x: BigInt, d: BigInt, exp_vec: BigBitArray, large_primes: Vec<i64>) -> Self {
        PartialRelation { q_of_x, x, d, exp_vec, large_primes }
    }

    /// Combine two (or more) partials sharing a cycle: multiply Q, x, and d,
    /// and XOR exponent vectors, per §4.7's 1-LP/2-LP merge rule.
    pub fn combine(parts: &[&PartialRelation]) -> (BigInt, BigInt, BigInt, BigBitArray) {
        assert!(!parts.is_empty());
        let mut q = BigInt::from(1);
        let mut x = BigInt::from(1);
        let mut d = BigInt::from(1);
        let mut exp_vec = parts[0].exp_vec.clone();
        for (i, part) in parts.iter().enumerate() {
            q *= &part.q_of_x;
            x *= &part.x;
            d *= &part.d;
            if i > 0 {
                exp_vec.xor_with(&part.exp_vec);
            }
        }
        (q, x, d, exp_vec)
    }
}
