// src/relations/one_lp.rs

use std::sync::Mutex;

use num::bigint::BigInt;

use crate::bigint::bitarray::BigBitArray;
use crate::relations::relation::{Origin, PartialRelation, Relation};
use crate::relations::store::{classify_residual, Classification, RelationSink};

/// One-large-prime store: a partial is usable the moment a second partial
/// shares its large prime. Kept as a list sorted by prime so the matching
/// partner is found by binary search (§4.7).
pub struct OneLpStore {
    max_factor: i64,
    max_large_prime: i64,
    fulls: Mutex<Vec<Relation>>,
    partials: Mutex<Vec<PartialRelation>>,
}

impl OneLpStore {
    pub fn new(max_factor: i64, max_large_prime: i64) -> Self {
        OneLpStore {
            max_factor,
            max_large_prime,
            fulls: Mutex::new(Vec::new()),
            partials: Mutex::new(Vec::new()),
        }
    }

    pub fn full_count(&self) -> usize {
        self.fulls.lock().unwrap().len()
    }

    pub fn take_fulls(&self) -> Vec<Relation> {
        self.fulls.lock().unwrap().clone()
    }

    fn insert_partial(&self, candidate: PartialRelation) {
        let prime = candidate.large_primes[0];
        let mut partials = self.partials.lock().unwrap();
        let pos = partials.partition_point(|p| p.large_primes[0] < prime);
        if pos < partials.len() && partials[pos].large_primes[0] == prime {
            let existing = partials.remove(pos);
            drop(partials);
            let (q, x, d, exp_vec) = PartialRelation::combine(&[&existing, &candidate]);
            self.fulls.lock().unwrap().push(Relation {
                q_of_x: q,
                x,
                d,
                exp_vec,
                origin: Origin::OneLp,
            });
        } else {
            partials.insert(pos, candidate);
        }
    }
}

impl RelationSink for OneLpStore {
    fn try_add(&self, q_of_x: BigInt, x: BigInt, d: BigInt, exp_vec: BigBitArray, residual: BigInt) {
        match classify_residual(&residual, self.max_factor, self.max_large_prime, crate::relations::relation::LargePrimeStrategy::One) {
            Classification::Full => {
                self.fulls.lock().unwrap().push(Relation {
                    q_of_x,
                    x,
                    d,
                    exp_vec,
                    origin: Origin::Full,
                });
            }
            Classification::OneLargePrime(p) => {
                self.insert_partial(PartialRelation::new(q_of_x, x, d, exp_vec, vec![p]));
            }
            _ => {}
        }
    }
}
