// src/relations/mod.rs

pub mod one_lp;
pub mod relation;
pub mod store;
pub mod three_lp;
pub mod two_lp;

pub use one_lp::OneLpStore;
pub use relation::{LargePrimeStrategy, Origin, PartialRelation, Relation};
pub use store::{classify_residual, Classification, RelationSink};
pub use three_lp::ThreeLpStore;
pub use two_lp::TwoLpStore;

/// Owns whichever large-prime variation a session was configured with,
/// behind the single `RelationSink` seam the sieve engine calls through.
pub enum RelationsStore {
    One(OneLpStore),
    Two(TwoLpStore),
    Three(ThreeLpStore),
}

impl RelationsStore {
    pub fn new(strategy: LargePrimeStrategy, max_factor: i64, max_large_prime: i64) -> Self {
        match strategy {
            LargePrimeStrategy::One => RelationsStore::One(OneLpStore::new(max_factor, max_large_prime)),
            LargePrimeStrategy::Two => RelationsStore::Two(TwoLpStore::new(max_factor, max_large_prime)),
            LargePrimeStrategy::Three => RelationsStore::Three(ThreeLpStore::new(max_factor, max_large_prime)),
        }
    }

    pub fn full_count(&self) -> usize {
        match self {
            RelationsStore::One(s) => s.full_count(),
            RelationsStore::Two(s) => s.full_count(),
            RelationsStore::Three(s) => s.full_count(),
        }
    }

    pub fn take_fulls(&self) -> Vec<Relation> {
        match self {
            RelationsStore::One(s) => s.take_fulls(),
            RelationsStore::Two(s) => s.take_fulls(),
            RelationsStore::Three(s) => s.take_fulls(),
        }
    }

    pub fn as_sink(&self) -> &dyn RelationSink {
        match self {
            RelationsStore::One(s) => s,
            RelationsStore::Two(s) => s,
            RelationsStore::Three(s) => s,
        }
    }
}
