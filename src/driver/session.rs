// src/driver/session.rs

use std::sync::mpsc::Receiver;

use log::info;
use num::bigint::BigInt;
use num::{Integer, One, Signed, Zero};

use crate::bigint::bitarray::BigBitArray;
use crate::bigint::calc::BigIntCalc;
use crate::config::MpqsConfig;
use crate::core::cancellation::CancellationToken;
use crate::core::error::{MpqsError, MpqsResult};
use crate::core::progress::{progress_channel, ProgressEmitter, ProgressEvent};
use crate::driver::params::{estimate_prime_sieve_limit, params_for, FactoringParams};
use crate::factorbase::{select_factor_base, FactorBase};
use crate::matrix::Matrix;
use crate::persist::SessionSnapshot;
use crate::polynomial::PolynomialStream;
use crate::primes::PrimeOracle;
use crate::relations::{Relation, RelationsStore};
use crate::sieve::{sieve_polynomial, SieveParams};

/// Drives one factoring attempt end to end (§4.9): factor-base selection,
/// the MPQS polynomial/sieve loop, relation accumulation, GF(2) matrix
/// reduction, and congruence-of-squares extraction, retried across bounded
/// rounds with progressively more relations demanded.
pub struct Session {
    n: BigInt,
    kn: BigInt,
    config: MpqsConfig,
    params: FactoringParams,
    factor_base: FactorBase,
    stream: PolynomialStream,
    store: RelationsStore,
    cancellation: CancellationToken,
    progress: ProgressEmitter,
    progress_rx: Receiver<ProgressEvent>,
    round: usize,
    pool: Option<rayon::ThreadPool>,
}

fn build_pool(threads: Option<usize>) -> MpqsResult<Option<rayon::ThreadPool>> {
    match threads {
        None => Ok(None),
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map(Some)
            .map_err(|e| MpqsError::PreconditionViolated(format!("cannot build a {}-thread sieve pool: {}", n, e))),
    }
}

impl Session {
    /// Validates `n`, selects a factor base, and builds the polynomial
    /// stream and relations store for it. Fails fast on inputs outside this
    /// algorithm's domain: n must be odd, composite, not a perfect power,
    /// and free of factors small enough that trial division should have
    /// removed them already (§1 Non-goals: this crate isn't a pre-sieve).
    pub fn configure(n: BigInt, config: MpqsConfig) -> MpqsResult<Session> {
        if n <= BigInt::one() {
            return Err(MpqsError::PreconditionViolated("n must be greater than 1".into()));
        }
        if n.is_negative() {
            return Err(MpqsError::PreconditionViolated("n must be positive".into()));
        }
        if n.is_even() {
            return Err(MpqsError::PreconditionViolated("n must be odd; remove factors of 2 before factoring".into()));
        }
        if PrimeOracle::miller_rabin(&n) {
            return Err(MpqsError::PreconditionViolated("n is prime".into()));
        }
        if BigIntCalc::is_perfect_power(&n) {
            return Err(MpqsError::PreconditionViolated("n is a perfect power".into()));
        }

        let params = params_for(&n);
        let sieve_limit = estimate_prime_sieve_limit(params.factor_base_size);
        let oracle = PrimeOracle::init(sieve_limit);

        for small_prime in oracle.iterate() {
            if small_prime as i64 > params.small_prime_cutoff {
                break;
            }
            if n.is_multiple_of(&BigInt::from(small_prime)) {
                return Err(MpqsError::PreconditionViolated(format!(
                    "n has small factor {}; remove it by trial division first",
                    small_prime
                )));
            }
        }

        let factor_base = select_factor_base(&n, params.factor_base_size, &oracle)?;
        let kn = &n * BigInt::from(factor_base.k);
        let stream = PolynomialStream::new(kn.clone(), params.sieve_interval_m as u64, factor_base.max_prime() as i64);
        let store = RelationsStore::new(params.strategy, factor_base.max_prime() as i64, params.large_prime_tolerance);
        let (progress, progress_rx) = progress_channel();
        let pool = build_pool(config.threads)?;

        info!(
            "configured session for {}-digit n (k={}, factor base size={})",
            n.to_string().len(),
            factor_base.k,
            factor_base.primes.len()
        );

        Ok(Session {
            n,
            kn,
            config,
            params,
            factor_base,
            stream,
            store,
            cancellation: CancellationToken::new(),
            progress,
            progress_rx,
            round: 0,
            pool,
        })
    }

    /// Resumes from a previously persisted snapshot instead of starting the
    /// factor base and polynomial stream from scratch.
    pub fn resume(snapshot: SessionSnapshot, config: MpqsConfig) -> MpqsResult<Session> {
        let n = snapshot.n.clone();
        let params = FactoringParams {
            factor_base_size: snapshot.factor_base.primes.len(),
            sieve_interval_m: snapshot.sieve_interval_m,
            large_prime_tolerance: snapshot.large_prime_tolerance,
            small_prime_cutoff: snapshot.small_prime_cutoff,
            strategy: snapshot.strategy,
        };
        let kn = &n * BigInt::from(snapshot.factor_base.k);
        let stream = PolynomialStream::resume(
            kn.clone(),
            snapshot.factor_base.max_prime() as i64,
            snapshot.cursor_lower_d,
            snapshot.cursor_higher_d,
            snapshot.cursor_next_higher,
        );
        let store = RelationsStore::new(params.strategy, snapshot.factor_base.max_prime() as i64, params.large_prime_tolerance);
        for rel in snapshot.relations {
            store.as_sink().try_add(rel.q_of_x, rel.x, rel.d, rel.exp_vec, BigInt::one());
        }
        let (progress, progress_rx) = progress_channel();
        let pool = build_pool(config.threads)?;

        Ok(Session {
            n,
            kn,
            config,
            params,
            factor_base: snapshot.factor_base,
            stream,
            store,
            cancellation: CancellationToken::new(),
            progress,
            progress_rx,
            round: snapshot.round,
            pool,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (lower_d, higher_d, next_higher) = self.stream.cursor();
        SessionSnapshot {
            n: self.n.clone(),
            factor_base: self.factor_base.clone(),
            strategy: self.params.strategy,
            sieve_interval_m: self.params.sieve_interval_m,
            small_prime_cutoff: self.params.small_prime_cutoff,
            large_prime_tolerance: self.params.large_prime_tolerance,
            cursor_lower_d: lower_d,
            cursor_higher_d: higher_d,
            cursor_next_higher: next_higher,
            round: self.round,
            relations: self.store.take_fulls(),
        }
    }

    /// A draining, non-blocking view of progress milestones emitted so far.
    pub fn progress_events(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.progress_rx.try_iter()
    }

    pub fn stop(&self) {
        self.cancellation.cancel();
    }

    /// A cloneable handle to this session's cancellation flag, for wiring
    /// into a `ctrlc::set_handler` callback (which can't borrow `self`).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Runs the full MPQS loop to completion: sieves polynomials until
    /// enough full relations accumulate, reduces the GF(2) matrix, and
    /// tries every null vector's congruence of squares until one splits
    /// `n`. Bounded by `config.max_rounds`; each round doubles the
    /// relations margin demanded before the matrix step runs again.
    pub fn factor(&mut self) -> MpqsResult<(BigInt, BigInt)> {
        let sieve_params = SieveParams {
            sieve_interval_m: self.params.sieve_interval_m,
            small_prime_cutoff: self.params.small_prime_cutoff,
            large_prime_tolerance: self.params.large_prime_tolerance,
        };

        let mut margin = 5usize;
        while self.round < self.config.max_rounds {
            if self.cancellation.is_cancelled() {
                return Err(MpqsError::Cancelled);
            }

            let target = self.factor_base.primes.len() + margin;
            let mut polynomials_this_round = 0usize;
            while self.store.full_count() < target {
                if self.cancellation.is_cancelled() {
                    return Err(MpqsError::Cancelled);
                }
                let poly = self.stream.next()?;
                let sink = self.store.as_sink();
                match &self.pool {
                    Some(pool) => pool.install(|| sieve_polynomial(&poly, &self.kn, &self.factor_base, &sieve_params, sink)),
                    None => sieve_polynomial(&poly, &self.kn, &self.factor_base, &sieve_params, sink),
                }
                polynomials_this_round += 1;
                if polynomials_this_round % self.config.progress_interval == 0 {
                    self.progress.emit(format!(
                        "round {}: {} polynomials sieved, {} full relations (target {})",
                        self.round,
                        polynomials_this_round,
                        self.store.full_count(),
                        target
                    ));
                }
            }

            self.progress.emit(format!("round {}: matrix step over {} relations", self.round, self.store.full_count()));

            let relations = self.store.take_fulls();
            if let Some(factors) = self.try_matrix_step(&relations) {
                self.progress.emit(format!("factor found: {}", factors.0));
                return Ok(factors);
            }

            self.round += 1;
            margin += self.factor_base.primes.len() / 4 + 1;
        }

        Err(MpqsError::Exhaustion(format!("exhausted {} rounds without finding a factor", self.config.max_rounds)))
    }

    fn try_matrix_step(&self, relations: &[Relation]) -> Option<(BigInt, BigInt)> {
        if relations.is_empty() {
            return None;
        }
        let num_cols = self.factor_base.primes.len();
        let rows: Vec<BigBitArray> = relations.iter().map(|r| r.exp_vec.clone()).collect();
        let mut matrix = Matrix::from_rows(rows, num_cols);
        matrix.reduce();

        for null_vector in matrix.find_null_vectors() {
            if let Some(factor) = extract_factor(&self.n, relations, &null_vector) {
                let other = &self.n / &factor;
                return Some((factor, other));
            }
        }
        None
    }
}

/// Congruence of squares: each relation's reported x satisfies
/// x² ≡ a·Q_of_x (mod N) with a = d² (§4.6 step 5), so a null subset's
/// X = ∏x_j satisfies X² ≡ (∏d_j)²·∏Q_of_x(mod N). Y is therefore
/// (∏d_j)·sqrt(∏Q_of_x), not just sqrt(∏Q_of_x) -- the null vector zeroes
/// every factor-base exponent's parity, so ∏Q_of_x alone is a perfect
/// square. gcd(X-Y, n) or gcd(X+Y, n) is a nontrivial factor unless
/// X ≡ ±Y (mod n).
fn extract_factor(n: &BigInt, relations: &[Relation], null_vector: &BigBitArray) -> Option<BigInt> {
    let mut x_prod = BigInt::one();
    let mut q_prod = BigInt::one();
    let mut d_prod = BigInt::one();
    for (i, rel) in relations.iter().enumerate() {
        if null_vector.get(i) {
            x_prod = (&x_prod * &rel.x).mod_floor(n);
            q_prod *= &rel.q_of_x;
            d_prod = (&d_prod * &rel.d).mod_floor(n);
        }
    }
    if q_prod.is_zero() {
        return None;
    }
    let y = (BigIntCalc::isqrt(&q_prod.abs()) * &d_prod).mod_floor(n);

    let diff = (&x_prod - &y).mod_floor(n);
    let g = BigIntCalc::gcd(&diff, n);
    if g > BigInt::one() && &g < n {
        return Some(g);
    }

    let sum = (&x_prod + &y).mod_floor(n);
    let g = BigIntCalc::gcd(&sum, n);
    if g > BigInt::one() && &g < n {
        return Some(g);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_rejects_prime_n() {
        let config = MpqsConfig::default();
        assert!(Session::configure(BigInt::from(104_729), config).is_err());
    }

    #[test]
    fn configure_rejects_even_n() {
        let config = MpqsConfig::default();
        assert!(Session::configure(BigInt::from(100), config).is_err());
    }

    #[test]
    fn configure_rejects_perfect_power() {
        let config = MpqsConfig::default();
        assert!(Session::configure(BigInt::from(6_561), config).is_err()); // 3^8
    }

    #[test]
    fn factors_a_small_semiprime() {
        let config = MpqsConfig { max_rounds: 20, ..MpqsConfig::default() };
        let n = BigInt::from(9_073i64 * 9_091i64);
        let mut session = Session::configure(n.clone(), config).expect("valid composite");
        let (p, q) = session.factor().expect("small semiprime should factor within bounded rounds");
        assert_eq!(&p * &q, n);
        assert!(p > BigInt::one() && q > BigInt::one());
    }
}
