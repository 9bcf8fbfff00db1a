// src/matrix/gf2.rs

use crate::bigint::bitarray::BigBitArray;

/// A dense GF(2) matrix over relation exponent vectors (§4.8): one row per
/// smooth relation, one column per factor-base prime. Row-reduces with a
/// companion identity matrix mirrored alongside so that any row that
/// collapses to all-zero records, in its companion row, exactly which
/// original relations XOR to the zero vector -- a congruence-of-squares
/// candidate. Grounded on `GaussianMatrix::elimination`'s row-swap-and-XOR
/// forward pass (Matrix/gaussian_matrix.rs), generalized from a single
/// free-column trace to a full null-space readout via the companion matrix.
pub struct Matrix {
    rows: Vec<BigBitArray>,
    companion: Vec<BigBitArray>,
    num_cols: usize,
    rank: usize,
    reduced: bool,
}

impl Matrix {
    pub fn from_rows(rows: Vec<BigBitArray>, num_cols: usize) -> Self {
        let num_rows = rows.len();
        let mut companion = Vec::with_capacity(num_rows);
        for i in 0..num_rows {
            let mut c = BigBitArray::new(num_rows);
            c.set(i, true);
            companion.push(c);
        }
        Matrix {
            rows,
            companion,
            num_cols,
            rank: 0,
            reduced: false,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.rows[row].get(col)
    }

    /// Grows every row to at least `new_cols` columns. The factor base can
    /// grow mid-session if a round restarts with a larger target; existing
    /// rows simply gain zero bits for the new primes.
    pub fn expand_columns(&mut self, new_cols: usize) {
        if new_cols > self.num_cols {
            for row in &mut self.rows {
                row.expand(new_cols);
            }
            self.num_cols = new_cols;
            self.reduced = false;
        }
    }

    /// Forward-and-back Gauss-Jordan elimination over GF(2). Idempotent:
    /// calling it again after `find_null_vectors` is a no-op.
    pub fn reduce(&mut self) {
        if self.reduced {
            return;
        }
        let num_rows = self.rows.len();
        let mut pivot_row = 0;

        for col in 0..self.num_cols {
            if pivot_row >= num_rows {
                break;
            }
            let found = (pivot_row..num_rows).find(|&r| self.rows[r].get(col));
            let Some(sel) = found else {
                continue;
            };
            self.rows.swap(pivot_row, sel);
            self.companion.swap(pivot_row, sel);

            for r in 0..num_rows {
                if r != pivot_row && self.rows[r].get(col) {
                    let pivot_row_clone = self.rows[pivot_row].clone();
                    self.rows[r].xor_with(&pivot_row_clone);
                    let companion_pivot_clone = self.companion[pivot_row].clone();
                    self.companion[r].xor_with(&companion_pivot_clone);
                }
            }
            pivot_row += 1;
        }

        self.rank = pivot_row;
        self.reduced = true;
    }

    /// Columns of the original (relations x primes) matrix with no pivot
    /// row -- how many degrees of freedom the null space has.
    pub fn find_free_columns(&self) -> usize {
        assert!(self.reduced, "reduce() must run first");
        self.num_cols.saturating_sub(self.rank)
    }

    /// Every row that reduced to the all-zero vector, paired with the
    /// companion row naming which original relations combine to it.
    pub fn find_null_vectors(&self) -> Vec<BigBitArray> {
        assert!(self.reduced, "reduce() must run first");
        self.rows
            .iter()
            .zip(self.companion.iter())
            .filter(|(row, _)| row.pop_count() == 0)
            .map(|(_, companion)| companion.clone())
            .collect()
    }
}
