//! Column-sparse matrices over [0,1] with pointwise set algebra.
//!
//! Storage is CSC: `p` holds column pointers (`p[0] = 0`, `p[ncols] = nnz`),
//! `i` the row indices (strictly ascending within each column), `x` the
//! values. Zero entries are never stored. Columns are fuzzy sets over the
//! row universe; the operations here are the set algebra the derivation
//! kernel and the rewrite engine are built from. Every merge is linear in
//! the nnz of its inputs.

use crate::error::FcaError;
use crate::logic::Logic;

/// A column-sparse matrix with values in (0,1].
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    /// Column pointers, length ncols + 1
    p: Vec<usize>,
    /// Row indices, strictly ascending per column
    i: Vec<usize>,
    /// Values, parallel to `i`, all nonzero
    x: Vec<f64>,
}

/// Borrowed view of one sparse column.
#[derive(Clone, Copy, Debug)]
pub struct ColView<'a> {
    pub rows: &'a [usize],
    pub vals: &'a [f64],
}

impl SparseMatrix {
    /// Matrix with `nrows` rows and no columns yet.
    pub fn zeros(nrows: usize) -> Self {
        Self {
            nrows,
            p: vec![0],
            i: Vec::new(),
            x: Vec::new(),
        }
    }

    /// Build from raw CSC parts, validating every invariant.
    pub fn from_parts(
        nrows: usize,
        p: Vec<usize>,
        i: Vec<usize>,
        x: Vec<f64>,
    ) -> Result<Self, FcaError> {
        let m = Self { nrows, p, i, x };
        m.validate()?;
        Ok(m)
    }

    /// Check the CSC invariants: monotone pointers, ascending in-column row
    /// indices, in-range rows, values in (0,1].
    pub fn validate(&self) -> Result<(), FcaError> {
        if self.p.first() != Some(&0) || *self.p.last().unwrap_or(&usize::MAX) != self.i.len() {
            return Err(FcaError::InvariantViolation(
                "column pointers must start at 0 and end at nnz".into(),
            ));
        }
        if self.i.len() != self.x.len() {
            return Err(FcaError::InvariantViolation(
                "row index and value arrays must have equal length".into(),
            ));
        }
        for w in self.p.windows(2) {
            if w[0] > w[1] {
                return Err(FcaError::InvariantViolation(
                    "column pointers must be non-decreasing".into(),
                ));
            }
            let (start, end) = (w[0], w[1]);
            for k in start..end {
                if self.i[k] >= self.nrows {
                    return Err(FcaError::InvariantViolation(
                        "row index out of range".into(),
                    ));
                }
                if k > start && self.i[k - 1] >= self.i[k] {
                    return Err(FcaError::InvariantViolation(
                        "row indices must be strictly ascending within a column".into(),
                    ));
                }
                if !(self.x[k] > 0.0 && self.x[k] <= 1.0) {
                    return Err(FcaError::InvariantViolation(
                        "stored values must lie in (0, 1]".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.p.len() - 1
    }

    pub fn nnz(&self) -> usize {
        self.i.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ncols() == 0
    }

    /// View of column `j`.
    pub fn col(&self, j: usize) -> ColView<'_> {
        let (start, end) = (self.p[j], self.p[j + 1]);
        ColView {
            rows: &self.i[start..end],
            vals: &self.x[start..end],
        }
    }

    /// Append a column given parallel row/value slices. Rows must be
    /// strictly ascending, in range, with nonzero values.
    pub fn push_col(&mut self, rows: &[usize], vals: &[f64]) {
        assert_eq!(rows.len(), vals.len(), "column arity mismatch");
        debug_assert!(rows.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(rows.iter().all(|&r| r < self.nrows));
        debug_assert!(vals.iter().all(|&v| v > 0.0));
        self.i.extend_from_slice(rows);
        self.x.extend_from_slice(vals);
        self.p.push(self.i.len());
    }

    /// Extract column `j` as owned (rows, values) vectors.
    pub fn extract(&self, j: usize) -> (Vec<usize>, Vec<f64>) {
        let c = self.col(j);
        (c.rows.to_vec(), c.vals.to_vec())
    }

    /// Sum of stored values per column.
    pub fn col_sums(&self) -> Vec<f64> {
        (0..self.ncols()).map(|j| self.col(j).cardinality()).collect()
    }

    /// σ-count of column `j` (sum of grades; entry count in the binary case).
    pub fn cardinality(&self, j: usize) -> f64 {
        self.col(j).cardinality()
    }

    /// New matrix keeping the listed columns, in the given order.
    pub fn select_cols(&self, keep: &[usize]) -> SparseMatrix {
        let mut out = SparseMatrix::zeros(self.nrows);
        for &j in keep {
            let c = self.col(j);
            out.push_col(c.rows, c.vals);
        }
        out
    }

    /// Raw CSC parts `(p, i, x)`.
    pub fn parts(&self) -> (&[usize], &[usize], &[f64]) {
        (&self.p, &self.i, &self.x)
    }
}

impl<'a> ColView<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `row`, 0 when absent.
    pub fn get(&self, row: usize) -> f64 {
        match self.rows.binary_search(&row) {
            Ok(k) => self.vals[k],
            Err(_) => 0.0,
        }
    }

    /// σ-count: sum of grades.
    pub fn cardinality(&self) -> f64 {
        self.vals.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.rows.iter().copied().zip(self.vals.iter().copied())
    }
}

// ============================================================================
// Pointwise column algebra
// ============================================================================

/// Pointwise max of two columns (fuzzy union).
pub fn union_cols(a: ColView<'_>, b: ColView<'_>) -> (Vec<usize>, Vec<f64>) {
    let mut rows = Vec::with_capacity(a.len() + b.len());
    let mut vals = Vec::with_capacity(a.len() + b.len());
    let (mut ka, mut kb) = (0, 0);
    while ka < a.len() || kb < b.len() {
        let (r, v) = if kb >= b.len() || (ka < a.len() && a.rows[ka] < b.rows[kb]) {
            let out = (a.rows[ka], a.vals[ka]);
            ka += 1;
            out
        } else if ka >= a.len() || b.rows[kb] < a.rows[ka] {
            let out = (b.rows[kb], b.vals[kb]);
            kb += 1;
            out
        } else {
            let out = (a.rows[ka], a.vals[ka].max(b.vals[kb]));
            ka += 1;
            kb += 1;
            out
        };
        rows.push(r);
        vals.push(v);
    }
    (rows, vals)
}

/// Pointwise ⊗ of two columns (fuzzy intersection). Only rows present in
/// both can be nonzero because 0 annihilates every t-norm.
pub fn intersect_cols(
    a: ColView<'_>,
    b: ColView<'_>,
    logic: &Logic,
) -> (Vec<usize>, Vec<f64>) {
    let mut rows = Vec::new();
    let mut vals = Vec::new();
    let (mut ka, mut kb) = (0, 0);
    while ka < a.len() && kb < b.len() {
        if a.rows[ka] < b.rows[kb] {
            ka += 1;
        } else if b.rows[kb] < a.rows[ka] {
            kb += 1;
        } else {
            let v = logic.tnorm(a.vals[ka], b.vals[kb]);
            if v > 0.0 {
                rows.push(a.rows[ka]);
                vals.push(v);
            }
            ka += 1;
            kb += 1;
        }
    }
    (rows, vals)
}

/// Pointwise `a ≤ b` on every row.
pub fn subset_cols(a: ColView<'_>, b: ColView<'_>) -> bool {
    let (mut ka, mut kb) = (0, 0);
    while ka < a.len() {
        // Skip b-entries below the next a-row; they only make b larger.
        while kb < b.len() && b.rows[kb] < a.rows[ka] {
            kb += 1;
        }
        if kb >= b.len() || b.rows[kb] != a.rows[ka] || a.vals[ka] > b.vals[kb] {
            return false;
        }
        ka += 1;
        kb += 1;
    }
    true
}

/// Pointwise equality on every row.
pub fn equal_cols(a: ColView<'_>, b: ColView<'_>) -> bool {
    a.rows == b.rows && a.vals == b.vals
}

/// Fuzzy set difference: keep `d`'s entry where `d[r] > b[r]`, else 0.
pub fn difference_cols(d: ColView<'_>, b: ColView<'_>) -> (Vec<usize>, Vec<f64>) {
    let mut rows = Vec::new();
    let mut vals = Vec::new();
    let mut kb = 0;
    for (r, v) in d.iter() {
        while kb < b.len() && b.rows[kb] < r {
            kb += 1;
        }
        let bv = if kb < b.len() && b.rows[kb] == r {
            b.vals[kb]
        } else {
            0.0
        };
        if v > bv {
            rows.push(r);
            vals.push(v);
        }
    }
    (rows, vals)
}

/// Σ over rows of `l[r] ⊗ r[r]`; zero iff the two columns are disjoint.
pub fn self_intersection(l: ColView<'_>, r: ColView<'_>, logic: &Logic) -> f64 {
    let mut sum = 0.0;
    let (mut kl, mut kr) = (0, 0);
    while kl < l.len() && kr < r.len() {
        if l.rows[kl] < r.rows[kr] {
            kl += 1;
        } else if r.rows[kr] < l.rows[kl] {
            kr += 1;
        } else {
            sum += logic.tnorm(l.vals[kl], r.vals[kr]);
            kl += 1;
            kr += 1;
        }
    }
    sum
}
