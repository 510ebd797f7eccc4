//! Forward-chaining closure of an attribute set under a rule base.
//!
//! `cl_Σ(S)` is the least fixed point of `S ← S ∪ RHS_i` over every rule
//! whose LHS is contained in the accumulating set. A fired bit per rule
//! keeps each rule from being applied twice; unsatisfied rules are only
//! re-examined after a pass that grew the closure.

use tracing::trace;

use super::{rewrite, ImplicationSet};
use crate::error::FcaError;
use crate::set::{FuzzySet, Universe};
use crate::sparse;

/// Result of `ImplicationSet::closure`: the closed set and, in reduce mode,
/// the rules not used up by it.
#[derive(Clone, Debug)]
pub struct RuleClosure {
    pub closure: FuzzySet,
    /// Present in reduce mode: the unfired rules rewritten against the
    /// closure (`(L − S*) ⇒ (R − S*)`), simplified, empty-RHS rules dropped.
    pub reduced: Option<ImplicationSet>,
}

impl ImplicationSet {
    /// Closure of `s` under this rule base.
    pub fn closure_of(&self, s: &FuzzySet) -> Result<FuzzySet, FcaError> {
        Ok(self.closure_impl(s)?.0)
    }

    /// Closure of `s`, optionally with the reduced remainder of the rules.
    pub fn closure(&self, s: &FuzzySet, reduce: bool) -> Result<RuleClosure, FcaError> {
        let (closure, fired) = self.closure_impl(s)?;
        if !reduce {
            return Ok(RuleClosure {
                closure,
                reduced: None,
            });
        }
        let n = self.n_attributes();
        let mut lhs = crate::sparse::SparseMatrix::zeros(n);
        let mut rhs = crate::sparse::SparseMatrix::zeros(n);
        let closed = closure.as_col();
        for (i, was_fired) in fired.iter().enumerate() {
            if *was_fired {
                continue;
            }
            let (r_rows, r_vals) = sparse::difference_cols(self.rhs().col(i), closed);
            if r_rows.is_empty() {
                continue;
            }
            let (l_rows, l_vals) = sparse::difference_cols(self.lhs().col(i), closed);
            lhs.push_col(&l_rows, &l_vals);
            rhs.push_col(&r_rows, &r_vals);
        }
        let (lhs, rhs) = rewrite::simplification_pass(&lhs, &rhs, 0, None)?;
        let reduced = ImplicationSet::from_matrices(self.attributes().to_vec(), lhs, rhs)?;
        Ok(RuleClosure {
            closure,
            reduced: Some(reduced),
        })
    }

    fn closure_impl(&self, s: &FuzzySet) -> Result<(FuzzySet, Vec<bool>), FcaError> {
        if s.universe() != Universe::Attributes || s.universe_size() != self.n_attributes() {
            return Err(FcaError::ShapeMismatch(format!(
                "expected a set over {} attributes",
                self.n_attributes()
            )));
        }
        let k = self.cardinality();
        let n = self.n_attributes();
        let mut current = s.clone();
        let mut fired = vec![false; k];
        let mut passes = 0usize;
        loop {
            let mut any = false;
            for i in 0..k {
                if fired[i] {
                    continue;
                }
                if sparse::subset_cols(self.lhs().col(i), current.as_col()) {
                    fired[i] = true;
                    any = true;
                    let (rows, vals) =
                        sparse::union_cols(current.as_col(), self.rhs().col(i));
                    current = FuzzySet::from_sorted_unchecked(
                        Universe::Attributes,
                        n,
                        rows,
                        vals,
                    );
                }
            }
            passes += 1;
            if !any {
                break;
            }
        }
        trace!(rules = k, passes, "rule-base closure converged");
        Ok((current, fired))
    }
}
