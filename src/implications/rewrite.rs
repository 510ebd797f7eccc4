//! Equivalence rewrites over the implication store.
//!
//! Each rewrite maps the aligned (LHS, RHS) column matrices to an equivalent
//! pair: the closure operator induced by the rule set is preserved while the
//! rule count or the total attribute mass shrinks. Rewrites are looked up by
//! name in a `RewriteRegistry` and run in sequence to a fixed point by
//! `apply_rules`.
//!
//! Built-in rewrites:
//!
//! - `reduction` — `RHS_i ← RHS_i − LHS_i`, dropping rules emptied by it.
//! - `composition` — merge rules with identical LHS, unioning their RHSs.
//! - `generalization` — drop a rule subsumed by a more general one
//!   (`LHS_i ⊆ LHS_j` and `RHS_j ⊆ RHS_i`).
//! - `simplification` — the iterative subset-predicate pass: a rule `r`
//!   applies to every rule `j` with `LHS_r ⊆ LHS_j ∪ RHS_j`, whose RHS then
//!   sheds `RHS_r`.
//! - `rsimp` — the conservative variant subtracting only when
//!   `LHS_r ⊆ LHS_j`.
//!
//! A rewrite that returns misaligned or malformed matrices is rejected with
//! `InvariantViolation` and the pre-pass store is retained.

use indexmap::IndexMap;
use tracing::debug;

use super::ImplicationSet;
use crate::cancel::CancelToken;
use crate::error::FcaError;
use crate::sparse::{self, ColView, SparseMatrix};

/// A rewrite over aligned implication matrices. The cancellation token, when
/// present, is checked at the start of each candidate pick.
pub type RewriteFn = fn(
    &SparseMatrix,
    &SparseMatrix,
    Option<&CancelToken>,
) -> Result<(SparseMatrix, SparseMatrix), FcaError>;

/// Name → rewrite registry. Names are case-folded; `Default` carries the
/// built-in equivalences.
#[derive(Clone)]
pub struct RewriteRegistry {
    rules: IndexMap<String, RewriteFn>,
}

impl Default for RewriteRegistry {
    fn default() -> Self {
        let mut registry = Self {
            rules: IndexMap::new(),
        };
        registry.register("reduction", reduction);
        registry.register("composition", composition);
        registry.register("generalization", generalization);
        registry.register("simplification", simplification);
        registry.register("rsimp", rsimp);
        registry
    }
}

impl RewriteRegistry {
    /// Registry with no entries (not even the built-ins).
    pub fn empty() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// Register a rewrite, shadowing any previous entry of the same name.
    pub fn register(&mut self, name: &str, f: RewriteFn) {
        self.rules.insert(name.to_lowercase(), f);
    }

    pub fn get(&self, name: &str) -> Option<RewriteFn> {
        self.rules.get(&name.to_lowercase()).copied()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }
}

impl ImplicationSet {
    /// Run the named rewrites, in order, until a full pass changes nothing.
    pub fn apply_rules(&mut self, names: &[&str]) -> Result<(), FcaError> {
        self.apply_rules_with(names, &RewriteRegistry::default(), None)
    }

    /// As `apply_rules`, with an explicit registry and cancellation.
    /// All names are resolved before any rewrite runs; on failure the store
    /// is left exactly as it was.
    pub fn apply_rules_with(
        &mut self,
        names: &[&str],
        registry: &RewriteRegistry,
        cancel: Option<&CancelToken>,
    ) -> Result<(), FcaError> {
        let sequence: Vec<(&str, RewriteFn)> = names
            .iter()
            .map(|&name| {
                registry
                    .get(name)
                    .map(|f| (name, f))
                    .ok_or_else(|| FcaError::UnknownRewrite(name.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let n = self.n_attributes();
        let mut lhs = self.lhs().clone();
        let mut rhs = self.rhs().clone();
        loop {
            let (before_lhs, before_rhs) = (lhs.clone(), rhs.clone());
            for &(name, f) in &sequence {
                if let Some(token) = cancel {
                    token.check()?;
                }
                let (new_lhs, new_rhs) = f(&lhs, &rhs, cancel)?;
                validate_store(n, &new_lhs, &new_rhs)?;
                let (new_lhs, new_rhs) = collect_garbage(new_lhs, new_rhs);
                debug!(
                    rewrite = name,
                    before = lhs.ncols(),
                    after = new_lhs.ncols(),
                    "rewrite pass"
                );
                lhs = new_lhs;
                rhs = new_rhs;
            }
            if lhs == before_lhs && rhs == before_rhs {
                break;
            }
        }
        self.replace_matrices(lhs, rhs);
        Ok(())
    }
}

/// Check the invariants a rewrite must preserve.
fn validate_store(
    n_attributes: usize,
    lhs: &SparseMatrix,
    rhs: &SparseMatrix,
) -> Result<(), FcaError> {
    if lhs.nrows() != n_attributes || rhs.nrows() != n_attributes {
        return Err(FcaError::InvariantViolation(
            "rewrite changed the attribute universe".into(),
        ));
    }
    if lhs.ncols() != rhs.ncols() {
        return Err(FcaError::InvariantViolation(
            "rewrite returned misaligned LHS/RHS matrices".into(),
        ));
    }
    lhs.validate()?;
    rhs.validate()?;
    Ok(())
}

/// Drop every rule with an empty RHS.
fn collect_garbage(lhs: SparseMatrix, rhs: SparseMatrix) -> (SparseMatrix, SparseMatrix) {
    let keep: Vec<usize> = (0..rhs.ncols())
        .filter(|&j| !rhs.col(j).is_empty())
        .collect();
    if keep.len() == rhs.ncols() {
        (lhs, rhs)
    } else {
        (lhs.select_cols(&keep), rhs.select_cols(&keep))
    }
}

// ============================================================================
// Built-in rewrites
// ============================================================================

/// `RHS_i ← RHS_i − LHS_i`; rules emptied by the subtraction are dropped.
fn reduction(
    lhs: &SparseMatrix,
    rhs: &SparseMatrix,
    _cancel: Option<&CancelToken>,
) -> Result<(SparseMatrix, SparseMatrix), FcaError> {
    let mut out_lhs = SparseMatrix::zeros(lhs.nrows());
    let mut out_rhs = SparseMatrix::zeros(rhs.nrows());
    for i in 0..lhs.ncols() {
        let (rows, vals) = sparse::difference_cols(rhs.col(i), lhs.col(i));
        if rows.is_empty() {
            continue;
        }
        let l = lhs.col(i);
        out_lhs.push_col(l.rows, l.vals);
        out_rhs.push_col(&rows, &vals);
    }
    Ok((out_lhs, out_rhs))
}

/// Merge rules with identical LHS into one rule with the union of RHSs.
fn composition(
    lhs: &SparseMatrix,
    rhs: &SparseMatrix,
    _cancel: Option<&CancelToken>,
) -> Result<(SparseMatrix, SparseMatrix), FcaError> {
    let n = lhs.ncols();
    let mut merged = vec![false; n];
    let mut out_lhs = SparseMatrix::zeros(lhs.nrows());
    let mut out_rhs = SparseMatrix::zeros(rhs.nrows());
    for i in 0..n {
        if merged[i] {
            continue;
        }
        let (mut rows, mut vals) = rhs.extract(i);
        for j in (i + 1)..n {
            if !merged[j] && sparse::equal_cols(lhs.col(i), lhs.col(j)) {
                merged[j] = true;
                let u = sparse::union_cols(
                    ColView {
                        rows: &rows,
                        vals: &vals,
                    },
                    rhs.col(j),
                );
                rows = u.0;
                vals = u.1;
            }
        }
        let l = lhs.col(i);
        out_lhs.push_col(l.rows, l.vals);
        out_rhs.push_col(&rows, &vals);
    }
    Ok((out_lhs, out_rhs))
}

/// Drop rule `j` when another rule `i` has `LHS_i ⊆ LHS_j` and
/// `RHS_j ⊆ RHS_i`: firing `j` can never contribute anything `i` does not.
fn generalization(
    lhs: &SparseMatrix,
    rhs: &SparseMatrix,
    _cancel: Option<&CancelToken>,
) -> Result<(SparseMatrix, SparseMatrix), FcaError> {
    let n = lhs.ncols();
    let mut dropped = vec![false; n];
    for j in 0..n {
        for i in 0..n {
            if i == j || dropped[i] {
                continue;
            }
            if sparse::subset_cols(lhs.col(i), lhs.col(j))
                && sparse::subset_cols(rhs.col(j), rhs.col(i))
            {
                dropped[j] = true;
                break;
            }
        }
    }
    let keep: Vec<usize> = (0..n).filter(|&j| !dropped[j]).collect();
    Ok((lhs.select_cols(&keep), rhs.select_cols(&keep)))
}

/// Registered entry point for the simplification pass with no protected
/// prefix.
fn simplification(
    lhs: &SparseMatrix,
    rhs: &SparseMatrix,
    cancel: Option<&CancelToken>,
) -> Result<(SparseMatrix, SparseMatrix), FcaError> {
    simplification_pass(lhs, rhs, 0, cancel)
}

/// Subtract `RHS_r` from `RHS_j` whenever `LHS_r ⊆ LHS_j` (`r ≠ j`): when
/// `j` fires, `r` fires too, so `r`'s conclusion is redundant inside `j`'s.
fn rsimp(
    lhs: &SparseMatrix,
    rhs: &SparseMatrix,
    cancel: Option<&CancelToken>,
) -> Result<(SparseMatrix, SparseMatrix), FcaError> {
    let n = lhs.ncols();
    let mut rhs_cols: Vec<(Vec<usize>, Vec<f64>)> = (0..n).map(|j| rhs.extract(j)).collect();
    for r in 0..n {
        if let Some(token) = cancel {
            token.check()?;
        }
        for j in 0..n {
            if j == r || !sparse::subset_cols(lhs.col(r), lhs.col(j)) {
                continue;
            }
            let shed = sparse::difference_cols(view(&rhs_cols[j]), view(&rhs_cols[r]));
            rhs_cols[j] = shed;
        }
    }
    Ok(assemble(lhs, &rhs_cols))
}

/// The iterative simplification fixed point of the rewrite system, with an
/// optional protected prefix of `fixed` background columns.
///
/// Background columns may simplify other rules but are never modified, and
/// they are removed from the result. `fixed = 0` means no protection.
pub(crate) fn simplification_pass(
    lhs: &SparseMatrix,
    rhs: &SparseMatrix,
    fixed: usize,
    cancel: Option<&CancelToken>,
) -> Result<(SparseMatrix, SparseMatrix), FcaError> {
    let n = lhs.ncols();
    let lhs_cols: Vec<(Vec<usize>, Vec<f64>)> = (0..n).map(|j| lhs.extract(j)).collect();
    let mut rhs_cols: Vec<(Vec<usize>, Vec<f64>)> = (0..n).map(|j| rhs.extract(j)).collect();

    // Normalise the mutable columns so the self-intersection-zero invariant
    // holds where it can.
    for j in fixed..n {
        rhs_cols[j] = sparse::difference_cols(view(&rhs_cols[j]), view(&lhs_cols[j]));
    }

    // eligible[j]: LHS_j and RHS_j have disjoint supports.
    // s[r][j]: eligible[j] and LHS_r ⊆ LHS_j ∪ RHS_j.
    let mut eligible: Vec<bool> = (0..n)
        .map(|j| supports_disjoint(view(&lhs_cols[j]), view(&rhs_cols[j])))
        .collect();
    let mut s: Vec<Vec<bool>> = vec![vec![false; n]; n];
    let mut hits = vec![0usize; n];
    for j in 0..n {
        if !eligible[j] {
            continue;
        }
        let union = sparse::union_cols(view(&lhs_cols[j]), view(&rhs_cols[j]));
        for r in 0..n {
            if sparse::subset_cols(view(&lhs_cols[r]), view(&union)) {
                s[r][j] = true;
                hits[r] += 1;
            }
        }
    }

    let mut active = vec![true; n];
    loop {
        // Most hits first, ties broken by column index.
        let mut candidate: Option<usize> = None;
        for r in 0..n {
            if active[r] && hits[r] > 1 && candidate.map_or(true, |best| hits[r] > hits[best]) {
                candidate = Some(r);
            }
        }
        let Some(r) = candidate else { break };
        if let Some(token) = cancel {
            token.check()?;
        }
        active[r] = false;

        let targets: Vec<usize> = (0..n)
            .filter(|&j| j != r && j >= fixed && s[r][j])
            .collect();
        for j in targets {
            let shed = sparse::difference_cols(view(&rhs_cols[j]), view(&rhs_cols[r]));
            if shed == rhs_cols[j] {
                continue;
            }
            rhs_cols[j] = shed;
            // Column j changed: refresh its eligibility and its predicate
            // column, keeping the hit counts in step.
            eligible[j] = supports_disjoint(view(&lhs_cols[j]), view(&rhs_cols[j]));
            let union = sparse::union_cols(view(&lhs_cols[j]), view(&rhs_cols[j]));
            for r2 in 0..n {
                let now =
                    eligible[j] && sparse::subset_cols(view(&lhs_cols[r2]), view(&union));
                if now != s[r2][j] {
                    if now {
                        hits[r2] += 1;
                    } else {
                        hits[r2] -= 1;
                    }
                    s[r2][j] = now;
                }
            }
        }
    }

    let keep: Vec<usize> = (fixed..n).filter(|&j| !rhs_cols[j].0.is_empty()).collect();
    let mut out_lhs = SparseMatrix::zeros(lhs.nrows());
    let mut out_rhs = SparseMatrix::zeros(rhs.nrows());
    for &j in &keep {
        out_lhs.push_col(&lhs_cols[j].0, &lhs_cols[j].1);
        out_rhs.push_col(&rhs_cols[j].0, &rhs_cols[j].1);
    }
    Ok((out_lhs, out_rhs))
}

fn view(col: &(Vec<usize>, Vec<f64>)) -> ColView<'_> {
    ColView {
        rows: &col.0,
        vals: &col.1,
    }
}

/// Support disjointness, the crisp reading of "self-intersection zero".
fn supports_disjoint(a: ColView<'_>, b: ColView<'_>) -> bool {
    let (mut ka, mut kb) = (0, 0);
    while ka < a.len() && kb < b.len() {
        if a.rows[ka] < b.rows[kb] {
            ka += 1;
        } else if b.rows[kb] < a.rows[ka] {
            kb += 1;
        } else {
            return false;
        }
    }
    true
}

fn assemble(
    lhs: &SparseMatrix,
    rhs_cols: &[(Vec<usize>, Vec<f64>)],
) -> (SparseMatrix, SparseMatrix) {
    let mut out_lhs = SparseMatrix::zeros(lhs.nrows());
    let mut out_rhs = SparseMatrix::zeros(lhs.nrows());
    for (j, col) in rhs_cols.iter().enumerate() {
        if col.0.is_empty() {
            continue;
        }
        let l = lhs.col(j);
        out_lhs.push_col(l.rows, l.vals);
        out_rhs.push_col(&col.0, &col.1);
    }
    (out_lhs, out_rhs)
}
