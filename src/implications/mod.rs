//! The implication store: aligned sparse LHS/RHS column matrices.
//!
//! Column `i` of the two matrices is the i-th rule `LHS[:,i] ⇒ RHS[:,i]`,
//! both fuzzy sets over the attribute universe. Rules with empty RHS are
//! dead and are never stored. The store owns its columns; rewrites (see
//! `rewrite`) either commit a full replacement or leave the store untouched.

mod closure;
mod entail;
mod rewrite;

pub use closure::RuleClosure;
pub use rewrite::{RewriteFn, RewriteRegistry};

use crate::error::FcaError;
use crate::incidence::Incidence;
use crate::set::{FuzzySet, Universe};
use crate::sparse::{self, SparseMatrix};

/// One rule, extracted from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Implication {
    pub lhs: FuzzySet,
    pub rhs: FuzzySet,
}

/// A set of attribute implications over a fixed attribute universe.
#[derive(Clone, Debug, PartialEq)]
pub struct ImplicationSet {
    attributes: Vec<String>,
    lhs: SparseMatrix,
    rhs: SparseMatrix,
}

impl ImplicationSet {
    /// Empty store over the given attribute universe.
    pub fn new(attributes: Vec<String>) -> Self {
        let n = attributes.len();
        Self {
            attributes,
            lhs: SparseMatrix::zeros(n),
            rhs: SparseMatrix::zeros(n),
        }
    }

    /// Build from aligned LHS/RHS matrices. Columns with empty RHS are
    /// garbage-collected on the way in.
    pub fn from_matrices(
        attributes: Vec<String>,
        lhs: SparseMatrix,
        rhs: SparseMatrix,
    ) -> Result<Self, FcaError> {
        let n = attributes.len();
        if lhs.nrows() != n || rhs.nrows() != n {
            return Err(FcaError::ShapeMismatch(format!(
                "implication matrices must have {n} rows"
            )));
        }
        if lhs.ncols() != rhs.ncols() {
            return Err(FcaError::InvariantViolation(format!(
                "LHS has {} columns but RHS has {}",
                lhs.ncols(),
                rhs.ncols()
            )));
        }
        lhs.validate()?;
        rhs.validate()?;
        let keep: Vec<usize> = (0..rhs.ncols()).filter(|&j| !rhs.col(j).is_empty()).collect();
        let (lhs, rhs) = if keep.len() == rhs.ncols() {
            (lhs, rhs)
        } else {
            (lhs.select_cols(&keep), rhs.select_cols(&keep))
        };
        Ok(Self {
            attributes,
            lhs,
            rhs,
        })
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn n_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Number of rules.
    pub fn cardinality(&self) -> usize {
        self.lhs.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    pub fn lhs(&self) -> &SparseMatrix {
        &self.lhs
    }

    pub fn rhs(&self) -> &SparseMatrix {
        &self.rhs
    }

    pub(crate) fn replace_matrices(&mut self, lhs: SparseMatrix, rhs: SparseMatrix) {
        self.lhs = lhs;
        self.rhs = rhs;
    }

    fn check_attribute_set(&self, s: &FuzzySet) -> Result<(), FcaError> {
        if s.universe() != Universe::Attributes || s.universe_size() != self.n_attributes() {
            return Err(FcaError::ShapeMismatch(format!(
                "expected a set over {} attributes",
                self.n_attributes()
            )));
        }
        Ok(())
    }

    /// Append a rule. A rule with empty RHS is dead and is dropped.
    pub fn add(&mut self, lhs: &FuzzySet, rhs: &FuzzySet) -> Result<(), FcaError> {
        self.check_attribute_set(lhs)?;
        self.check_attribute_set(rhs)?;
        if rhs.is_empty() {
            return Ok(());
        }
        self.lhs.push_col(lhs.support(), lhs.grades());
        self.rhs.push_col(rhs.support(), rhs.grades());
        Ok(())
    }

    /// Append every rule of another store over the same attribute universe.
    pub fn append(&mut self, other: &ImplicationSet) -> Result<(), FcaError> {
        self.check_same_universe(other)?;
        for j in 0..other.cardinality() {
            let l = other.lhs.col(j);
            let r = other.rhs.col(j);
            self.lhs.push_col(l.rows, l.vals);
            self.rhs.push_col(r.rows, r.vals);
        }
        Ok(())
    }

    pub(crate) fn check_same_universe(&self, other: &ImplicationSet) -> Result<(), FcaError> {
        if self.attributes != other.attributes {
            return Err(FcaError::ShapeMismatch(
                "implication sets range over different attribute universes".into(),
            ));
        }
        Ok(())
    }

    /// Extract rule `i`.
    pub fn get(&self, i: usize) -> Implication {
        let n = self.n_attributes();
        let (lr, lv) = self.lhs.extract(i);
        let (rr, rv) = self.rhs.extract(i);
        Implication {
            lhs: FuzzySet::from_sorted_unchecked(Universe::Attributes, n, lr, lv),
            rhs: FuzzySet::from_sorted_unchecked(Universe::Attributes, n, rr, rv),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Implication> + '_ {
        (0..self.cardinality()).map(|i| self.get(i))
    }

    /// Per-rule (|LHS|, |RHS|) as σ-counts.
    pub fn size(&self) -> Vec<(f64, f64)> {
        (0..self.cardinality())
            .map(|i| (self.lhs.cardinality(i), self.rhs.cardinality(i)))
            .collect()
    }

    /// Total σ-count over all rules, Σ (|LHS| + |RHS|).
    pub fn total_size(&self) -> f64 {
        self.size().iter().map(|(l, r)| l + r).sum()
    }

    fn check_incidence(&self, incidence: &Incidence) -> Result<(), FcaError> {
        if incidence.attributes() != self.attributes.as_slice() {
            return Err(FcaError::ShapeMismatch(
                "implication set and incidence have different attribute universes".into(),
            ));
        }
        Ok(())
    }

    /// Per-rule support: the fraction of objects whose attribute vector is
    /// pointwise ≥ the rule's LHS.
    pub fn support(&self, incidence: &Incidence) -> Result<Vec<f64>, FcaError> {
        self.check_incidence(incidence)?;
        if incidence.n_objects() == 0 {
            return Err(FcaError::EmptyContext(
                "support requires at least one object".into(),
            ));
        }
        let n_obj = incidence.n_objects();
        Ok((0..self.cardinality())
            .map(|i| {
                let lhs = self.lhs.col(i);
                let holders = (0..n_obj)
                    .filter(|&o| sparse::subset_cols(lhs, incidence.object_col(o)))
                    .count();
                holders as f64 / n_obj as f64
            })
            .collect())
    }

    /// Per-rule: does every object's attribute vector satisfy the rule?
    pub fn holds_in(&self, incidence: &Incidence) -> Result<Vec<bool>, FcaError> {
        self.check_incidence(incidence)?;
        let n_obj = incidence.n_objects();
        Ok((0..self.cardinality())
            .map(|i| {
                let lhs = self.lhs.col(i);
                let rhs = self.rhs.col(i);
                (0..n_obj).all(|o| {
                    let col = incidence.object_col(o);
                    !sparse::subset_cols(lhs, col) || sparse::subset_cols(rhs, col)
                })
            })
            .collect())
    }

    /// Boolean matrix: `out[i][j]` iff set `i` respects rule `j`
    /// (`S_i ⊉ LHS_j` or `S_i ⊇ RHS_j`).
    pub fn respects(&self, sets: &[FuzzySet]) -> Result<Vec<Vec<bool>>, FcaError> {
        for s in sets {
            self.check_attribute_set(s)?;
        }
        Ok(sets
            .iter()
            .map(|s| {
                let col = s.as_col();
                (0..self.cardinality())
                    .map(|j| {
                        !sparse::subset_cols(self.lhs.col(j), col)
                            || sparse::subset_cols(self.rhs.col(j), col)
                    })
                    .collect()
            })
            .collect())
    }

    /// Keep the rules passing the filter. `min_support` needs the incidence
    /// the rules speak about; omitting it fails with `EmptyContext`.
    pub fn filter(
        &self,
        filter: &ImplicationFilter,
        incidence: Option<&Incidence>,
    ) -> Result<ImplicationSet, FcaError> {
        let lhs_contains = self.resolve_names(&filter.lhs_contains)?;
        let rhs_contains = self.resolve_names(&filter.rhs_contains)?;
        let lhs_excludes = self.resolve_names(&filter.lhs_excludes)?;
        let supports = match filter.min_support {
            Some(_) => {
                let inc = incidence.ok_or_else(|| {
                    FcaError::EmptyContext(
                        "filtering by support requires an incidence".into(),
                    )
                })?;
                Some(self.support(inc)?)
            }
            None => None,
        };
        let keep: Vec<usize> = (0..self.cardinality())
            .filter(|&i| {
                let lhs = self.lhs.col(i);
                let rhs = self.rhs.col(i);
                if !lhs_contains.iter().all(|&a| lhs.get(a) > 0.0) {
                    return false;
                }
                if !rhs_contains.is_empty() && !rhs_contains.iter().any(|&a| rhs.get(a) > 0.0) {
                    return false;
                }
                if lhs_excludes.iter().any(|&a| lhs.get(a) > 0.0) {
                    return false;
                }
                if let Some(min) = filter.min_size {
                    if lhs.cardinality() + rhs.cardinality() < min {
                        return false;
                    }
                }
                if let (Some(min), Some(supports)) = (filter.min_support, supports.as_ref()) {
                    if supports[i] < min {
                        return false;
                    }
                }
                true
            })
            .collect();
        Ok(ImplicationSet {
            attributes: self.attributes.clone(),
            lhs: self.lhs.select_cols(&keep),
            rhs: self.rhs.select_cols(&keep),
        })
    }

    fn resolve_names(&self, names: &[String]) -> Result<Vec<usize>, FcaError> {
        names
            .iter()
            .map(|name| {
                self.attributes
                    .iter()
                    .position(|a| a == name)
                    .ok_or_else(|| {
                        FcaError::ShapeMismatch(format!("unknown attribute name `{name}`"))
                    })
            })
            .collect()
    }
}

/// Predicate bundle for `ImplicationSet::filter`.
#[derive(Clone, Debug, Default)]
pub struct ImplicationFilter {
    /// Every listed attribute must appear in the rule's LHS.
    pub lhs_contains: Vec<String>,
    /// At least one listed attribute must appear in the rule's RHS.
    pub rhs_contains: Vec<String>,
    /// No listed attribute may appear in the rule's LHS.
    pub lhs_excludes: Vec<String>,
    /// Keep rules with support at least this (requires an incidence).
    pub min_support: Option<f64>,
    /// Keep rules with |LHS| + |RHS| at least this.
    pub min_size: Option<f64>,
}

impl std::fmt::Display for ImplicationSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, rule) in self.iter().enumerate() {
            writeln!(
                f,
                "{}: {} -> {}",
                i + 1,
                rule.lhs.display(&self.attributes),
                rule.rhs.display(&self.attributes)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn attr_set(n: usize, pairs: &[(usize, f64)]) -> FuzzySet {
        FuzzySet::from_pairs(Universe::Attributes, n, pairs).unwrap()
    }

    fn abc_store() -> ImplicationSet {
        // {a} -> {b}, {b} -> {c}
        let mut set = ImplicationSet::new(names(&["a", "b", "c"]));
        set.add(&attr_set(3, &[(0, 1.0)]), &attr_set(3, &[(1, 1.0)]))
            .unwrap();
        set.add(&attr_set(3, &[(1, 1.0)]), &attr_set(3, &[(2, 1.0)]))
            .unwrap();
        set
    }

    #[test]
    fn test_add_and_sizes() {
        let set = abc_store();
        assert_eq!(set.cardinality(), 2);
        assert_eq!(set.size(), vec![(1.0, 1.0), (1.0, 1.0)]);
        assert_eq!(set.total_size(), 4.0);
        let rule = set.get(0);
        assert_eq!(rule.lhs.support(), &[0]);
        assert_eq!(rule.rhs.support(), &[1]);
    }

    #[test]
    fn test_empty_rhs_is_dropped() {
        let mut set = ImplicationSet::new(names(&["a", "b"]));
        set.add(
            &attr_set(2, &[(0, 1.0)]),
            &FuzzySet::empty(Universe::Attributes, 2),
        )
        .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_display() {
        let set = abc_store();
        let text = format!("{set}");
        assert!(text.contains("1: {a} -> {b}"));
        assert!(text.contains("2: {b} -> {c}"));
    }

    #[test]
    fn test_support_and_holds_in() {
        // objects: x has a,b,c; y has a,b; z has c
        let inc = Incidence::from_table(
            names(&["x", "y", "z"]),
            names(&["a", "b", "c"]),
            &[
                1.0, 1.0, 1.0, //
                1.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ],
        )
        .unwrap();
        let set = abc_store();
        assert_eq!(set.support(&inc).unwrap(), vec![2.0 / 3.0, 2.0 / 3.0]);
        // {a} -> {b} holds (x, y have both); {b} -> {c} fails on y.
        assert_eq!(set.holds_in(&inc).unwrap(), vec![true, false]);
    }

    #[test]
    fn test_respects() {
        let set = abc_store();
        let with_ab = attr_set(3, &[(0, 1.0), (1, 1.0)]);
        let with_a_only = attr_set(3, &[(0, 1.0)]);
        let out = set.respects(&[with_ab, with_a_only]).unwrap();
        // {a,b} respects {a}->{b} but not {b}->{c}
        assert_eq!(out[0], vec![true, false]);
        // {a} does not respect {a}->{b}; respects {b}->{c} vacuously
        assert_eq!(out[1], vec![false, true]);
    }

    #[test]
    fn test_filter_by_names_and_size() {
        let set = abc_store();
        let only_a_lhs = set
            .filter(
                &ImplicationFilter {
                    lhs_contains: names(&["a"]),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(only_a_lhs.cardinality(), 1);
        assert_eq!(only_a_lhs.get(0).lhs.support(), &[0]);

        let excluded = set
            .filter(
                &ImplicationFilter {
                    lhs_excludes: names(&["a"]),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(excluded.cardinality(), 1);
        assert_eq!(excluded.get(0).lhs.support(), &[1]);

        let by_rhs = set
            .filter(
                &ImplicationFilter {
                    rhs_contains: names(&["c"]),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(by_rhs.cardinality(), 1);
        assert_eq!(by_rhs.get(0).rhs.support(), &[2]);

        let big_enough = set
            .filter(
                &ImplicationFilter {
                    min_size: Some(3.0),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert!(big_enough.is_empty());
    }

    #[test]
    fn test_append() {
        let mut set = abc_store();
        let mut other = ImplicationSet::new(names(&["a", "b", "c"]));
        other
            .add(&attr_set(3, &[(2, 1.0)]), &attr_set(3, &[(0, 1.0)]))
            .unwrap();
        set.append(&other).unwrap();
        assert_eq!(set.cardinality(), 3);
        assert_eq!(set.get(2).lhs.support(), &[2]);

        let wrong = ImplicationSet::new(names(&["x", "y", "z"]));
        assert!(matches!(
            set.append(&wrong),
            Err(FcaError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_filter_support_requires_incidence() {
        let set = abc_store();
        let result = set.filter(
            &ImplicationFilter {
                min_support: Some(0.5),
                ..Default::default()
            },
            None,
        );
        assert!(matches!(result, Err(FcaError::EmptyContext(_))));
    }
}
