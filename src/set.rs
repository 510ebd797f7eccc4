//! Fuzzy sets tagged with their universe.
//!
//! A `FuzzySet` is a sparse grade vector over either the object or the
//! attribute universe of an incidence. The tag plus the universe size are
//! checked by every cross-set operation, so mixing an object set into an
//! attribute position fails with `ShapeMismatch` instead of producing
//! garbage.

use crate::error::FcaError;
use crate::logic::Logic;
use crate::sparse::{self, ColView};

/// Which universe a fuzzy set ranges over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Universe {
    Objects,
    Attributes,
}

impl std::fmt::Display for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Universe::Objects => write!(f, "objects"),
            Universe::Attributes => write!(f, "attributes"),
        }
    }
}

/// A sparse fuzzy set: `universe → [0,1]` with only nonzero grades stored.
#[derive(Clone, Debug, PartialEq)]
pub struct FuzzySet {
    universe: Universe,
    size: usize,
    rows: Vec<usize>,
    grades: Vec<f64>,
}

impl FuzzySet {
    /// The empty set over a universe of `size` elements.
    pub fn empty(universe: Universe, size: usize) -> Self {
        Self {
            universe,
            size,
            rows: Vec::new(),
            grades: Vec::new(),
        }
    }

    /// The full set: every element at grade 1.
    pub fn full(universe: Universe, size: usize) -> Self {
        Self {
            universe,
            size,
            rows: (0..size).collect(),
            grades: vec![1.0; size],
        }
    }

    /// Build from (index, grade) pairs. Pairs may arrive in any order;
    /// duplicates, out-of-range indices and grades outside (0,1] are
    /// rejected. Zero grades are dropped.
    pub fn from_pairs(
        universe: Universe,
        size: usize,
        pairs: &[(usize, f64)],
    ) -> Result<Self, FcaError> {
        let mut entries: Vec<(usize, f64)> =
            pairs.iter().copied().filter(|&(_, g)| g != 0.0).collect();
        entries.sort_by_key(|&(r, _)| r);
        let mut rows = Vec::with_capacity(entries.len());
        let mut grades = Vec::with_capacity(entries.len());
        for (r, g) in entries {
            if r >= size {
                return Err(FcaError::ShapeMismatch(format!(
                    "index {r} out of range for a universe of {size} {universe}"
                )));
            }
            if !(g > 0.0 && g <= 1.0) {
                return Err(FcaError::ShapeMismatch(format!(
                    "grade {g} outside (0, 1]"
                )));
            }
            if rows.last() == Some(&r) {
                return Err(FcaError::ShapeMismatch(format!(
                    "duplicate index {r} in fuzzy set"
                )));
            }
            rows.push(r);
            grades.push(g);
        }
        Ok(Self {
            universe,
            size,
            rows,
            grades,
        })
    }

    /// Build from a dense grade vector.
    pub fn from_dense(universe: Universe, dense: &[f64]) -> Result<Self, FcaError> {
        let pairs: Vec<(usize, f64)> = dense
            .iter()
            .enumerate()
            .filter(|&(_, &g)| g != 0.0)
            .map(|(r, &g)| (r, g))
            .collect();
        Self::from_pairs(universe, dense.len(), &pairs)
    }

    /// Internal constructor for already-sorted, already-validated entries.
    pub(crate) fn from_sorted_unchecked(
        universe: Universe,
        size: usize,
        rows: Vec<usize>,
        grades: Vec<f64>,
    ) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(grades.iter().all(|&g| g > 0.0));
        Self {
            universe,
            size,
            rows,
            grades,
        }
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Number of elements in the universe (not the support).
    pub fn universe_size(&self) -> usize {
        self.size
    }

    /// Indices with nonzero grade, ascending.
    pub fn support(&self) -> &[usize] {
        &self.rows
    }

    pub fn grades(&self) -> &[f64] {
        &self.grades
    }

    /// Grade of element `idx`, 0 when absent.
    pub fn get(&self, idx: usize) -> f64 {
        self.as_col().get(idx)
    }

    /// σ-count: sum of grades.
    pub fn cardinality(&self) -> f64 {
        self.grades.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.rows.iter().copied().zip(self.grades.iter().copied())
    }

    pub fn as_col(&self) -> ColView<'_> {
        ColView {
            rows: &self.rows,
            vals: &self.grades,
        }
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.size];
        for (r, g) in self.iter() {
            dense[r] = g;
        }
        dense
    }

    fn check_same(&self, other: &FuzzySet) -> Result<(), FcaError> {
        if self.universe != other.universe {
            return Err(FcaError::ShapeMismatch(format!(
                "cannot combine a set of {} with a set of {}",
                self.universe, other.universe
            )));
        }
        if self.size != other.size {
            return Err(FcaError::ShapeMismatch(format!(
                "universe sizes differ ({} vs {})",
                self.size, other.size
            )));
        }
        Ok(())
    }

    /// Pointwise max.
    pub fn union(&self, other: &FuzzySet) -> Result<FuzzySet, FcaError> {
        self.check_same(other)?;
        let (rows, grades) = sparse::union_cols(self.as_col(), other.as_col());
        Ok(Self::from_sorted_unchecked(
            self.universe,
            self.size,
            rows,
            grades,
        ))
    }

    /// Pointwise ⊗ under the given logic.
    pub fn intersect(&self, other: &FuzzySet, logic: &Logic) -> Result<FuzzySet, FcaError> {
        self.check_same(other)?;
        let (rows, grades) = sparse::intersect_cols(self.as_col(), other.as_col(), logic);
        Ok(Self::from_sorted_unchecked(
            self.universe,
            self.size,
            rows,
            grades,
        ))
    }

    /// Fuzzy difference: keep this set's grade wherever it strictly exceeds
    /// the other's.
    pub fn difference(&self, other: &FuzzySet) -> Result<FuzzySet, FcaError> {
        self.check_same(other)?;
        let (rows, grades) = sparse::difference_cols(self.as_col(), other.as_col());
        Ok(Self::from_sorted_unchecked(
            self.universe,
            self.size,
            rows,
            grades,
        ))
    }

    /// Pointwise `self ≤ other` on every element.
    pub fn is_subset_of(&self, other: &FuzzySet) -> Result<bool, FcaError> {
        self.check_same(other)?;
        Ok(sparse::subset_cols(self.as_col(), other.as_col()))
    }

    /// Render with element names, omitting grade-1 annotations:
    /// `{moon, large [0.5]}`.
    pub fn display<'a>(&'a self, names: &'a [String]) -> SetDisplay<'a> {
        SetDisplay { set: self, names }
    }
}

/// Display adapter pairing a fuzzy set with its universe's names.
pub struct SetDisplay<'a> {
    set: &'a FuzzySet,
    names: &'a [String],
}

impl std::fmt::Display for SetDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (k, (r, g)) in self.set.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            let name = self
                .names
                .get(r)
                .map(|s| s.as_str())
                .unwrap_or("?");
            if g == 1.0 {
                write!(f, "{name}")?;
            } else {
                write!(f, "{name} [{g}]")?;
            }
        }
        write!(f, "}}")
    }
}
