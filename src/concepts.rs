//! Concept sets: aligned extent/intent columns emitted by the enumerator.
//!
//! A concept is a pair (A, B) with `A↑ = B` and `B↓ = A`. The set of
//! concepts is ordered by extent inclusion (equivalently, reverse intent
//! inclusion); `is_subconcept` exposes that order.

use crate::set::{FuzzySet, Universe};
use crate::sparse::{self, SparseMatrix};

/// One concept, extracted from a `ConceptSet`.
#[derive(Clone, Debug, PartialEq)]
pub struct Concept {
    pub extent: FuzzySet,
    pub intent: FuzzySet,
}

/// The concepts of an incidence, in lectic order of intent.
#[derive(Clone, Debug)]
pub struct ConceptSet {
    objects: Vec<String>,
    attributes: Vec<String>,
    /// Rows = objects, one column per concept.
    extents: SparseMatrix,
    /// Rows = attributes, one column per concept.
    intents: SparseMatrix,
}

impl ConceptSet {
    pub(crate) fn new(objects: Vec<String>, attributes: Vec<String>) -> Self {
        let (n_obj, n_attr) = (objects.len(), attributes.len());
        Self {
            objects,
            attributes,
            extents: SparseMatrix::zeros(n_obj),
            intents: SparseMatrix::zeros(n_attr),
        }
    }

    pub(crate) fn push(&mut self, extent: &FuzzySet, intent: &FuzzySet) {
        self.extents.push_col(extent.support(), extent.grades());
        self.intents.push_col(intent.support(), intent.grades());
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.intents.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extents(&self) -> &SparseMatrix {
        &self.extents
    }

    pub fn intents(&self) -> &SparseMatrix {
        &self.intents
    }

    pub fn get(&self, i: usize) -> Concept {
        let (er, ev) = self.extents.extract(i);
        let (ir, iv) = self.intents.extract(i);
        Concept {
            extent: FuzzySet::from_sorted_unchecked(
                Universe::Objects,
                self.objects.len(),
                er,
                ev,
            ),
            intent: FuzzySet::from_sorted_unchecked(
                Universe::Attributes,
                self.attributes.len(),
                ir,
                iv,
            ),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Concept> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }

    /// `(A_i, B_i) ≤ (A_j, B_j)` iff `A_i ⊆ A_j`.
    pub fn is_subconcept(&self, i: usize, j: usize) -> bool {
        sparse::subset_cols(self.extents.col(i), self.extents.col(j))
    }
}

impl std::fmt::Display for ConceptSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, c) in self.iter().enumerate() {
            writeln!(
                f,
                "{}: ({}, {})",
                i + 1,
                c.extent.display(&self.objects),
                c.intent.display(&self.attributes)
            )?;
        }
        Ok(())
    }
}
