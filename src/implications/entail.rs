//! Entailment and equivalence between implication sets.

use super::ImplicationSet;
use crate::error::FcaError;

impl ImplicationSet {
    /// `self ⊨ other`: every rule `P ⇒ Q` of `other` satisfies
    /// `Q ⊆ cl_self(P)`.
    pub fn entails(&self, other: &ImplicationSet) -> Result<bool, FcaError> {
        self.check_same_universe(other)?;
        for rule in other.iter() {
            let closed = self.closure_of(&rule.lhs)?;
            if !rule.rhs.is_subset_of(&closed)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Mutual entailment.
    pub fn equivalent_to(&self, other: &ImplicationSet) -> Result<bool, FcaError> {
        Ok(self.entails(other)? && other.entails(self)?)
    }
}
