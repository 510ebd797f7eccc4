//! The Next-Closure enumerator.
//!
//! Enumerates all closed fuzzy attribute sets of an incidence in strictly
//! increasing lectic order. Attributes carry the fixed order of the
//! incidence; for two distinct sets, the one with the greater grade at the
//! least position where they differ is lectically greater.
//!
//! Two run modes:
//!
//! - **Concepts**: step with the context closure; every visited set is an
//!   intent and its extent is computed once.
//! - **Implications**: step with the closure under the implications emitted
//!   so far (the stem-base traversal). A visited set that is not closed in
//!   the context yields the implication `A ⇒ cl(A) − A`; the union of those
//!   emissions is the Duquenne–Guigues canonical basis, in lectic order of
//!   LHS, and the closed visited sets are exactly the intents.
//!
//! The engine snapshots the active logic at start; `use_logic` during a run
//! has no effect on it. A `CancelToken` is checked at the top of each step.

use std::cmp::Ordering;

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::concepts::ConceptSet;
use crate::error::FcaError;
use crate::implications::ImplicationSet;
use crate::incidence::Incidence;
use crate::logic::{current_logic, Logic};
use crate::set::{FuzzySet, Universe};
use crate::sparse::SparseMatrix;

/// What the sweep produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// All intents, with their extents.
    Concepts,
    /// The canonical basis plus all intents.
    Implications,
}

/// Configured enumerator over one incidence.
pub struct NextClosure<'a> {
    incidence: &'a Incidence,
    mode: Mode,
    save_concepts: bool,
    verbose: bool,
    cancel: Option<CancelToken>,
}

/// Output bundle of a sweep.
#[derive(Clone, Debug)]
pub struct Enumeration {
    /// All intents, one column per closed set, in lectic order.
    pub intents: SparseMatrix,
    /// Extent/intent pairs, when concepts were saved.
    pub concepts: Option<ConceptSet>,
    /// The canonical basis (empty in concepts mode).
    pub implications: ImplicationSet,
    /// Sets accepted by the traversal: intents in concepts mode, intents
    /// plus pseudo-intents in implications mode.
    pub closure_count: usize,
}

impl<'a> NextClosure<'a> {
    pub fn new(incidence: &'a Incidence, mode: Mode) -> Self {
        Self {
            incidence,
            mode,
            save_concepts: mode == Mode::Concepts,
            verbose: false,
            cancel: None,
        }
    }

    /// Also record extents (always on in concepts mode by default).
    pub fn save_concepts(mut self, save: bool) -> Self {
        self.save_concepts = save;
        self
    }

    /// Raise per-step diagnostics to `info` level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the sweep to completion.
    pub fn run(&self) -> Result<Enumeration, FcaError> {
        let inc = self.incidence;
        if inc.n_objects() == 0 || inc.n_attributes() == 0 {
            return Err(FcaError::EmptyContext(
                "enumeration requires at least one object and one attribute".into(),
            ));
        }
        let logic = current_logic();
        match self.mode {
            Mode::Concepts => self.run_concepts(&logic),
            Mode::Implications => self.run_implications(&logic),
        }
    }

    fn run_concepts(&self, logic: &Logic) -> Result<Enumeration, FcaError> {
        let inc = self.incidence;
        let mut intents = SparseMatrix::zeros(inc.n_attributes());
        let mut concepts = self
            .save_concepts
            .then(|| ConceptSet::new(inc.objects().to_vec(), inc.attributes().to_vec()));
        let mut count = 0usize;

        let mut current = inc.closure_with(&inc.empty_attribute_set(), logic)?;
        loop {
            if let Some(token) = &self.cancel {
                token.check()?;
            }
            count += 1;
            self.trace_step("intent", &current);
            intents.push_col(current.support(), current.grades());
            if let Some(cs) = concepts.as_mut() {
                let extent = inc.extent_with(&current, logic)?;
                cs.push(&extent, &current);
            }
            match self.step(&current, |cand| inc.closure_with(cand, logic))? {
                Some(next) => current = next,
                None => break,
            }
        }
        debug!(intents = count, "next-closure sweep finished");
        Ok(Enumeration {
            intents,
            concepts,
            implications: ImplicationSet::new(inc.attributes().to_vec()),
            closure_count: count,
        })
    }

    fn run_implications(&self, logic: &Logic) -> Result<Enumeration, FcaError> {
        let inc = self.incidence;
        let mut basis = ImplicationSet::new(inc.attributes().to_vec());
        let mut intents = SparseMatrix::zeros(inc.n_attributes());
        let mut concepts = self
            .save_concepts
            .then(|| ConceptSet::new(inc.objects().to_vec(), inc.attributes().to_vec()));
        let mut count = 0usize;

        // The empty set is closed under the (still empty) basis.
        let mut current = inc.empty_attribute_set();
        loop {
            if let Some(token) = &self.cancel {
                token.check()?;
            }
            count += 1;
            let closed = inc.closure_with(&current, logic)?;
            if closed != current {
                // A set closed under the basis but not in the context is a
                // pseudo-intent; its closure difference is the new rule.
                let rhs = closed.difference(&current)?;
                self.trace_step("pseudo-intent", &current);
                basis.add(&current, &rhs)?;
            } else {
                self.trace_step("intent", &current);
                intents.push_col(current.support(), current.grades());
                if let Some(cs) = concepts.as_mut() {
                    let extent = inc.extent_with(&current, logic)?;
                    cs.push(&extent, &current);
                }
            }
            match self.step(&current, |cand| basis.closure_of(cand))? {
                Some(next) => current = next,
                None => break,
            }
        }
        debug!(
            visited = count,
            rules = basis.cardinality(),
            "next-closure sweep finished"
        );
        Ok(Enumeration {
            intents,
            concepts,
            implications: basis,
            closure_count: count,
        })
    }

    /// The single-step operator: the lectically next set closed under `cl`.
    ///
    /// Iterating positions from the last to the first and candidate grades
    /// ascending, the first closure agreeing with the current set below the
    /// raised position is the successor.
    fn step(
        &self,
        a: &FuzzySet,
        cl: impl Fn(&FuzzySet) -> Result<FuzzySet, FcaError>,
    ) -> Result<Option<FuzzySet>, FcaError> {
        let inc = self.incidence;
        let n = inc.n_attributes();
        let a_dense = a.to_dense();
        for k in (0..n).rev() {
            for &v in inc.attribute_grades(k) {
                if v <= a_dense[k] {
                    continue;
                }
                let mut cand = vec![0.0; n];
                cand[..k].copy_from_slice(&a_dense[..k]);
                cand[k] = v;
                let cand_set = FuzzySet::from_dense(Universe::Attributes, &cand)
                    .expect("grades come from the incidence");
                let b = cl(&cand_set)?;
                let b_dense = b.to_dense();
                if b_dense[..k] == a_dense[..k] {
                    return Ok(Some(b));
                }
            }
        }
        Ok(None)
    }

    fn trace_step(&self, kind: &str, set: &FuzzySet) {
        if self.verbose {
            info!(
                kind,
                set = %set.display(self.incidence.attributes()),
                "next-closure step"
            );
        } else {
            debug!(kind, support = set.support().len(), "next-closure step");
        }
    }
}

/// The lectic order on fuzzy attribute sets: at the least position where two
/// sets differ, the greater grade wins.
pub fn lectic_cmp(a: &FuzzySet, b: &FuzzySet) -> Ordering {
    debug_assert_eq!(a.universe_size(), b.universe_size());
    let ad = a.to_dense();
    let bd = b.to_dense();
    for (x, y) in ad.iter().zip(bd.iter()) {
        if x != y {
            return x.partial_cmp(y).expect("grades are never NaN");
        }
    }
    Ordering::Equal
}

impl Incidence {
    /// All concepts of the incidence, under the active logic.
    pub fn concepts(&self) -> Result<Enumeration, FcaError> {
        NextClosure::new(self, Mode::Concepts).run()
    }

    /// The Duquenne–Guigues canonical basis (plus all intents), under the
    /// active logic.
    pub fn canonical_basis(&self) -> Result<Enumeration, FcaError> {
        NextClosure::new(self, Mode::Implications).run()
    }
}
