//! Residuated lattices ("logics") parameterising fuzzy operations.
//!
//! A logic is the triple (⊗, →, ¬) on [0,1]: a t-norm, its residuum and the
//! derived negation ¬x = x → 0. The residuum is adjoint to the t-norm:
//! x ⊗ y ≤ z  ⇔  x ≤ y → z. Every derivation in the crate goes through the
//! active logic; nothing outside this module hard-codes min/max for
//! conjunction or implication.
//!
//! The active logic and the registry are thread-scoped. `with_logic` is the
//! scoped acquisition: the previous logic is restored on every exit path,
//! panics included.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::error::FcaError;

/// A named residuated lattice on [0,1].
///
/// Operations are plain function pointers so a `Logic` is a cheap value that
/// an enumeration can capture at start and hold for its whole run.
#[derive(Clone, Debug)]
pub struct Logic {
    name: String,
    tnorm: fn(f64, f64) -> f64,
    residuum: fn(f64, f64) -> f64,
    negation: fn(f64) -> f64,
}

impl Logic {
    /// Build a logic from its operations. The residuum must be adjoint to
    /// the t-norm; this is not checked.
    pub fn new(
        name: impl Into<String>,
        tnorm: fn(f64, f64) -> f64,
        residuum: fn(f64, f64) -> f64,
        negation: fn(f64) -> f64,
    ) -> Self {
        Self {
            name: name.into(),
            tnorm,
            residuum,
            negation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fuzzy conjunction x ⊗ y.
    #[inline]
    pub fn tnorm(&self, x: f64, y: f64) -> f64 {
        (self.tnorm)(x, y)
    }

    /// Residuated implication x → y.
    #[inline]
    pub fn residuum(&self, x: f64, y: f64) -> f64 {
        (self.residuum)(x, y)
    }

    /// Negation ¬x = x → 0.
    #[inline]
    pub fn negation(&self, x: f64) -> f64 {
        (self.negation)(x)
    }

    /// Gödel logic: ⊗ = min, x → y = 1 if x ≤ y else y.
    pub fn godel() -> Self {
        Self::new("Godel", godel_tnorm, godel_residuum, strict_negation)
    }

    /// Łukasiewicz logic: ⊗ = max(0, x+y−1), x → y = min(1, 1−x+y).
    pub fn lukasiewicz() -> Self {
        Self::new(
            "Lukasiewicz",
            lukasiewicz_tnorm,
            lukasiewicz_residuum,
            lukasiewicz_negation,
        )
    }

    /// Product logic: ⊗ = x·y, x → y = 1 if x ≤ y else y/x.
    pub fn product() -> Self {
        Self::new("Product", product_tnorm, product_residuum, strict_negation)
    }
}

fn godel_tnorm(x: f64, y: f64) -> f64 {
    x.min(y)
}

fn godel_residuum(x: f64, y: f64) -> f64 {
    if x <= y {
        1.0
    } else {
        y
    }
}

fn lukasiewicz_tnorm(x: f64, y: f64) -> f64 {
    (x + y - 1.0).max(0.0)
}

fn lukasiewicz_residuum(x: f64, y: f64) -> f64 {
    (1.0 - x + y).min(1.0)
}

fn lukasiewicz_negation(x: f64) -> f64 {
    1.0 - x
}

fn product_tnorm(x: f64, y: f64) -> f64 {
    x * y
}

fn product_residuum(x: f64, y: f64) -> f64 {
    if x <= y {
        1.0
    } else {
        y / x
    }
}

/// Negation of Gödel and Product: 1 at 0, otherwise 0.
fn strict_negation(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// Thread-scoped registry and active logic
// ============================================================================

struct LogicState {
    /// Case-folded name → logic. Insertion order is stable so listing the
    /// registry is deterministic.
    registry: IndexMap<String, Logic>,
    active: Logic,
}

impl LogicState {
    fn new() -> Self {
        let mut registry = IndexMap::new();
        for logic in [Logic::godel(), Logic::lukasiewicz(), Logic::product()] {
            registry.insert(logic.name().to_lowercase(), logic);
        }
        Self {
            registry,
            active: Logic::godel(),
        }
    }
}

thread_local! {
    static STATE: RefCell<LogicState> = RefCell::new(LogicState::new());
}

/// Snapshot of the active logic.
pub fn current_logic() -> Logic {
    STATE.with(|s| s.borrow().active.clone())
}

/// Switch the active logic by name (case-insensitive).
pub fn use_logic(name: &str) -> Result<(), FcaError> {
    let logic = lookup_logic(name)?;
    STATE.with(|s| s.borrow_mut().active = logic);
    Ok(())
}

/// Look up a registered logic without activating it.
pub fn lookup_logic(name: &str) -> Result<Logic, FcaError> {
    STATE.with(|s| {
        s.borrow()
            .registry
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| FcaError::UnknownLogic(name.to_string()))
    })
}

/// Register a logic under its (case-folded) name, shadowing any previous
/// registration of that name.
pub fn register_logic(logic: Logic) {
    STATE.with(|s| {
        s.borrow_mut()
            .registry
            .insert(logic.name().to_lowercase(), logic);
    });
}

/// Names of all registered logics, in registration order.
pub fn registered_logics() -> Vec<String> {
    STATE.with(|s| {
        s.borrow()
            .registry
            .values()
            .map(|l| l.name().to_string())
            .collect()
    })
}

/// Run `f` with the named logic active, restoring the previous logic on
/// every exit path (including panics).
pub fn with_logic<T>(name: &str, f: impl FnOnce() -> T) -> Result<T, FcaError> {
    let logic = lookup_logic(name)?;
    let previous = STATE.with(|s| {
        let mut state = s.borrow_mut();
        std::mem::replace(&mut state.active, logic)
    });
    let _guard = RestoreGuard { previous: Some(previous) };
    Ok(f())
}

struct RestoreGuard {
    previous: Option<Logic>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            STATE.with(|s| s.borrow_mut().active = previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_godel_ops() {
        let l = Logic::godel();
        assert_eq!(l.tnorm(0.3, 0.7), 0.3);
        assert_eq!(l.residuum(0.3, 0.7), 1.0);
        assert_eq!(l.residuum(0.7, 0.3), 0.3);
        assert_eq!(l.negation(0.0), 1.0);
        assert_eq!(l.negation(0.4), 0.0);
    }

    #[test]
    fn test_lukasiewicz_ops() {
        let l = Logic::lukasiewicz();
        assert_eq!(l.tnorm(0.6, 0.7), 0.6 + 0.7 - 1.0);
        assert_eq!(l.tnorm(0.2, 0.3), 0.0);
        assert_eq!(l.residuum(0.7, 0.3), 1.0 - 0.7 + 0.3);
        assert_eq!(l.residuum(0.3, 0.7), 1.0);
        assert_eq!(l.negation(0.3), 0.7);
    }

    #[test]
    fn test_product_ops() {
        let l = Logic::product();
        assert_eq!(l.tnorm(0.5, 0.4), 0.2);
        assert_eq!(l.residuum(0.8, 0.4), 0.5);
        assert_eq!(l.residuum(0.4, 0.8), 1.0);
    }

    /// x ⊗ y ≤ z  ⇔  x ≤ y → z, sampled on a grid.
    #[test]
    fn test_adjointness() {
        let grid = [0.0, 0.25, 0.5, 0.75, 1.0];
        for logic in [Logic::godel(), Logic::lukasiewicz(), Logic::product()] {
            for &x in &grid {
                for &y in &grid {
                    for &z in &grid {
                        let lhs = logic.tnorm(x, y) <= z + 1e-12;
                        let rhs = x <= logic.residuum(y, z) + 1e-12;
                        assert_eq!(lhs, rhs, "{} x={x} y={y} z={z}", logic.name());
                    }
                }
            }
        }
    }

    #[test]
    fn test_classical_restriction() {
        // On {0,1} all three logics agree with boolean AND and material
        // implication.
        for logic in [Logic::godel(), Logic::lukasiewicz(), Logic::product()] {
            for x in [0.0, 1.0] {
                for y in [0.0, 1.0] {
                    let and = if x == 1.0 && y == 1.0 { 1.0 } else { 0.0 };
                    let imp = if x == 1.0 && y == 0.0 { 0.0 } else { 1.0 };
                    assert_eq!(logic.tnorm(x, y), and);
                    assert_eq!(logic.residuum(x, y), imp);
                }
            }
        }
    }

    #[test]
    fn test_use_logic_case_insensitive() {
        use_logic("lukasiewicz").unwrap();
        assert_eq!(current_logic().name(), "Lukasiewicz");
        use_logic("GODEL").unwrap();
        assert_eq!(current_logic().name(), "Godel");
        assert!(matches!(
            use_logic("nonexistent"),
            Err(FcaError::UnknownLogic(_))
        ));
    }

    #[test]
    fn test_with_logic_restores() {
        use_logic("Godel").unwrap();
        let inner = with_logic("Product", || current_logic().name().to_string()).unwrap();
        assert_eq!(inner, "Product");
        assert_eq!(current_logic().name(), "Godel");
    }

    #[test]
    fn test_with_logic_restores_on_panic() {
        use_logic("Godel").unwrap();
        let result = std::panic::catch_unwind(|| {
            let _ = with_logic("Lukasiewicz", || panic!("boom"));
        });
        assert!(result.is_err());
        assert_eq!(current_logic().name(), "Godel");
    }

    #[test]
    fn test_register_logic() {
        // Drastic t-norm: x ⊗ y = min(x,y) when max(x,y)=1, else 0.
        fn drastic_tnorm(x: f64, y: f64) -> f64 {
            if x == 1.0 {
                y
            } else if y == 1.0 {
                x
            } else {
                0.0
            }
        }
        fn drastic_residuum(x: f64, y: f64) -> f64 {
            if x < 1.0 || y == 1.0 {
                1.0
            } else {
                y
            }
        }
        fn drastic_negation(x: f64) -> f64 {
            if x < 1.0 {
                1.0
            } else {
                0.0
            }
        }
        register_logic(Logic::new(
            "Drastic",
            drastic_tnorm,
            drastic_residuum,
            drastic_negation,
        ));
        let l = lookup_logic("drastic").unwrap();
        assert_eq!(l.tnorm(0.5, 0.5), 0.0);
        assert_eq!(l.tnorm(1.0, 0.5), 0.5);
    }
}
