//! The rewrite system preserves the induced closure operator while never
//! growing the store.


use galois::{FuzzySet, ImplicationSet, Universe};
use generators::arb_binary_incidence;
use proptest::prelude::*;

const REWRITES: [&str; 5] = [
    "reduction",
    "composition",
    "generalization",
    "simplification",
    "rsimp",
];

fn crisp(n: usize, bits: &[bool]) -> FuzzySet {
    let dense: Vec<f64> = bits.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
    FuzzySet::from_dense(Universe::Attributes, &dense).expect("crisp set is valid")
}

/// A random rule set over four attributes.
fn arb_rule_set() -> impl Strategy<Value = ImplicationSet> {
    let rule = (
        proptest::collection::vec(any::<bool>(), 4),
        proptest::collection::vec(any::<bool>(), 4),
    );
    proptest::collection::vec(rule, 1..6).prop_map(|rules| {
        let attributes = (0..4).map(|i| format!("a{i}")).collect();
        let mut set = ImplicationSet::new(attributes);
        for (lhs, rhs) in rules {
            set.add(&crisp(4, &lhs), &crisp(4, &rhs)).unwrap();
        }
        set
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Each rewrite alone preserves logical equivalence and never grows the
    /// store, in rule count or in total attribute mass.
    #[test]
    fn single_rewrites_preserve_equivalence(set in arb_rule_set()) {
        for name in REWRITES {
            let mut rewritten = set.clone();
            rewritten.apply_rules(&[name]).unwrap();
            prop_assert!(
                set.equivalent_to(&rewritten).unwrap(),
                "{name} changed the closure operator"
            );
            prop_assert!(rewritten.cardinality() <= set.cardinality());
            prop_assert!(rewritten.total_size() <= set.total_size() + 1e-9);
        }
    }

    /// The full pipeline preserves equivalence too.
    #[test]
    fn rewrite_pipeline_preserves_equivalence(set in arb_rule_set()) {
        let mut rewritten = set.clone();
        rewritten
            .apply_rules(&["composition", "generalization", "simplification", "rsimp"])
            .unwrap();
        prop_assert!(set.equivalent_to(&rewritten).unwrap());
        prop_assert!(rewritten.cardinality() <= set.cardinality());
    }

    /// Simplifying a canonical basis keeps it equivalent to the original
    /// basis and no larger.
    #[test]
    fn simplified_basis_stays_equivalent(inc in arb_binary_incidence(4, 4)) {
        let out = inc.canonical_basis().unwrap();
        let basis = out.implications;
        let mut simplified = basis.clone();
        simplified.apply_rules(&["simplification"]).unwrap();
        prop_assert!(basis.equivalent_to(&simplified).unwrap());
        prop_assert!(simplified.cardinality() <= basis.cardinality());
        prop_assert!(simplified.total_size() <= basis.total_size() + 1e-9);
    }
}
