//! Entailment between a basis and its simplified form, and validity of a
//! basis against the context's own object columns.

use galois::{FuzzySet, Incidence, ImplicationSet, Universe};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn planets() -> Incidence {
    let objects = names(&[
        "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto",
    ]);
    let attributes = names(&["small", "medium", "large", "near", "far", "moon", "no_moon"]);
    #[rustfmt::skip]
    let table = [
        1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
        1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
        1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0,
        1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0,
        0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0,
        0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0,
        0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0,
        1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0,
    ];
    Incidence::from_table(objects, attributes, &table).unwrap()
}

/// S5: a basis and its simplified form entail each other, and the
/// simplified form has no redundant rule.
#[test]
fn basis_and_simplified_basis_are_equivalent() {
    let inc = planets();
    let basis = inc.canonical_basis().unwrap().implications;
    let mut simplified = basis.clone();
    simplified
        .apply_rules(&["simplification", "rsimp"])
        .unwrap();

    assert!(basis.entails(&simplified).unwrap());
    assert!(simplified.entails(&basis).unwrap());
    assert!(basis.equivalent_to(&simplified).unwrap());

    // The canonical basis is minimum-cardinality, and the rewrites preserve
    // equivalence, so dropping any single rule must break it.
    for i in 0..simplified.cardinality() {
        let keep: Vec<usize> = (0..simplified.cardinality())
            .filter(|&j| j != i)
            .collect();
        let weakened = ImplicationSet::from_matrices(
            simplified.attributes().to_vec(),
            simplified.lhs().select_cols(&keep),
            simplified.rhs().select_cols(&keep),
        )
        .unwrap();
        assert!(
            !weakened.equivalent_to(&basis).unwrap(),
            "rule {i} is redundant in the simplified basis"
        );
    }
}

/// S6: every object column of a fuzzy context respects every rule of the
/// context's canonical basis.
#[test]
fn object_columns_respect_their_basis() {
    let objects = names(&["o1", "o2", "o3", "o4", "o5", "o6"]);
    let attributes = names(&["a", "b", "c", "d", "e", "f"]);
    #[rustfmt::skip]
    let table = [
        1.0,  0.5,  0.0,  0.25, 1.0,  0.0,
        0.5,  1.0,  0.5,  0.0,  0.75, 0.25,
        0.0,  0.25, 1.0,  0.5,  0.0,  1.0,
        0.25, 0.0,  0.5,  1.0,  0.5,  0.75,
        1.0,  0.75, 0.25, 0.0,  1.0,  0.5,
        0.0,  0.5,  0.75, 1.0,  0.25, 1.0,
    ];
    let inc = Incidence::from_table(objects, attributes, &table).unwrap();
    let basis = inc.canonical_basis().unwrap().implications;

    let columns: Vec<FuzzySet> = (0..inc.n_objects())
        .map(|o| {
            let col = inc.object_col(o);
            let pairs: Vec<(usize, f64)> =
                col.rows.iter().copied().zip(col.vals.iter().copied()).collect();
            FuzzySet::from_pairs(Universe::Attributes, inc.n_attributes(), &pairs).unwrap()
        })
        .collect();

    let verdicts = basis.respects(&columns).unwrap();
    for (o, row) in verdicts.iter().enumerate() {
        assert!(
            row.iter().all(|&v| v),
            "object {o} violates a rule of its own basis"
        );
    }
    // holds_in is the per-rule aggregation of the same check.
    assert!(basis.holds_in(&inc).unwrap().iter().all(|&v| v));
}
