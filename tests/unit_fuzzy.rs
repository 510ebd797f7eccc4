//! Fuzzy scenarios: the 4×4 user/genre context under Łukasiewicz.
//!
//! Grades live on the scale {0, 0.5, 1}, the three-element MV-chain, so
//! Łukasiewicz arithmetic is closed on the grade grid and exact in f64.

use std::cmp::Ordering;

use galois::{lectic_cmp, with_logic, FuzzySet, Incidence, Universe};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Four users rating four genres, every genre carrying a 0.5 somewhere.
fn user_genres() -> Incidence {
    let objects = names(&["u1", "u2", "u3", "u4"]);
    let attributes = names(&["Action", "Comedy", "Drama", "SciFi"]);
    #[rustfmt::skip]
    let table = [
        1.0, 0.5, 0.0, 0.5, // u1
        0.5, 1.0, 0.5, 0.0, // u2
        0.0, 0.5, 1.0, 0.5, // u3
        0.5, 0.0, 0.5, 1.0, // u4
    ];
    Incidence::from_table(objects, attributes, &table).unwrap()
}

#[test]
fn grade_sets_cover_the_chain() {
    let inc = user_genres();
    assert_eq!(inc.grade_set(), &[0.0, 0.5, 1.0]);
    for a in 0..inc.n_attributes() {
        assert_eq!(inc.attribute_grades(a), &[0.0, 0.5, 1.0]);
    }
    assert!(!inc.is_binary());
}

/// Regression fixture: the Łukasiewicz closure of {Action, Drama [0.5]}.
#[test]
fn lukasiewicz_closure_fixture() {
    let inc = user_genres();
    let probe = inc
        .attribute_set(&[("Action", 1.0), ("Drama", 0.5)])
        .unwrap();
    let closed = with_logic("Lukasiewicz", || inc.closure(&probe))
        .unwrap()
        .unwrap();
    assert_eq!(closed.to_dense(), vec![1.0, 0.5, 0.5, 0.5]);
}

#[test]
fn lukasiewicz_enumeration_is_consistent() {
    let inc = user_genres();
    let (concepts_out, basis_out) = with_logic("Lukasiewicz", || {
        (inc.concepts().unwrap(), inc.canonical_basis().unwrap())
    })
    .unwrap();

    // Concepts mode: one accepted set per intent, strictly ascending.
    assert_eq!(concepts_out.closure_count, concepts_out.intents.ncols());
    let n = inc.n_attributes();
    let intent = |m: &galois::sparse::SparseMatrix, j: usize| {
        let (rows, vals) = m.extract(j);
        let pairs: Vec<(usize, f64)> = rows.into_iter().zip(vals).collect();
        FuzzySet::from_pairs(Universe::Attributes, n, &pairs).unwrap()
    };
    for j in 1..concepts_out.intents.ncols() {
        let prev = intent(&concepts_out.intents, j - 1);
        let next = intent(&concepts_out.intents, j);
        assert_eq!(lectic_cmp(&prev, &next), Ordering::Less);
    }

    // Both modes find the same intents.
    assert_eq!(
        concepts_out.intents.ncols(),
        basis_out.intents.ncols()
    );

    // Every rule of the basis is valid in the context...
    let basis = &basis_out.implications;
    assert!(basis.holds_in(&inc).unwrap().iter().all(|&v| v));

    // ...and the basis reproduces the context closure on probe sets.
    with_logic("Lukasiewicz", || {
        for probe in [
            inc.attribute_set(&[("Action", 1.0), ("Drama", 0.5)]).unwrap(),
            inc.attribute_set(&[("Comedy", 0.5)]).unwrap(),
            inc.attribute_set(&[("SciFi", 1.0)]).unwrap(),
            inc.empty_attribute_set(),
        ] {
            let by_basis = basis.closure_of(&probe).unwrap();
            let by_context = inc.closure(&probe).unwrap();
            assert_eq!(by_basis, by_context);
        }
    })
    .unwrap();
}

/// The two logics disagree on this context, so the captured logic matters.
/// Under Łukasiewicz, cl({Action}) keeps Comedy and SciFi at 0.5; under
/// Gödel both drop to 0.
#[test]
fn logics_disagree_on_user_genres() {
    let inc = user_genres();
    let probe = inc.attribute_set(&[("Action", 1.0)]).unwrap();
    let luk = with_logic("Lukasiewicz", || inc.closure(&probe))
        .unwrap()
        .unwrap();
    let godel = with_logic("Godel", || inc.closure(&probe))
        .unwrap()
        .unwrap();
    assert_ne!(luk, godel);
}

/// Product-logic closure on a context with exact ratios.
#[test]
fn product_closure_is_exact_on_simple_ratios() {
    let inc = Incidence::from_table(
        names(&["o1", "o2"]),
        names(&["a", "b"]),
        &[1.0, 0.5, 0.5, 1.0],
    )
    .unwrap();
    let probe = inc.attribute_set(&[("a", 1.0)]).unwrap();
    let closed = with_logic("Product", || inc.closure(&probe))
        .unwrap()
        .unwrap();
    // extent = (1, 0.5); intent: a ↦ min(1→1, 0.5→0.5) = 1,
    // b ↦ min(1→0.5, 0.5→1) = 0.5.
    assert_eq!(closed.to_dense(), vec![1.0, 0.5]);
}
