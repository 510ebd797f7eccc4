//! The incidence relation and its derivation kernel.
//!
//! An `Incidence` relates objects to attributes with grades in [0,1]. It is
//! stored transposed from the natural table: rows are attributes, one sparse
//! column per object, so an object's attribute vector is a dense-in-column
//! read. The value is immutable after construction; the grade sets and the
//! `is_binary` flag are computed once and can never go stale.
//!
//! The derivation operators form the fuzzy Galois connection:
//!
//! - intent:  `S↑(a) = inf_o (S(o) → I[a,o])`
//! - extent:  `T↓(o) = inf_a (T(a) → I[a,o])`
//! - closure: `cl = ↓∘↑`, a closure operator on fuzzy attribute sets.
//!
//! All three are parameterised by a residuated logic; the `_with` variants
//! take it explicitly, the plain ones snapshot the active logic.

use std::collections::HashMap;

use crate::error::FcaError;
use crate::logic::{current_logic, Logic};
use crate::set::{FuzzySet, Universe};
use crate::sparse::{ColView, SparseMatrix};

/// An immutable fuzzy incidence relation between objects and attributes.
#[derive(Clone, Debug)]
pub struct Incidence {
    objects: Vec<String>,
    attributes: Vec<String>,
    obj_index: HashMap<String, usize>,
    attr_index: HashMap<String, usize>,
    /// Rows = attributes, one column per object.
    matrix: SparseMatrix,
    /// Global grade set G = {0} ∪ {I[a,o]} ∪ {1}, ascending.
    grades: Vec<f64>,
    /// Per-attribute grade sets G_a, each ascending with 0 and 1 included.
    attr_grades: Vec<Vec<f64>>,
    is_binary: bool,
}

impl Incidence {
    /// An incidence with no objects and no attributes. Only construction is
    /// meaningful in this state; derivations fail with `EmptyContext`.
    pub fn empty() -> Self {
        Self::from_table(Vec::new(), Vec::new(), &[]).expect("empty incidence is always valid")
    }

    /// Build from the natural dense table: one row per object, one column
    /// per attribute, `values[o * attributes.len() + a]` in [0,1].
    pub fn from_table(
        objects: Vec<String>,
        attributes: Vec<String>,
        values: &[f64],
    ) -> Result<Self, FcaError> {
        let (n_obj, n_attr) = (objects.len(), attributes.len());
        if values.len() != n_obj * n_attr {
            return Err(FcaError::ShapeMismatch(format!(
                "expected {} values for {} objects x {} attributes, got {}",
                n_obj * n_attr,
                n_obj,
                n_attr,
                values.len()
            )));
        }
        let mut matrix = SparseMatrix::zeros(n_attr);
        for o in 0..n_obj {
            let mut rows = Vec::new();
            let mut vals = Vec::new();
            for a in 0..n_attr {
                let v = values[o * n_attr + a];
                if !(0.0..=1.0).contains(&v) {
                    return Err(FcaError::ShapeMismatch(format!(
                        "incidence value {v} outside [0, 1]"
                    )));
                }
                if v > 0.0 {
                    rows.push(a);
                    vals.push(v);
                }
            }
            matrix.push_col(&rows, &vals);
        }
        Self::from_matrix(objects, attributes, matrix)
    }

    /// Build from raw CSC parts in the internal orientation: rows =
    /// attributes, one column per object.
    pub fn from_csc(
        attributes: Vec<String>,
        objects: Vec<String>,
        p: Vec<usize>,
        i: Vec<usize>,
        x: Vec<f64>,
    ) -> Result<Self, FcaError> {
        if p.len() != objects.len() + 1 {
            return Err(FcaError::ShapeMismatch(format!(
                "expected {} column pointers for {} objects, got {}",
                objects.len() + 1,
                objects.len(),
                p.len()
            )));
        }
        let matrix = SparseMatrix::from_parts(attributes.len(), p, i, x)?;
        Self::from_matrix(objects, attributes, matrix)
    }

    fn from_matrix(
        objects: Vec<String>,
        attributes: Vec<String>,
        matrix: SparseMatrix,
    ) -> Result<Self, FcaError> {
        let obj_index = index_names(&objects, "object")?;
        let attr_index = index_names(&attributes, "attribute")?;

        let n_attr = attributes.len();
        let mut attr_grades: Vec<Vec<f64>> = vec![Vec::new(); n_attr];
        let mut is_binary = true;
        for o in 0..matrix.ncols() {
            for (a, v) in matrix.col(o).iter() {
                attr_grades[a].push(v);
                if v != 1.0 {
                    is_binary = false;
                }
            }
        }
        for g in attr_grades.iter_mut() {
            g.push(0.0);
            g.push(1.0);
            g.sort_by(f64::total_cmp);
            g.dedup();
        }
        let mut grades: Vec<f64> = attr_grades.iter().flatten().copied().collect();
        grades.push(0.0);
        grades.push(1.0);
        grades.sort_by(f64::total_cmp);
        grades.dedup();

        Ok(Self {
            objects,
            attributes,
            obj_index,
            attr_index,
            matrix,
            grades,
            attr_grades,
            is_binary,
        })
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn n_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn n_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// True when every stored grade is 1 (a {0,1} incidence).
    pub fn is_binary(&self) -> bool {
        self.is_binary
    }

    /// Global grade set G, ascending, with 0 and 1 included.
    pub fn grade_set(&self) -> &[f64] {
        &self.grades
    }

    /// Per-attribute grade set G_a: exactly the grades occurring in row `a`,
    /// plus 0 and 1, ascending. These are the only grades Next-Closure ever
    /// assigns to position `a`.
    pub fn attribute_grades(&self, a: usize) -> &[f64] {
        &self.attr_grades[a]
    }

    /// Grade of attribute `a` on object `o`.
    pub fn at(&self, a: usize, o: usize) -> f64 {
        self.matrix.col(o).get(a)
    }

    /// Sparse attribute vector of object `o`.
    pub fn object_col(&self, o: usize) -> ColView<'_> {
        self.matrix.col(o)
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attr_index.get(name).copied()
    }

    pub fn object_index(&self, name: &str) -> Option<usize> {
        self.obj_index.get(name).copied()
    }

    // ========================================================================
    // Set construction helpers
    // ========================================================================

    pub fn empty_attribute_set(&self) -> FuzzySet {
        FuzzySet::empty(Universe::Attributes, self.n_attributes())
    }

    pub fn full_attribute_set(&self) -> FuzzySet {
        FuzzySet::full(Universe::Attributes, self.n_attributes())
    }

    pub fn empty_object_set(&self) -> FuzzySet {
        FuzzySet::empty(Universe::Objects, self.n_objects())
    }

    /// Build an attribute set from (name, grade) pairs.
    pub fn attribute_set(&self, pairs: &[(&str, f64)]) -> Result<FuzzySet, FcaError> {
        let resolved = self.resolve(pairs, &self.attr_index, "attribute")?;
        FuzzySet::from_pairs(Universe::Attributes, self.n_attributes(), &resolved)
    }

    /// Build an object set from (name, grade) pairs.
    pub fn object_set(&self, pairs: &[(&str, f64)]) -> Result<FuzzySet, FcaError> {
        let resolved = self.resolve(pairs, &self.obj_index, "object")?;
        FuzzySet::from_pairs(Universe::Objects, self.n_objects(), &resolved)
    }

    fn resolve(
        &self,
        pairs: &[(&str, f64)],
        index: &HashMap<String, usize>,
        what: &str,
    ) -> Result<Vec<(usize, f64)>, FcaError> {
        pairs
            .iter()
            .map(|&(name, g)| {
                index
                    .get(name)
                    .copied()
                    .map(|idx| (idx, g))
                    .ok_or_else(|| {
                        FcaError::ShapeMismatch(format!("unknown {what} name `{name}`"))
                    })
            })
            .collect()
    }

    // ========================================================================
    // Derivation kernel
    // ========================================================================

    fn ensure_nonempty(&self) -> Result<(), FcaError> {
        if self.n_objects() == 0 || self.n_attributes() == 0 {
            Err(FcaError::EmptyContext(
                "derivation requires at least one object and one attribute".into(),
            ))
        } else {
            Ok(())
        }
    }

    fn check_universe(&self, s: &FuzzySet, expected: Universe) -> Result<(), FcaError> {
        let expected_size = match expected {
            Universe::Objects => self.n_objects(),
            Universe::Attributes => self.n_attributes(),
        };
        if s.universe() != expected {
            return Err(FcaError::ShapeMismatch(format!(
                "expected a set of {expected}, got a set of {}",
                s.universe()
            )));
        }
        if s.universe_size() != expected_size {
            return Err(FcaError::ShapeMismatch(format!(
                "set ranges over {} {expected}, incidence has {expected_size}",
                s.universe_size()
            )));
        }
        Ok(())
    }

    /// Intent of a fuzzy object set under the active logic.
    pub fn intent(&self, s: &FuzzySet) -> Result<FuzzySet, FcaError> {
        self.intent_with(s, &current_logic())
    }

    /// Intent: `S↑(a) = inf_o (S(o) → I[a,o])`.
    pub fn intent_with(&self, s: &FuzzySet, logic: &Logic) -> Result<FuzzySet, FcaError> {
        self.ensure_nonempty()?;
        self.check_universe(s, Universe::Objects)?;
        // Objects outside the support contribute 0 → I[a,o] = 1 and never
        // lower the infimum.
        let mut acc = vec![1.0; self.n_attributes()];
        for (o, g) in s.iter() {
            let col = self.matrix.col(o);
            let mut k = 0;
            for (a, slot) in acc.iter_mut().enumerate() {
                let v = if k < col.rows.len() && col.rows[k] == a {
                    let v = col.vals[k];
                    k += 1;
                    v
                } else {
                    0.0
                };
                let r = logic.residuum(g, v);
                if r < *slot {
                    *slot = r;
                }
            }
        }
        Ok(FuzzySet::from_dense(Universe::Attributes, &acc)
            .expect("residuum output stays in [0,1]"))
    }

    /// Extent of a fuzzy attribute set under the active logic.
    pub fn extent(&self, t: &FuzzySet) -> Result<FuzzySet, FcaError> {
        self.extent_with(t, &current_logic())
    }

    /// Extent: `T↓(o) = inf_a (T(a) → I[a,o])`.
    pub fn extent_with(&self, t: &FuzzySet, logic: &Logic) -> Result<FuzzySet, FcaError> {
        self.ensure_nonempty()?;
        self.check_universe(t, Universe::Attributes)?;
        let mut rows = Vec::new();
        let mut vals = Vec::new();
        for o in 0..self.n_objects() {
            let col = self.matrix.col(o);
            let mut deg: f64 = 1.0;
            let mut k = 0;
            for (a, g) in t.iter() {
                while k < col.rows.len() && col.rows[k] < a {
                    k += 1;
                }
                let v = if k < col.rows.len() && col.rows[k] == a {
                    col.vals[k]
                } else {
                    0.0
                };
                deg = deg.min(logic.residuum(g, v));
                if deg == 0.0 {
                    break;
                }
            }
            if deg > 0.0 {
                rows.push(o);
                vals.push(deg);
            }
        }
        Ok(FuzzySet::from_sorted_unchecked(
            Universe::Objects,
            self.n_objects(),
            rows,
            vals,
        ))
    }

    /// Closure of a fuzzy attribute set: `cl(T) = (T↓)↑`.
    pub fn closure(&self, t: &FuzzySet) -> Result<FuzzySet, FcaError> {
        self.closure_with(t, &current_logic())
    }

    pub fn closure_with(&self, t: &FuzzySet, logic: &Logic) -> Result<FuzzySet, FcaError> {
        let extent = self.extent_with(t, logic)?;
        self.intent_with(&extent, logic)
    }

    // ========================================================================
    // Clarification (binary only)
    // ========================================================================

    /// Merge duplicate object columns and duplicate attribute rows. Merged
    /// names are bracketed: `[small, near]`. Binary incidences only.
    pub fn clarify(&self) -> Result<Incidence, FcaError> {
        if !self.is_binary {
            return Err(FcaError::NotBinary(
                "clarification is defined for {0,1} incidences only".into(),
            ));
        }
        self.ensure_nonempty()?;

        // Dense object rows over attributes, then dedup both axes.
        let table: Vec<Vec<bool>> = (0..self.n_objects())
            .map(|o| {
                let mut row = vec![false; self.n_attributes()];
                for (a, _) in self.matrix.col(o).iter() {
                    row[a] = true;
                }
                row
            })
            .collect();

        let (kept_objs, obj_names) = dedup_axis(&table, &self.objects);
        let transposed: Vec<Vec<bool>> = (0..self.n_attributes())
            .map(|a| kept_objs.iter().map(|&o| table[o][a]).collect())
            .collect();
        let (kept_attrs, attr_names) = dedup_axis(&transposed, &self.attributes);

        let mut values = Vec::with_capacity(kept_objs.len() * kept_attrs.len());
        for &o in &kept_objs {
            for &a in &kept_attrs {
                values.push(if table[o][a] { 1.0 } else { 0.0 });
            }
        }
        Incidence::from_table(obj_names, attr_names, &values)
    }
}

/// Deduplicate rows of a boolean table, merging the names of identical rows
/// into a bracketed list. Returns the kept row indices and their names.
fn dedup_axis(rows: &[Vec<bool>], names: &[String]) -> (Vec<usize>, Vec<String>) {
    let mut kept: Vec<usize> = Vec::new();
    let mut merged: Vec<Vec<&str>> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match kept.iter().position(|&k| rows[k] == *row) {
            Some(pos) => merged[pos].push(&names[idx]),
            None => {
                kept.push(idx);
                merged.push(vec![&names[idx]]);
            }
        }
    }
    let out_names = merged
        .into_iter()
        .map(|group| {
            if group.len() == 1 {
                group[0].to_string()
            } else {
                format!("[{}]", group.join(", "))
            }
        })
        .collect();
    (kept, out_names)
}

fn index_names(names: &[String], what: &str) -> Result<HashMap<String, usize>, FcaError> {
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if index.insert(name.clone(), i).is_some() {
            return Err(FcaError::ShapeMismatch(format!(
                "duplicate {what} name `{name}`"
            )));
        }
    }
    Ok(index)
}

impl std::fmt::Display for Incidence {
    /// The natural cross-table: one row per object.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name_width = self
            .objects
            .iter()
            .map(|s| s.len())
            .max()
            .unwrap_or(0);
        write!(f, "{:name_width$}", "")?;
        for attr in &self.attributes {
            write!(f, " {attr}")?;
        }
        writeln!(f)?;
        for (o, obj) in self.objects.iter().enumerate() {
            write!(f, "{obj:name_width$}")?;
            for (a, attr) in self.attributes.iter().enumerate() {
                let v = self.at(a, o);
                let cell = if v == 0.0 {
                    ".".to_string()
                } else if v == 1.0 {
                    "X".to_string()
                } else {
                    format!("{v}")
                };
                write!(f, " {cell:^width$}", width = attr.len())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
