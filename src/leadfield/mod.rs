pub mod loader;
pub mod region;

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub use self::loader::{load_leadfield, save_leadfield};
pub use self::region::{RegionSelection, RoiSphere};

/// Per-electrode field contributions over the spatial elements of a head model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadfieldMatrix {
    pub electrode_names: Vec<String>,
    /// Electrode the leadfield was computed against; its field is zero everywhere.
    pub reference_electrode: String,
    pub n_elements: usize,
    /// Electrode-major: `field[(electrode * n_elements + element) * 3 + axis]`.
    pub field: Vec<f32>,
    pub barycenters: Vec<[f32; 3]>,
    /// Element volumes (or areas for surface models).
    pub weights: Vec<f32>,
    pub tags: Vec<i32>,
}

impl LeadfieldMatrix {
    pub fn n_electrodes(&self) -> usize {
        self.electrode_names.len()
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        let n_el = self.n_elements;
        let expected = self
            .n_electrodes()
            .checked_mul(n_el)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| LoadError::Shape("field dimensions overflow".to_string()))?;

        if self.field.len() != expected {
            return Err(LoadError::Shape(format!(
                "field has {} values, expected {} electrodes x {} elements x 3 = {}",
                self.field.len(),
                self.n_electrodes(),
                n_el,
                expected
            )));
        }

        for (name, len) in [
            ("barycenters", self.barycenters.len()),
            ("weights", self.weights.len()),
            ("tags", self.tags.len()),
        ] {
            if len != n_el {
                return Err(LoadError::Shape(format!(
                    "{} has {} entries, expected {}",
                    name, len, n_el
                )));
            }
        }

        let mut seen = HashSet::new();
        for name in &self.electrode_names {
            if !seen.insert(name.as_str()) {
                return Err(LoadError::Shape(format!("duplicate electrode '{}'", name)));
            }
        }
        if seen.contains(self.reference_electrode.as_str()) {
            return Err(LoadError::Shape(format!(
                "reference electrode '{}' must not carry a field column",
                self.reference_electrode
            )));
        }

        if let Some(i) = self.weights.iter().position(|w| !w.is_finite() || *w < 0.0) {
            return Err(LoadError::Shape(format!(
                "element {} has invalid weight {}",
                i, self.weights[i]
            )));
        }

        Ok(())
    }
}

/// One electrode's field over all elements.
#[derive(Debug, Clone, Copy)]
pub enum FieldColumn<'a> {
    /// The reference electrode.
    Zero,
    Values(&'a [f32]),
}

impl FieldColumn<'_> {
    #[inline(always)]
    pub fn at(&self, element: usize) -> [f32; 3] {
        match self {
            FieldColumn::Zero => [0.0; 3],
            FieldColumn::Values(v) => {
                let o = element * 3;
                [v[o], v[o + 1], v[o + 2]]
            }
        }
    }
}

/// Read-only owner of the leadfield. Shared by every candidate evaluation.
pub struct LeadfieldStore {
    matrix: LeadfieldMatrix,
    index: HashMap<String, usize>,
}

impl LeadfieldStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::from_matrix(load_leadfield(path)?)
    }

    pub fn from_matrix(matrix: LeadfieldMatrix) -> Result<Self, LoadError> {
        matrix.validate()?;
        let index = matrix
            .electrode_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Ok(Self { matrix, index })
    }

    pub fn matrix(&self) -> &LeadfieldMatrix {
        &self.matrix
    }

    pub fn n_elements(&self) -> usize {
        self.matrix.n_elements
    }

    pub fn weights(&self) -> &[f32] {
        &self.matrix.weights
    }

    pub fn barycenters(&self) -> &[[f32; 3]] {
        &self.matrix.barycenters
    }

    pub fn tags(&self) -> &[i32] {
        &self.matrix.tags
    }

    pub fn reference_electrode(&self) -> &str {
        &self.matrix.reference_electrode
    }

    pub fn contains(&self, name: &str) -> bool {
        name == self.matrix.reference_electrode || self.index.contains_key(name)
    }

    /// Field column of `name`, or `None` when the electrode is unknown.
    pub fn column(&self, name: &str) -> Option<FieldColumn<'_>> {
        if name == self.matrix.reference_electrode {
            return Some(FieldColumn::Zero);
        }
        let &i = self.index.get(name)?;
        let stride = self.matrix.n_elements * 3;
        Some(FieldColumn::Values(
            &self.matrix.field[i * stride..(i + 1) * stride],
        ))
    }
}
