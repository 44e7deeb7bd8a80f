use super::LeadfieldStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiSphere {
    pub center: [f64; 3],
    pub radius: f64,
}

/// Selected element indices with their slice of the global weight array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSelection {
    pub indices: Vec<usize>,
    pub weights: Vec<f32>,
}

impl RegionSelection {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|&w| w as f64).sum()
    }

    fn from_predicate<F>(weights: &[f32], n_elements: usize, mut keep: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let indices: Vec<usize> = (0..n_elements).filter(|&i| keep(i)).collect();
        let weights = indices.iter().map(|&i| weights[i]).collect();
        Self { indices, weights }
    }
}

/// Elements whose barycenter lies within `radius` of `center_point` (boundary inclusive).
pub fn map_sphere(
    centers: &[[f32; 3]],
    weights: &[f32],
    center_point: [f64; 3],
    radius: f64,
) -> RegionSelection {
    let r2 = radius * radius;
    let n = centers.len().min(weights.len());
    RegionSelection::from_predicate(weights, n, |i| {
        let c = centers[i];
        let d2: f64 = (0..3)
            .map(|k| {
                let d = c[k] as f64 - center_point[k];
                d * d
            })
            .sum();
        d2 <= r2
    })
}

/// Elements whose primary tag is one of `target_tags`.
pub fn map_by_tag(tags: &[i32], weights: &[f32], target_tags: &BTreeSet<i32>) -> RegionSelection {
    let n = tags.len().min(weights.len());
    RegionSelection::from_predicate(weights, n, |i| target_tags.contains(&tags[i]))
}

impl LeadfieldStore {
    pub fn select_sphere(&self, roi: &RoiSphere) -> RegionSelection {
        let selection = map_sphere(self.barycenters(), self.weights(), roi.center, roi.radius);
        if selection.is_empty() {
            warn!(
                "⚠️  ROI sphere at {:?} (r = {}) contains no elements",
                roi.center, roi.radius
            );
        } else {
            debug!("ROI: {} elements", selection.len());
        }
        selection
    }

    pub fn select_tags(&self, target_tags: &BTreeSet<i32>) -> RegionSelection {
        let selection = map_by_tag(self.tags(), self.weights(), target_tags);
        if selection.is_empty() {
            warn!("⚠️  Reference tags {:?} match no elements", target_tags);
        } else {
            debug!("Reference region: {} elements", selection.len());
        }
        selection
    }
}
