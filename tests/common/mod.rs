#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tiforge::config::{ElectrodePools, EnumerationPolicy, SearchConfig};
use tiforge::leadfield::{save_leadfield, LeadfieldMatrix, LeadfieldStore};

pub const REFERENCE: &str = "Ref";

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Random leadfield over a 4x4x4 grid of unit-spaced elements.
///
/// Elements with `z < 2` are tagged grey matter (2), the rest white matter (1).
pub fn grid_leadfield(electrodes: &[&str], seed: u64) -> LeadfieldMatrix {
    let mut rng = fastrand::Rng::with_seed(seed);
    let side = 4;
    let n_elements = side * side * side;

    let mut barycenters = Vec::with_capacity(n_elements);
    let mut tags = Vec::with_capacity(n_elements);
    let mut weights = Vec::with_capacity(n_elements);
    for x in 0..side {
        for y in 0..side {
            for z in 0..side {
                barycenters.push([x as f32, y as f32, z as f32]);
                tags.push(if z < 2 { 2 } else { 1 });
                weights.push(0.5 + rng.f32());
            }
        }
    }

    let field = (0..electrodes.len() * n_elements * 3)
        .map(|_| rng.f32() * 2.0 - 1.0)
        .collect();

    LeadfieldMatrix {
        electrode_names: names(electrodes),
        reference_electrode: REFERENCE.to_string(),
        n_elements,
        field,
        barycenters,
        weights,
        tags,
    }
}

/// Four elements on the x axis with hand-picked fields.
///
/// `A` and `B` both carry `(k + 1, 0, 0)` at elements 0..3 and zero at element 3;
/// `C` carries `(0, 1, 0)` everywhere. Tags are `[1, 2, 2, 3]`, weights `[1, 1, 2, 1]`.
pub fn line_leadfield() -> LeadfieldMatrix {
    let along_x = |k: usize| if k < 3 { [(k + 1) as f32, 0.0, 0.0] } else { [0.0; 3] };
    let mut field = Vec::new();
    for k in 0..4 {
        field.extend_from_slice(&along_x(k));
    }
    for k in 0..4 {
        field.extend_from_slice(&along_x(k));
    }
    for _ in 0..4 {
        field.extend_from_slice(&[0.0, 1.0, 0.0]);
    }

    LeadfieldMatrix {
        electrode_names: names(&["A", "B", "C"]),
        reference_electrode: "R".to_string(),
        n_elements: 4,
        field,
        barycenters: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ],
        weights: vec![1.0, 1.0, 2.0, 1.0],
        tags: vec![1, 2, 2, 3],
    }
}

pub fn store(matrix: LeadfieldMatrix) -> LeadfieldStore {
    LeadfieldStore::from_matrix(matrix).expect("valid synthetic leadfield")
}

pub fn write_leadfield(dir: &Path, matrix: &LeadfieldMatrix) -> PathBuf {
    let path = dir.join("leadfield.tilf");
    save_leadfield(&path, matrix).expect("Failed to write leadfield");
    path
}

pub fn bucketed_config(
    plus1: &[&str],
    minus1: &[&str],
    plus2: &[&str],
    minus2: &[&str],
    total: f64,
    step: f64,
) -> SearchConfig {
    SearchConfig {
        pools: ElectrodePools {
            plus1: names(plus1),
            minus1: names(minus1),
            plus2: names(plus2),
            minus2: names(minus2),
        },
        total_current: total,
        current_step: step,
        channel_limit: None,
        policy: EnumerationPolicy::Bucketed,
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
