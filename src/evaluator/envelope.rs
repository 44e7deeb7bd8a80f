//! Temporal interference envelope of two superposed oscillating fields.

pub type Vec3 = [f64; 3];

#[inline(always)]
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline(always)]
pub fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

#[inline(always)]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline(always)]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Field of one channel at an element: `current * (plus - minus)`.
#[inline(always)]
pub fn pair_field(plus: [f32; 3], minus: [f32; 3], current: f64) -> Vec3 {
    [
        (plus[0] as f64 - minus[0] as f64) * current,
        (plus[1] as f64 - minus[1] as f64) * current,
        (plus[2] as f64 - minus[2] as f64) * current,
    ]
}

/// Maximal modulation amplitude over all directions for fields `e1` and `e2`.
pub fn max_ti_amplitude(e1: Vec3, e2: Vec3) -> f64 {
    // Larger field first.
    let (e1, mut e2) = if norm(e2) > norm(e1) { (e2, e1) } else { (e1, e2) };
    if dot(e1, e2) < 0.0 {
        e2 = [-e2[0], -e2[1], -e2[2]];
    }

    let n1 = norm(e1);
    let n2 = norm(e2);
    if n2 == 0.0 {
        return 0.0;
    }

    let cos_alpha = dot(e1, e2) / (n1 * n2);
    if n2 <= n1 * cos_alpha {
        return 2.0 * n2;
    }

    let diff = sub(e1, e2);
    let n_diff = norm(diff);
    if n_diff == 0.0 {
        return 2.0 * n2;
    }
    2.0 * norm(cross(e2, diff)) / n_diff
}
