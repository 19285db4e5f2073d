//! 3-vector kinematics.
//!
//! Every function is pure and computes in `f64`. Single-precision inputs are
//! widened component-wise before any arithmetic, so `dot_f32` of two `f32`
//! vectors equals `dot` of their `f64` widenings exactly.
//!
//! Degenerate inputs are not rejected: a zero vector normalizes to NaN
//! components, and `azimuth` of a vector on the z axis is NaN. Downstream
//! histograms drop NaN fills, which is the intended handling.

/// Double-precision 3-vector `[x, y, z]`.
pub type Vec3 = [f64; 3];

/// Single-precision 3-vector as stored by reconstruction outputs.
pub type Vec3f = [f32; 3];

/// Widen a single-precision vector.
#[inline]
pub fn widen(v: Vec3f) -> Vec3 {
    [f64::from(v[0]), f64::from(v[1]), f64::from(v[2])]
}

/// Scalar product.
#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Scalar product of single-precision vectors, evaluated in `f64`.
#[inline]
pub fn dot_f32(a: Vec3f, b: Vec3f) -> f64 {
    dot(widen(a), widen(b))
}

/// Unit vector along `v`. Undefined (NaN) for the zero vector.
#[inline]
pub fn normalize(v: Vec3) -> Vec3 {
    let norm = dot(v, v).sqrt();
    [v[0] / norm, v[1] / norm, v[2] / norm]
}

/// Unit vector along a single-precision `v`, in `f64`.
#[inline]
pub fn normalize_f32(v: Vec3f) -> Vec3 {
    normalize(widen(v))
}

/// Pseudorapidity of a unit direction: `atanh(z)`.
///
/// The argument must already be normalized; `|z| == 1` gives ±inf.
#[inline]
pub fn pseudorapidity(unit: Vec3) -> f64 {
    unit[2].atanh()
}

/// Azimuthal angle in the `asin` convention.
///
/// Returns `asin(y/ρ)` for `x >= 0` and `π - asin(y/ρ)` otherwise, with
/// `ρ = sqrt(x² + y²)`. The range is `[-π/2, 3π/2)`, not the `(-π, π]` of
/// `atan2`; both describe the same direction. For `ρ == 0` the result is NaN.
#[inline]
pub fn azimuth(v: Vec3) -> f64 {
    let rho = (v[0] * v[0] + v[1] * v[1]).sqrt();
    if v[0] >= 0.0 {
        (v[1] / rho).asin()
    } else {
        std::f64::consts::PI - (v[1] / rho).asin()
    }
}

/// Transverse momentum: length of the (x, y) projection.
#[inline]
pub fn transverse(v: Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

/// Unit direction of a helix at the reference point from `φ` and `tan λ`.
#[inline]
pub fn direction_from_track(phi: f64, tan_lambda: f64) -> Vec3 {
    let lambda = tan_lambda.atan();
    [phi.cos() * lambda.cos(), phi.sin() * lambda.cos(), lambda.sin()]
}

/// Opening angle between two unit vectors, `acos(a·b)`.
///
/// Rounding can push the dot product of nearly parallel vectors above 1,
/// yielding NaN; that is left as is.
#[inline]
pub fn opening_angle(a: Vec3, b: Vec3) -> f64 {
    dot(a, b).acos()
}
