//! Regular n-gon primitives for the float placement stage.
//!
//! Everything here assumes unit edge length. The exact verifier has its own
//! symbolic counterparts in `exact`; these float versions feed the search
//! gates only.

use std::f64::consts::PI;

/// Slack for the approximate emission and distance gates.
///
/// Over-emitting is fine (the verifier rejects later); under-emitting is not,
/// so this must stay positive. Not used anywhere in `exact`.
pub const BUFFER: f64 = 1e-2;

/// Coordinates with magnitude below this are snapped to zero before use.
pub const SNAP_EPS: f64 = 1e-10;

/// Circumradius of a regular n-gon with unit edge length.
#[inline]
pub fn circumradius(gon: usize) -> f64 {
    1.0 / (2.0 * (PI / gon as f64).sin())
}

/// Inradius of a regular n-gon with unit edge length.
#[inline]
pub fn inradius(gon: usize) -> f64 {
    1.0 / (2.0 * (PI / gon as f64).tan())
}

/// Normalise an angle in degrees into [-180, 180].
#[inline]
pub fn normalize_angle(mut deg: f64) -> f64 {
    while deg < -180.0 {
        deg += 360.0;
    }
    while deg > 180.0 {
        deg -= 360.0;
    }
    deg
}

/// Snap float noise below [`SNAP_EPS`] to exactly zero.
#[inline]
pub fn snap(v: f64) -> f64 {
    if v.abs() < SNAP_EPS {
        0.0
    } else {
        v
    }
}

/// Round to six decimal places, half away from zero.
///
/// The stream contract fixes this rounding mode so that re-runs are
/// byte-identical across platforms.
#[inline]
pub fn round6(v: f64) -> f64 {
    let scaled = v * 1e6;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        (scaled - 0.5).ceil()
    };
    rounded / 1e6
}
