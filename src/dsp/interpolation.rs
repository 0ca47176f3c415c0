//! Interpolation curves between two keyframe values.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Shape of the curve between two adjacent keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Quarter-cosine ease-in: slow start, fast finish.
    Cosine,
}

impl Interpolation {
    /// Interpolate at progress `t` in [0, 1] from `v0` to `v1`.
    pub fn apply(self, t: f64, v0: f64, v1: f64) -> f64 {
        match self {
            Interpolation::Linear => linear(t, v0, v1),
            Interpolation::Cosine => cosine(t, v0, v1),
        }
    }
}

pub fn linear(t: f64, v0: f64, v1: f64) -> f64 {
    v0 + t * (v1 - v0)
}

pub fn cosine(t: f64, v0: f64, v1: f64) -> f64 {
    linear(1.0 - (t * PI * 0.5).cos(), v0, v1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_midpoint() {
        assert!((linear(0.5, 400.0, 500.0) - 450.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_hits_endpoints() {
        assert!((cosine(0.0, 2.0, 8.0) - 2.0).abs() < 1e-12);
        assert!((cosine(1.0, 2.0, 8.0) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_eases_in() {
        // Early progress lags behind the straight line.
        let c = Interpolation::Cosine.apply(0.25, 0.0, 1.0);
        let l = Interpolation::Linear.apply(0.25, 0.0, 1.0);
        assert!(c < l, "cosine {c} should trail linear {l} early on");
    }
}
