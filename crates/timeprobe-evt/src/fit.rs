//! GEV parameter estimation by the method of L-moments.
//!
//! The shape is estimated from the L-skewness `τ3` with the rational
//! approximations of Hosking (routine `PELGEV`). They are written in
//! Hosking's sign convention `k = -ξ`; the result is converted to the
//! convention used by [`GevDistribution`](crate::gev::GevDistribution).
//!
//! ```text
//! σ = l2 k / ((1 - 2^-k) Γ(1 + k))       μ = l1 + σ (Γ(1 + k) - 1) / k
//! σ = l2 / ln 2                          μ = l1 - σ γ                   (k -> 0)
//! ```

use std::f64::consts::LN_2;

use statrs::function::gamma::gamma;
use tracing::{debug, warn};

use crate::{EvtError, gev::GevParameters, lmoments::LMoments};

const LN_3: f64 = 1.098_612_288_668_109_8;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Hosking shapes smaller than this use the Gumbel formulas.
const GUMBEL_SHAPE: f64 = 1e-5;
/// Relative L-scale below which the maxima are considered identical.
const DEGENERATE_L2: f64 = 1e-12;

const NEWTON_MAX_ITERATIONS: usize = 20;
const NEWTON_TOLERANCE: f64 = 1e-6;

// -0.8 <= τ3 <= 0
const A: [f64; 5] = [
    0.283_775_30,
    -1.210_963_99,
    -2.507_282_14,
    -1.134_555_66,
    -0.071_380_22,
];
const B: [f64; 3] = [2.061_896_96, 1.319_122_39, 0.250_771_04];
// τ3 > 0
const C: [f64; 3] = [1.599_214_91, -0.488_322_13, 0.015_731_52];
const D: [f64; 2] = [-0.643_639_29, 0.089_852_47];

impl GevParameters {
    /// Estimates GEV parameters from sample L-moments.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeprobe_evt::{gev::GevParameters, lmoments::LMoments};
    ///
    /// let lmom = LMoments::from_sorted(&[42.1, 48.0, 55.8, 61.3, 75.2]).unwrap();
    /// let params = GevParameters::from_lmoments(&lmom).unwrap();
    /// assert!(params.scale > 0.0);
    /// ```
    pub fn from_lmoments(lmom: &LMoments) -> Result<Self, EvtError> {
        let LMoments { l1, l2, .. } = *lmom;
        if l2.is_nan() || l2 <= DEGENERATE_L2 * l1.abs() {
            return Err(EvtError::DegenerateDistribution { l2 });
        }

        let tau3 = lmom.tau3();
        if tau3.is_nan() || tau3.abs() >= 1.0 {
            return Err(EvtError::LMomentRatioOutOfRange { tau3 });
        }

        let k = hosking_shape(tau3);
        let params = if k.abs() < GUMBEL_SHAPE {
            let scale = l2 / LN_2;
            Self::new(0.0, scale, l1 - EULER_GAMMA * scale)
        } else {
            let g = gamma(1.0 + k);
            let scale = l2 * k / (g * -(-k * LN_2).exp_m1());
            Self::new(-k, scale, l1 - scale * (1.0 - g) / k)
        }?;

        debug!(?lmom, tau3, ?params, "fitted GEV parameters");
        Ok(params)
    }
}

/// Shape `k` (Hosking's convention) whose GEV has L-skewness `tau3`.
fn hosking_shape(tau3: f64) -> f64 {
    if tau3 > 0.0 {
        let z = 1.0 - tau3;
        return (-1.0 + z * (C[0] + z * (C[1] + z * C[2]))) / (1.0 + z * (D[0] + z * D[1]));
    }

    let t = tau3;
    let approx = (A[0] + t * (A[1] + t * (A[2] + t * (A[3] + t * A[4]))))
        / (1.0 + t * (B[0] + t * (B[1] + t * B[2])));
    if tau3 >= -0.8 {
        return approx;
    }

    let initial = if tau3 <= -0.97 {
        1.0 - (1.0 + tau3).ln() / LN_2
    } else {
        approx
    };
    refine_shape(tau3, initial)
}

/// Newton-Raphson on `(1 - 3^-k) / (1 - 2^-k) = (τ3 + 3) / 2`.
fn refine_shape(tau3: f64, initial: f64) -> f64 {
    let target = (tau3 + 3.0) * 0.5;
    let mut k = initial;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let x2 = (-k * LN_2).exp();
        let x3 = (-k * LN_3).exp();
        let xx2 = 1.0 - x2;
        let xx3 = 1.0 - x3;
        let ratio = xx3 / xx2;
        let slope = (xx2 * x3 * LN_3 - xx3 * x2 * LN_2) / (xx2 * xx2);
        let previous = k;
        k -= (ratio - target) / slope;
        if (k - previous).abs() <= NEWTON_TOLERANCE * k {
            return k;
        }
    }
    warn!(tau3, shape = k, "GEV shape iteration did not converge");
    k
}

/// L-skewness of a GEV distribution with the given shape ξ.
///
/// This is the exact relation the shape estimator approximates:
/// `τ3 = 2 (1 - 3^ξ) / (1 - 2^ξ) - 3`, with the Gumbel limit
/// `2 ln 3 / ln 2 - 3` at ξ = 0. Defined for ξ < 1.
///
/// # Examples
///
/// ```
/// use timeprobe_evt::fit::gev_tau3;
///
/// assert!((gev_tau3(0.0) - 0.169_925).abs() < 1e-6);
/// assert!(gev_tau3(0.2) > gev_tau3(0.0));
/// ```
#[must_use]
pub fn gev_tau3(shape: f64) -> f64 {
    if shape == 0.0 {
        return 2.0 * LN_3 / LN_2 - 3.0;
    }
    2.0 * (shape * LN_3).exp_m1() / (shape * LN_2).exp_m1() - 3.0
}
