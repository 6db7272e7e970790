//! Generalized Extreme Value distribution.
//!
//! ```text
//! F(x) = exp(-(1 + ξ (x - μ) / σ)^(-1/ξ))    ξ != 0
//! F(x) = exp(-exp(-(x - μ) / σ))             ξ == 0 (Gumbel)
//! ```
//!
//! - ξ > 0: Fréchet type, heavy upper tail, support bounded below
//! - ξ = 0: Gumbel type, exponential tail
//! - ξ < 0: Weibull type, support bounded above
//!
//! Evaluation goes through `ln_1p` / `exp_m1` so that the general formulas
//! converge smoothly to the Gumbel ones as ξ approaches zero.

use serde::Serialize;

use crate::{EvtError, block_maxima::BlockMaxima, lmoments::LMoments};

/// Shapes smaller than this in magnitude are evaluated with the Gumbel formulas.
const GUMBEL_SHAPE_TOLERANCE: f64 = 1e-12;

/// Parameters of a GEV distribution.
///
/// The shape uses the sign convention of the CDF above (positive shape means
/// a heavy upper tail).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GevParameters {
    /// Shape ξ.
    pub shape: f64,
    /// Scale σ, always positive.
    pub scale: f64,
    /// Location μ.
    pub location: f64,
}

impl GevParameters {
    /// Validates and builds a parameter set.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeprobe_evt::gev::GevParameters;
    ///
    /// assert!(GevParameters::new(0.1, 2.0, 50.0).is_ok());
    /// assert!(GevParameters::new(0.1, 0.0, 50.0).is_err());
    /// ```
    pub fn new(shape: f64, scale: f64, location: f64) -> Result<Self, EvtError> {
        if !(shape.is_finite() && scale.is_finite() && location.is_finite()) || scale <= 0.0 {
            return Err(EvtError::InvalidFit {
                shape,
                scale,
                location,
            });
        }
        Ok(Self {
            shape,
            scale,
            location,
        })
    }

    /// Whether the shape is close enough to zero for the Gumbel formulas.
    #[must_use]
    pub fn is_gumbel(&self) -> bool {
        self.shape.abs() < GUMBEL_SHAPE_TOLERANCE
    }
}

/// A fitted GEV distribution.
///
/// Fitting is done once; every evaluation afterwards is a cheap pure function
/// of the parameters.
///
/// # Examples
///
/// ```
/// use timeprobe_evt::gev::{GevDistribution, GevParameters};
///
/// let dist = GevDistribution::new(GevParameters::new(0.0, 1.0, 0.0).unwrap());
/// let median = dist.ppf(0.5).unwrap();
/// assert!((dist.cdf(median) - 0.5).abs() < 1e-12);
/// assert_eq!(dist.survival(median), 1.0 - dist.cdf(median));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GevDistribution {
    params: GevParameters,
}

impl GevDistribution {
    /// Wraps already validated parameters.
    #[must_use]
    pub fn new(params: GevParameters) -> Self {
        Self { params }
    }

    /// Fits a GEV distribution to block maxima with the method of L-moments.
    ///
    /// # Errors
    ///
    /// * [`EvtError::InsufficientSampleSize`] - fewer than three maxima
    /// * [`EvtError::DegenerateDistribution`] - all maxima are equal
    /// * [`EvtError::LMomentRatioOutOfRange`] - L-skewness outside `(-1, 1)`
    /// * [`EvtError::InvalidFit`] - the estimates are not a valid GEV
    pub fn fit(maxima: &BlockMaxima) -> Result<Self, EvtError> {
        let lmom = LMoments::from_block_maxima(maxima)?;
        Ok(Self::new(GevParameters::from_lmoments(&lmom)?))
    }

    /// Fitted parameters.
    #[must_use]
    pub fn params(&self) -> &GevParameters {
        &self.params
    }

    /// Support of the distribution as `(lower, upper)`; unbounded ends are infinite.
    #[must_use]
    pub fn support(&self) -> (f64, f64) {
        let GevParameters {
            shape,
            scale,
            location,
        } = self.params;
        if self.params.is_gumbel() {
            (f64::NEG_INFINITY, f64::INFINITY)
        } else if shape > 0.0 {
            (location - scale / shape, f64::INFINITY)
        } else {
            (f64::NEG_INFINITY, location - scale / shape)
        }
    }

    /// Reduced variate `y` with `F(x) = exp(-exp(-y))`.
    ///
    /// Returns `None` outside the support.
    fn reduced_variate(&self, x: f64) -> Option<(f64, f64)> {
        let GevParameters {
            shape,
            scale,
            location,
        } = self.params;
        let z = (x - location) / scale;
        if self.params.is_gumbel() {
            return Some((z, 1.0));
        }
        let kz = shape * z;
        if kz <= -1.0 {
            return None;
        }
        Some((kz.ln_1p() / shape, 1.0 + kz))
    }

    /// Cumulative distribution function.
    ///
    /// Outside the support the result is `0.0` below the lower bound
    /// (ξ > 0) and `1.0` above the upper bound (ξ < 0). This truncation is
    /// the distribution's tail behavior, not an error.
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        match self.reduced_variate(x) {
            Some((y, _)) => (-(-y).exp()).exp(),
            None if self.params.shape > 0.0 => 0.0,
            None => 1.0,
        }
    }

    /// Exceedance probability `P(X >= x) = 1 - F(x)`.
    #[must_use]
    pub fn survival(&self, x: f64) -> f64 {
        1.0 - self.cdf(x)
    }

    /// Probability density function; zero outside the support.
    #[must_use]
    pub fn pdf(&self, x: f64) -> f64 {
        match self.reduced_variate(x) {
            Some((y, t)) => {
                let tail = (-y).exp();
                tail / t * (-tail).exp() / self.params.scale
            }
            None => 0.0,
        }
    }

    /// Quantile function, the inverse of [`cdf`](Self::cdf).
    ///
    /// `p = 0` and `p = 1` map to the lower and upper support bounds, which
    /// are infinite on the unbounded side.
    pub fn ppf(&self, p: f64) -> Result<f64, EvtError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(EvtError::OutOfDomainEvaluation { probability: p });
        }
        Ok(self.quantile_from_log(-p.ln()))
    }

    /// The value whose exceedance probability is `q` (the pWCET at `q`).
    ///
    /// Equivalent to `ppf(1 - q)` but keeps full precision for tiny `q`.
    /// `q` must lie in `(0, 1]`; `q = 1` maps to the lower support bound.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeprobe_evt::gev::{GevDistribution, GevParameters};
    ///
    /// let dist = GevDistribution::new(GevParameters::new(0.0, 1.0, 0.0).unwrap());
    /// let wcet = dist.quantile_at_exceedance(1e-12).unwrap();
    /// assert!((wcet - 27.631).abs() < 1e-3);
    /// ```
    pub fn quantile_at_exceedance(&self, q: f64) -> Result<f64, EvtError> {
        if !(q > 0.0 && q <= 1.0) {
            return Err(EvtError::OutOfDomainEvaluation { probability: q });
        }
        Ok(self.quantile_from_log(-(-q).ln_1p()))
    }

    /// Quantile for `w = -ln(p)`.
    fn quantile_from_log(&self, w: f64) -> f64 {
        let GevParameters {
            shape,
            scale,
            location,
        } = self.params;
        if w == 0.0 {
            return self.support().1;
        }
        if w == f64::INFINITY {
            return self.support().0;
        }
        if self.params.is_gumbel() {
            location - scale * w.ln()
        } else {
            location + scale * (-shape * w.ln()).exp_m1() / shape
        }
    }

    /// [`cdf`](Self::cdf) over a sequence, preserving order and length.
    #[must_use]
    pub fn cdf_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.cdf(x)).collect()
    }

    /// [`survival`](Self::survival) over a sequence, preserving order and length.
    #[must_use]
    pub fn survival_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.survival(x)).collect()
    }

    /// [`ppf`](Self::ppf) over a sequence; fails on the first invalid probability.
    pub fn ppf_many(&self, ps: &[f64]) -> Result<Vec<f64>, EvtError> {
        ps.iter().map(|&p| self.ppf(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(shape: f64, scale: f64, location: f64) -> GevDistribution {
        GevDistribution::new(GevParameters::new(shape, scale, location).unwrap())
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(GevParameters::new(0.0, -1.0, 0.0).is_err());
        assert!(GevParameters::new(f64::NAN, 1.0, 0.0).is_err());
        assert!(GevParameters::new(0.0, 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_gumbel_cdf() {
        let d = dist(0.0, 2.0, 10.0);
        assert!((d.cdf(10.0) - (-1.0_f64).exp()).abs() < 1e-15);
        assert!(d.cdf(-1e6) < 1e-300);
        assert_eq!(d.cdf(1e6), 1.0);
    }

    #[test]
    fn test_support_truncation() {
        // heavy tail: bounded below at 10 - 2 / 0.5 = 6
        let frechet = dist(0.5, 2.0, 10.0);
        assert_eq!(frechet.support(), (6.0, f64::INFINITY));
        assert_eq!(frechet.cdf(5.0), 0.0);
        assert_eq!(frechet.cdf(6.0), 0.0);
        assert_eq!(frechet.pdf(5.0), 0.0);
        assert!(frechet.cdf(6.5) > 0.0);

        // bounded tail: bounded above at 10 + 2 / 0.5 = 14
        let weibull = dist(-0.5, 2.0, 10.0);
        assert_eq!(weibull.support(), (f64::NEG_INFINITY, 14.0));
        assert_eq!(weibull.cdf(14.0), 1.0);
        assert_eq!(weibull.cdf(20.0), 1.0);
        assert_eq!(weibull.survival(20.0), 0.0);
        assert!(weibull.cdf(13.9) < 1.0);
    }

    #[test]
    fn test_cdf_is_monotone() {
        for shape in [-0.4, -0.1, 0.0, 0.1, 0.4] {
            let d = dist(shape, 3.0, 50.0);
            let mut previous = 0.0;
            for i in 0..=400 {
                let x = 20.0 + f64::from(i) * 0.25;
                let value = d.cdf(x);
                assert!(value >= previous, "shape={shape}, x={x}");
                assert!((0.0..=1.0).contains(&value));
                previous = value;
            }
        }
    }

    #[test]
    fn test_ppf_inverts_cdf() {
        for shape in [-0.3, -1e-3, 0.0, 1e-3, 0.3] {
            let d = dist(shape, 4.0, 100.0);
            for x in [92.0, 97.5, 100.0, 104.0, 110.0] {
                let p = d.cdf(x);
                let back = d.ppf(p).unwrap();
                assert!((back - x).abs() < 1e-6, "shape={shape}, x={x}, back={back}");
            }
        }
    }

    #[test]
    fn test_gumbel_limit_matches_general_formula() {
        let gumbel = dist(0.0, 5.0, 40.0);
        for shape in [-1e-6, 1e-6] {
            let near = dist(shape, 5.0, 40.0);
            for x in [20.0, 35.0, 40.0, 50.0, 70.0] {
                assert!((near.cdf(x) - gumbel.cdf(x)).abs() < 1e-4);
            }
            for p in [0.01, 0.25, 0.5, 0.9, 0.99] {
                let a = near.ppf(p).unwrap();
                let b = gumbel.ppf(p).unwrap();
                assert!((a - b).abs() < 1e-4, "p={p}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_ppf_domain() {
        let d = dist(0.1, 1.0, 0.0);
        assert_eq!(
            d.ppf(1.5),
            Err(EvtError::OutOfDomainEvaluation { probability: 1.5 })
        );
        assert!(d.ppf(-0.1).is_err());
        assert!(d.ppf(f64::NAN).is_err());
        assert!(d.ppf_many(&[0.5, 2.0]).is_err());
    }

    #[test]
    fn test_ppf_bounds() {
        let frechet = dist(0.5, 2.0, 10.0);
        assert_eq!(frechet.ppf(0.0).unwrap(), 6.0);
        assert_eq!(frechet.ppf(1.0).unwrap(), f64::INFINITY);

        let weibull = dist(-0.5, 2.0, 10.0);
        assert_eq!(weibull.ppf(0.0).unwrap(), f64::NEG_INFINITY);
        assert_eq!(weibull.ppf(1.0).unwrap(), 14.0);

        let gumbel = dist(0.0, 2.0, 10.0);
        assert_eq!(gumbel.ppf(0.0).unwrap(), f64::NEG_INFINITY);
        assert_eq!(gumbel.ppf(1.0).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_quantile_at_exceedance() {
        let d = dist(0.2, 3.0, 20.0);
        for q in [0.5, 0.1, 1e-3] {
            let a = d.quantile_at_exceedance(q).unwrap();
            let b = d.ppf(1.0 - q).unwrap();
            assert!((a - b).abs() < 1e-8 * b.abs().max(1.0));
            assert!((d.survival(a) - q).abs() < 1e-10);
        }
        let tiny = d.quantile_at_exceedance(1e-15).unwrap();
        assert!(tiny.is_finite());
        assert!(tiny > d.quantile_at_exceedance(1e-9).unwrap());
        assert!(d.quantile_at_exceedance(-1.0).is_err());
        assert_eq!(
            d.quantile_at_exceedance(0.0),
            Err(EvtError::OutOfDomainEvaluation { probability: 0.0 })
        );
        assert!(d.quantile_at_exceedance(f64::NAN).is_err());
        assert_eq!(d.quantile_at_exceedance(1.0), Ok(d.support().0));
    }

    #[test]
    fn test_pdf_matches_cdf_slope() {
        for shape in [-0.2, 0.0, 0.2] {
            let d = dist(shape, 2.0, 5.0);
            let h = 1e-5;
            for x in [2.0, 4.0, 5.0, 7.0, 9.0] {
                let slope = (d.cdf(x + h) - d.cdf(x - h)) / (2.0 * h);
                assert!((d.pdf(x) - slope).abs() < 1e-6, "shape={shape}, x={x}");
            }
        }
    }

    #[test]
    fn test_vector_evaluation_preserves_shape() {
        let d = dist(0.1, 1.0, 0.0);
        let xs = [3.0, -1.0, 0.5];
        let cdf = d.cdf_many(&xs);
        let survival = d.survival_many(&xs);
        assert_eq!(cdf.len(), 3);
        for i in 0..xs.len() {
            assert_eq!(cdf[i], d.cdf(xs[i]));
            assert_eq!(survival[i], 1.0 - cdf[i]);
        }
        let ppf = d.ppf_many(&[0.1, 0.9]).unwrap();
        assert!(ppf[0] < ppf[1]);
    }
}
