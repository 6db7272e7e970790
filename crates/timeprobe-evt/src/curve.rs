//! CDF and survival curves of a fitted distribution, as plot data.

use serde::Serialize;

use crate::{EvtError, gev::GevDistribution, sample::ExecutionTimeSample};

/// Largest number of points a curve may hold.
pub const MAX_CURVE_POINTS: usize = 10_000;

/// Evenly spaced evaluation points `start, start + step, ...` up to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl CurveRange {
    /// Creates a range of evaluation points.
    ///
    /// # Arguments
    ///
    /// * `start` - First evaluation point
    /// * `end` - Last evaluation point (inclusive when it falls on a step)
    /// * `step` - Distance between consecutive points
    ///
    /// # Errors
    ///
    /// Returns [`EvtError::InvalidCurveRange`] if a bound is not finite, the
    /// step is not positive, `end < start`, or the range would hold more
    /// than [`MAX_CURVE_POINTS`] points.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeprobe_evt::curve::CurveRange;
    ///
    /// assert_eq!(CurveRange::new(1.0, 5.0, 0.5).unwrap().points().count(), 9);
    /// assert!(CurveRange::new(1.0, 1e9, 1.0).is_err());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, EvtError> {
        let valid = start.is_finite() && end.is_finite() && step.is_finite();
        if !valid || step <= 0.0 || end < start {
            return Err(EvtError::InvalidCurveRange { start, end, step });
        }
        let intervals = (end - start) / step;
        if intervals > (MAX_CURVE_POINTS - 1) as f64 + 1e-6 {
            return Err(EvtError::InvalidCurveRange { start, end, step });
        }
        Ok(Self { start, end, step })
    }

    /// Range from 1 to the ceiling of the largest execution time.
    ///
    /// `step` is widened when the range would otherwise exceed
    /// [`MAX_CURVE_POINTS`], so samples measured in nanoseconds or cycles
    /// still produce a bounded curve.
    #[expect(clippy::cast_precision_loss)]
    pub fn for_sample(sample: &ExecutionTimeSample, step: f64) -> Result<Self, EvtError> {
        let end = sample.max().ceil().max(1.0);
        let min_step = (end - 1.0) / (MAX_CURVE_POINTS - 1) as f64;
        Self::new(1.0, end, step.max(min_step))
    }

    /// Evaluation points; the end is included when it falls on a step.
    #[expect(clippy::cast_precision_loss)]
    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        // tolerate accumulated rounding so `end` itself is kept
        let slack = self.step * 1e-9;
        (0_usize..)
            .map(|i| self.start + i as f64 * self.step)
            .take_while(move |x| *x <= self.end + slack)
            .take(MAX_CURVE_POINTS)
    }
}

/// One point of the CDF and survival curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    pub cdf: f64,
    pub survival: f64,
}

/// CDF and survival (1 - CDF) of a fitted distribution over a range.
///
/// # Examples
///
/// ```
/// use timeprobe_evt::{
///     curve::{Curve, CurveRange},
///     gev::{GevDistribution, GevParameters},
/// };
///
/// let dist = GevDistribution::new(GevParameters::new(0.1, 2.0, 10.0).unwrap());
/// let curve = Curve::sample(&dist, &CurveRange::new(1.0, 20.0, 1.0).unwrap());
/// assert_eq!(curve.points.len(), 20);
/// assert_eq!(curve.points[19].x, 20.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub points: Vec<CurvePoint>,
}

impl Curve {
    /// Evaluates `dist` at every point of `range`.
    #[must_use]
    pub fn sample(dist: &GevDistribution, range: &CurveRange) -> Self {
        let points = range
            .points()
            .map(|x| {
                let cdf = dist.cdf(x);
                CurvePoint {
                    x,
                    cdf,
                    survival: 1.0 - cdf,
                }
            })
            .collect();
        Self { points }
    }
}
