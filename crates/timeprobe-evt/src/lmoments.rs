//! Sample L-moments estimated from probability-weighted moments.
//!
//! For an ascending sample `x_(1) <= ... <= x_(n)` the unbiased
//! probability-weighted moments are
//!
//! ```text
//! b0 = (1/n) Σ x_(i)
//! b1 = (1/n) Σ (i-1)/(n-1) x_(i)
//! b2 = (1/n) Σ (i-1)(i-2)/((n-1)(n-2)) x_(i)
//! ```
//!
//! and the first three L-moments are `l1 = b0`, `l2 = 2 b1 - b0` and
//! `l3 = 6 b2 - 6 b1 + b0`.

use serde::Serialize;

use crate::{EvtError, block_maxima::BlockMaxima};

/// Number of L-moments needed to fit a three-parameter distribution.
pub const MIN_SAMPLE_SIZE: usize = 3;

/// The first three sample L-moments.
///
/// # Examples
///
/// ```
/// use timeprobe_evt::lmoments::LMoments;
///
/// let lmom = LMoments::from_sorted(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(lmom.l1, 3.0);
/// assert!((lmom.l2 - 1.0).abs() < 1e-12);
/// assert!(lmom.l3.abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LMoments {
    /// L-location (the sample mean).
    pub l1: f64,
    /// L-scale.
    pub l2: f64,
    /// Third L-moment.
    pub l3: f64,
}

impl LMoments {
    /// Computes L-moments of the block maxima.
    ///
    /// # Errors
    ///
    /// Returns [`EvtError::InsufficientSampleSize`] for fewer than
    /// [`MIN_SAMPLE_SIZE`] maxima.
    pub fn from_block_maxima(maxima: &BlockMaxima) -> Result<Self, EvtError> {
        Self::from_sorted(maxima.as_slice())
    }

    /// Computes L-moments of values sorted in ascending order.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    pub fn from_sorted(sorted_values: &[f64]) -> Result<Self, EvtError> {
        debug_assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let count = sorted_values.len();
        if count < MIN_SAMPLE_SIZE {
            return Err(EvtError::InsufficientSampleSize {
                count,
                required: MIN_SAMPLE_SIZE,
            });
        }

        let n = count as f64;
        let (mut b0, mut b1, mut b2) = (0.0, 0.0, 0.0);
        for (i, &x) in sorted_values.iter().enumerate() {
            // zero-based rank, so (i-1) of the 1-based formula is `rank`
            let rank = i as f64;
            b0 += x;
            b1 += rank / (n - 1.0) * x;
            b2 += rank * (rank - 1.0) / ((n - 1.0) * (n - 2.0)) * x;
        }
        b0 /= n;
        b1 /= n;
        b2 /= n;

        Ok(Self {
            l1: b0,
            l2: 2.0 * b1 - b0,
            l3: 6.0 * b2 - 6.0 * b1 + b0,
        })
    }

    /// L-skewness `τ3 = l3 / l2`.
    #[must_use]
    pub fn tau3(&self) -> f64 {
        self.l3 / self.l2
    }

    /// L-coefficient of variation `l2 / l1`.
    #[must_use]
    pub fn lcv(&self) -> f64 {
        self.l2 / self.l1
    }
}
