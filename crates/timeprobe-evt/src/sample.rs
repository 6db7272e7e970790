use serde::Serialize;

use crate::EvtError;

/// Measured execution times of the analyzed program, in measurement order.
///
/// Every value is finite and non-negative. The sample is immutable once
/// constructed.
///
/// # Examples
///
/// ```
/// use timeprobe_evt::sample::ExecutionTimeSample;
///
/// let sample = ExecutionTimeSample::new([3.5, 1.25, 7.0]).unwrap();
/// assert_eq!(sample.len(), 3);
/// assert_eq!(sample.max(), 7.0);
///
/// assert!(ExecutionTimeSample::new([1.0, f64::NAN]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionTimeSample {
    values: Vec<f64>,
}

impl ExecutionTimeSample {
    /// Validates and wraps execution time values.
    ///
    /// An empty sample is accepted here; it is rejected later by block
    /// maxima extraction.
    ///
    /// # Arguments
    ///
    /// * `values` - Execution times in measurement order
    ///
    /// # Errors
    ///
    /// Returns [`EvtError::InvalidSample`] naming the first value that is
    /// negative, infinite or NaN.
    pub fn new<I>(values: I) -> Result<Self, EvtError>
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(EvtError::InvalidSample { index, value });
        }
        Ok(Self { values })
    }

    /// Number of measurements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Measurements in their original order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Largest execution time, or `0.0` for an empty sample.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Descriptive statistics of the sample; `None` when it is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeprobe_evt::sample::ExecutionTimeSample;
    ///
    /// let sample = ExecutionTimeSample::new([2.0, 4.0, 6.0]).unwrap();
    /// let summary = sample.summary().unwrap();
    /// assert_eq!(summary.count, 3);
    /// assert_eq!(summary.mean, 4.0);
    /// ```
    #[must_use]
    pub fn summary(&self) -> Option<SampleSummary> {
        SampleSummary::new(&self.values)
    }
}

/// Basic descriptive statistics of a set of execution times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSummary {
    /// Number of values.
    pub count: usize,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl SampleSummary {
    /// Computes the summary of `values` in any order.
    ///
    /// # Returns
    ///
    /// * `Some(SampleSummary)` - if `values` holds at least one value
    /// * `None` - if `values` is empty
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let n = count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            count,
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        })
    }
}
