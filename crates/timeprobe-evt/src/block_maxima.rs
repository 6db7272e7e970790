use std::num::NonZeroUsize;

use crate::{EvtError, sample::ExecutionTimeSample};

/// Maxima of contiguous, non-overlapping blocks of a sample, sorted ascending.
///
/// This is the input of the GEV fit in the block maxima method.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use timeprobe_evt::{block_maxima::BlockMaxima, sample::ExecutionTimeSample};
///
/// let sample = ExecutionTimeSample::new([4.0, 9.0, 2.0, 1.0, 3.0, 8.0]).unwrap();
/// let maxima = BlockMaxima::extract(&sample, NonZeroUsize::new(3).unwrap()).unwrap();
/// assert_eq!(maxima.as_slice(), &[8.0, 9.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMaxima {
    block_size: NonZeroUsize,
    sorted_values: Vec<f64>,
}

impl BlockMaxima {
    /// Splits `sample` into blocks of `block_size` values and keeps each block's maximum.
    ///
    /// The sample length must be a positive multiple of `block_size`; a
    /// trailing partial block is never silently dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EvtError::InvalidBlockConfiguration`] for an empty sample or
    /// a length that is not a multiple of `block_size`.
    pub fn extract(
        sample: &ExecutionTimeSample,
        block_size: NonZeroUsize,
    ) -> Result<Self, EvtError> {
        let values = sample.as_slice();
        if values.is_empty() || !values.len().is_multiple_of(block_size.get()) {
            return Err(EvtError::InvalidBlockConfiguration {
                sample_len: values.len(),
                block_size: block_size.get(),
            });
        }

        let mut sorted_values = values
            .chunks_exact(block_size.get())
            .map(|block| block.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect::<Vec<_>>();
        sorted_values.sort_by(f64::total_cmp);

        Ok(Self {
            block_size,
            sorted_values,
        })
    }

    /// Number of measurements each maximum was taken from.
    #[must_use]
    pub fn block_size(&self) -> NonZeroUsize {
        self.block_size
    }

    /// Number of blocks (and maxima).
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted_values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted_values.is_empty()
    }

    /// Maxima sorted in ascending order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.sorted_values
    }

    /// Smallest block maximum; `None` only for an empty set.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.sorted_values.first().copied()
    }

    /// Largest block maximum, the highest observed execution time.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.sorted_values.last().copied()
    }
}
