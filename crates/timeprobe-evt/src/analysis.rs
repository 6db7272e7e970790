//! The end-to-end WCET estimation pipeline.
//!
//! ```text
//! sample -> block maxima -> L-moments -> GEV parameters -> evaluation
//!                                                          ├─ exceedance of the boundary
//!                                                          ├─ pWCET at target probabilities
//!                                                          ├─ Q-Q pairs
//!                                                          └─ CDF / survival curve (optional)
//! ```
//!
//! All inputs come in through [`AnalysisConfig`]; a run keeps no state
//! between calls.

use std::num::NonZeroUsize;

use serde::Serialize;
use tracing::debug;

use crate::{
    EvtError,
    block_maxima::BlockMaxima,
    curve::{Curve, CurveRange, MAX_CURVE_POINTS},
    diagnostics::{FitSummary, InfinitePpfPolicy, PlottingPosition, QqPlot},
    gev::{GevDistribution, GevParameters},
    lmoments::LMoments,
    sample::{ExecutionTimeSample, SampleSummary},
};

/// Measurements per block unless configured otherwise.
pub const DEFAULT_BLOCK_SIZE: NonZeroUsize = NonZeroUsize::new(10).unwrap();
pub const DEFAULT_CURVE_STEP: f64 = 1.0;
/// Exceedance probabilities of the reported pWCET values.
pub const DEFAULT_TARGET_PROBABILITIES: [f64; 5] = [1e-3, 1e-6, 1e-9, 1e-12, 1e-15];

/// Configuration of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Number of consecutive measurements per block.
    pub block_size: NonZeroUsize,
    /// Execution time whose exceedance probability is reported.
    pub boundary: Option<f64>,
    pub plotting_position: PlottingPosition,
    pub infinite_policy: InfinitePpfPolicy,
    /// Whether the report carries the CDF / survival curve.
    pub include_curve: bool,
    /// Spacing of the CDF / survival curve points. Widened for samples
    /// whose curve would exceed [`MAX_CURVE_POINTS`].
    pub curve_step: f64,
    /// Exceedance probabilities at which the pWCET is reported.
    pub target_probabilities: Vec<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            boundary: None,
            plotting_position: PlottingPosition::default(),
            infinite_policy: InfinitePpfPolicy::default(),
            include_curve: true,
            curve_step: DEFAULT_CURVE_STEP,
            target_probabilities: DEFAULT_TARGET_PROBABILITIES.to_vec(),
        }
    }
}

impl AnalysisConfig {
    /// Checks the values that do not depend on the sample.
    ///
    /// # Errors
    ///
    /// * [`EvtError::InvalidBoundary`] - boundary not finite and positive
    /// * [`EvtError::NonFiniteReplacement`] - infinite-quantile constant not finite
    /// * [`EvtError::InvalidCurveRange`] - curve step not finite and positive
    /// * [`EvtError::OutOfDomainEvaluation`] - target probability outside `(0, 1)`
    pub fn validate(&self) -> Result<(), EvtError> {
        if let Some(value) = self.boundary
            && !(value.is_finite() && value > 0.0)
        {
            return Err(EvtError::InvalidBoundary { value });
        }
        self.infinite_policy.validate()?;
        if !(self.curve_step.is_finite() && self.curve_step > 0.0) {
            return Err(EvtError::InvalidCurveRange {
                start: 1.0,
                end: 1.0,
                step: self.curve_step,
            });
        }
        if let Some(&probability) = self
            .target_probabilities
            .iter()
            .find(|p| !(**p > 0.0 && **p < 1.0))
        {
            return Err(EvtError::OutOfDomainEvaluation { probability });
        }
        Ok(())
    }
}

/// Probability of exceeding a boundary execution time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Exceedance {
    pub boundary: f64,
    /// `P(X >= boundary)` under the fitted distribution.
    pub probability: f64,
}

/// Computes `P(X >= boundary)`; `None` when no boundary was requested.
///
/// # Examples
///
/// ```
/// use timeprobe_evt::{
///     analysis::exceedance,
///     gev::{GevDistribution, GevParameters},
/// };
///
/// let dist = GevDistribution::new(GevParameters::new(0.0, 1.0, 10.0).unwrap());
/// assert_eq!(exceedance(&dist, None).unwrap(), None);
/// let e = exceedance(&dist, Some(12.0)).unwrap().unwrap();
/// assert_eq!(e.probability, dist.survival(12.0));
/// assert!(exceedance(&dist, Some(-3.0)).is_err());
/// ```
pub fn exceedance(
    dist: &GevDistribution,
    boundary: Option<f64>,
) -> Result<Option<Exceedance>, EvtError> {
    let Some(boundary) = boundary else {
        return Ok(None);
    };
    if !(boundary.is_finite() && boundary > 0.0) {
        return Err(EvtError::InvalidBoundary { value: boundary });
    }
    Ok(Some(Exceedance {
        boundary,
        probability: dist.survival(boundary),
    }))
}

/// Execution time exceeded with the given probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PwcetEstimate {
    pub exceedance_probability: f64,
    pub execution_time: f64,
}

/// Result of one analysis run.
///
/// `curve` is present only when [`AnalysisConfig::include_curve`] is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WcetReport {
    pub sample: SampleSummary,
    pub block_size: usize,
    pub maxima: SampleSummary,
    pub lmoments: LMoments,
    pub distribution: GevDistribution,
    pub exceedance: Option<Exceedance>,
    pub pwcet: Vec<PwcetEstimate>,
    pub qq: QqPlot,
    pub fit: FitSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<Curve>,
}

impl WcetReport {
    /// Parameters of the fitted distribution.
    #[must_use]
    pub fn params(&self) -> &GevParameters {
        self.distribution.params()
    }
}

/// Runs the full analysis of `sample`.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use timeprobe_evt::{
///     analysis::{AnalysisConfig, analyze},
///     sample::ExecutionTimeSample,
/// };
///
/// let sample = ExecutionTimeSample::new((1..=40).map(|i| f64::from(i % 7 + i / 5))).unwrap();
/// let config = AnalysisConfig {
///     block_size: NonZeroUsize::new(4).unwrap(),
///     boundary: Some(20.0),
///     ..AnalysisConfig::default()
/// };
/// let report = analyze(&sample, &config).unwrap();
/// assert_eq!(report.qq.len(), 10);
/// assert!(report.params().scale > 0.0);
/// ```
pub fn analyze(
    sample: &ExecutionTimeSample,
    config: &AnalysisConfig,
) -> Result<WcetReport, EvtError> {
    config.validate()?;

    let maxima = BlockMaxima::extract(sample, config.block_size)?;
    debug!(
        block_size = config.block_size.get(),
        blocks = maxima.len(),
        "extracted block maxima"
    );

    let lmoments = LMoments::from_block_maxima(&maxima)?;
    let distribution = GevDistribution::new(GevParameters::from_lmoments(&lmoments)?);

    let exceedance = exceedance(&distribution, config.boundary)?;
    let pwcet = config
        .target_probabilities
        .iter()
        .map(|&q| {
            Ok(PwcetEstimate {
                exceedance_probability: q,
                execution_time: distribution.quantile_at_exceedance(q)?,
            })
        })
        .collect::<Result<Vec<_>, EvtError>>()?;

    let qq = QqPlot::new(
        &distribution,
        &maxima,
        config.plotting_position,
        config.infinite_policy,
    )?;
    let fit = qq.summary();
    let curve = if config.include_curve {
        let range = CurveRange::for_sample(sample, config.curve_step)?;
        debug!(step = range.step, end = range.end, "sampling CDF curve");
        Some(Curve::sample(&distribution, &range))
    } else {
        None
    };

    // both summaries exist: extraction rejected empty input
    let summarize = |values: &[f64]| {
        SampleSummary::new(values).ok_or(EvtError::InvalidBlockConfiguration {
            sample_len: sample.len(),
            block_size: config.block_size.get(),
        })
    };

    Ok(WcetReport {
        sample: summarize(sample.as_slice())?,
        block_size: config.block_size.get(),
        maxima: summarize(maxima.as_slice())?,
        lmoments,
        distribution,
        exceedance,
        pwcet,
        qq,
        fit,
        curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_with_maxima(maxima: &[f64], block_size: usize) -> ExecutionTimeSample {
        let values = maxima.iter().enumerate().flat_map(|(block, &max)| {
            (0..block_size).map(move |i| {
                if i == block % block_size {
                    max
                } else {
                    max * 0.5 + f64::from(u32::try_from(i).unwrap())
                }
            })
        });
        ExecutionTimeSample::new(values).unwrap()
    }

    #[test]
    fn test_single_block_is_insufficient() {
        let sample =
            ExecutionTimeSample::new([1.0, 5.0, 3.0, 9.0, 2.0, 7.0, 4.0, 8.0, 6.0, 10.0]).unwrap();
        let maxima = BlockMaxima::extract(&sample, DEFAULT_BLOCK_SIZE).unwrap();
        assert_eq!(maxima.as_slice(), &[10.0]);
        assert_eq!(
            analyze(&sample, &AnalysisConfig::default()),
            Err(EvtError::InsufficientSampleSize {
                count: 1,
                required: 3
            })
        );
    }

    #[test]
    fn test_three_blocks() {
        let sample = sample_with_maxima(&[55.8, 42.1, 61.3], 10);
        assert_eq!(sample.len(), 30);
        let config = AnalysisConfig {
            boundary: Some(1.0),
            ..AnalysisConfig::default()
        };
        let report = analyze(&sample, &config).unwrap();

        assert_eq!(report.maxima.count, 3);
        assert_eq!(report.maxima.min, 42.1);
        assert_eq!(report.maxima.max, 61.3);
        assert!(report.params().scale > 0.0);

        let dist = report.distribution;
        assert!(report.exceedance.unwrap().probability > 0.95);
        assert!(dist.survival(500.0) < 1e-6);
        assert_eq!(report.qq.len(), 3);
        assert_eq!(report.curve.unwrap().points.len(), 62);
    }

    #[test]
    fn test_curve_of_cycle_counts_is_bounded() {
        let sample = sample_with_maxima(&[1.2e9, 1.05e9, 1.31e9], 10);
        let report = analyze(&sample, &AnalysisConfig::default()).unwrap();
        let curve = report.curve.unwrap();
        assert!(curve.points.len() <= MAX_CURVE_POINTS);
        assert!(curve.points.last().unwrap().x > 1.3e9);

        let without_curve = AnalysisConfig {
            include_curve: false,
            ..AnalysisConfig::default()
        };
        let report = analyze(&sample, &without_curve).unwrap();
        assert_eq!(report.curve, None);
        assert_eq!(report.qq.len(), 3);
    }

    #[test]
    fn test_constant_sample_is_degenerate() {
        let sample = ExecutionTimeSample::new([25.0; 50]).unwrap();
        assert!(matches!(
            analyze(&sample, &AnalysisConfig::default()),
            Err(EvtError::DegenerateDistribution { .. })
        ));
    }

    #[test]
    fn test_partial_block() {
        let sample = ExecutionTimeSample::new([1.0; 35]).unwrap();
        assert_eq!(
            analyze(&sample, &AnalysisConfig::default()),
            Err(EvtError::InvalidBlockConfiguration {
                sample_len: 35,
                block_size: 10
            })
        );
    }

    #[test]
    fn test_config_validation() {
        let invalid_boundary = AnalysisConfig {
            boundary: Some(0.0),
            ..AnalysisConfig::default()
        };
        assert_eq!(
            invalid_boundary.validate(),
            Err(EvtError::InvalidBoundary { value: 0.0 })
        );

        let invalid_step = AnalysisConfig {
            curve_step: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(invalid_step.validate().is_err());

        let invalid_policy = AnalysisConfig {
            infinite_policy: InfinitePpfPolicy::Constant(f64::INFINITY),
            ..AnalysisConfig::default()
        };
        assert_eq!(
            invalid_policy.validate(),
            Err(EvtError::NonFiniteReplacement {
                value: f64::INFINITY
            })
        );

        let invalid_target = AnalysisConfig {
            target_probabilities: vec![1e-9, 1.0],
            ..AnalysisConfig::default()
        };
        assert_eq!(
            invalid_target.validate(),
            Err(EvtError::OutOfDomainEvaluation { probability: 1.0 })
        );
    }

    #[test]
    fn test_pwcet_grows_as_probability_shrinks() {
        let sample = sample_with_maxima(&[40.0, 44.5, 47.0, 52.0, 53.5, 58.0, 61.0, 70.0], 5);
        let config = AnalysisConfig {
            block_size: NonZeroUsize::new(5).unwrap(),
            ..AnalysisConfig::default()
        };
        let report = analyze(&sample, &config).unwrap();
        assert_eq!(report.exceedance, None);
        assert_eq!(report.pwcet.len(), DEFAULT_TARGET_PROBABILITIES.len());
        assert!(
            report
                .pwcet
                .windows(2)
                .all(|w| w[0].execution_time <= w[1].execution_time)
        );
        assert!(report.pwcet[0].execution_time > 58.0);
    }
}
