//! Q-Q diagnostics for a fitted GEV distribution.
//!
//! Each sorted block maximum is paired with the fitted quantile at its
//! plotting position. A good fit puts the pairs close to the diagonal.

use serde::Serialize;

use crate::{EvtError, block_maxima::BlockMaxima, gev::GevDistribution};

/// Empirical probability assigned to the i-th smallest of n maxima.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, derive_more::FromStr)]
#[serde(rename_all = "snake_case")]
pub enum PlottingPosition {
    /// `i / n`. The largest maximum gets probability 1, whose quantile is
    /// infinite for unbounded distributions.
    Rank,
    /// `i / (n + 1)`.
    #[default]
    Weibull,
    /// `(i - 0.5) / n`.
    Hazen,
    /// `(i - 0.44) / (n + 0.12)`, nearly unbiased for Gumbel quantiles.
    Gringorten,
}

impl PlottingPosition {
    /// Probability for the 1-based `rank` among `n` values.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn probability(self, rank: usize, n: usize) -> f64 {
        debug_assert!((1..=n).contains(&rank));
        let (i, n) = (rank as f64, n as f64);
        match self {
            Self::Rank => i / n,
            Self::Weibull => i / (n + 1.0),
            Self::Hazen => (i - 0.5) / n,
            Self::Gringorten => (i - 0.44) / (n + 0.12),
        }
    }

    /// Probabilities for ranks `1..=n`, ascending.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeprobe_evt::diagnostics::PlottingPosition;
    ///
    /// assert_eq!(PlottingPosition::Rank.probabilities(4), [0.25, 0.5, 0.75, 1.0]);
    /// assert_eq!(PlottingPosition::Weibull.probabilities(3), [0.25, 0.5, 0.75]);
    /// ```
    #[must_use]
    pub fn probabilities(self, n: usize) -> Vec<f64> {
        (1..=n).map(|rank| self.probability(rank, n)).collect()
    }
}

/// How infinite fitted quantiles are replaced in a Q-Q set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfinitePpfPolicy {
    /// `+inf` becomes the largest finite quantile of the set and `-inf`
    /// the smallest. Without any finite quantile the paired maximum is used.
    #[default]
    ClampToFinite,
    /// Every infinite quantile becomes this value, which must be finite.
    Constant(f64),
}

impl InfinitePpfPolicy {
    /// Checks that the policy can only produce finite quantiles.
    ///
    /// # Errors
    ///
    /// Returns [`EvtError::NonFiniteReplacement`] for a `Constant` that is
    /// infinite or NaN.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeprobe_evt::diagnostics::InfinitePpfPolicy;
    ///
    /// assert!(InfinitePpfPolicy::Constant(1.0).validate().is_ok());
    /// assert!(InfinitePpfPolicy::Constant(f64::INFINITY).validate().is_err());
    /// ```
    pub fn validate(self) -> Result<(), EvtError> {
        match self {
            Self::Constant(value) if !value.is_finite() => {
                Err(EvtError::NonFiniteReplacement { value })
            }
            _ => Ok(()),
        }
    }
}

/// One Q-Q pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QqPoint {
    /// Plotting position of the maximum.
    pub percentile: f64,
    /// Fitted quantile at `percentile`, after the infinite-value policy.
    pub ppf: f64,
    /// Observed block maximum.
    pub maximum: f64,
}

/// Fitted quantiles paired with the sorted block maxima.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QqPlot {
    pub plotting_position: PlottingPosition,
    pub infinite_policy: InfinitePpfPolicy,
    pub points: Vec<QqPoint>,
}

impl QqPlot {
    /// Builds the Q-Q set; it has exactly one point per block maximum.
    ///
    /// # Arguments
    ///
    /// * `dist` - Fitted distribution supplying the quantiles
    /// * `maxima` - Observed block maxima, sorted ascending
    /// * `plotting_position` - Empirical probability of each rank
    /// * `infinite_policy` - Replacement for infinite quantiles
    ///
    /// # Errors
    ///
    /// Returns [`EvtError::NonFiniteReplacement`] if `infinite_policy` could
    /// leave a non-finite quantile in the set.
    pub fn new(
        dist: &GevDistribution,
        maxima: &BlockMaxima,
        plotting_position: PlottingPosition,
        infinite_policy: InfinitePpfPolicy,
    ) -> Result<Self, EvtError> {
        infinite_policy.validate()?;
        let percentiles = plotting_position.probabilities(maxima.len());
        let mut quantiles = dist.ppf_many(&percentiles)?;

        let finite = quantiles.iter().copied().filter(|q| q.is_finite());
        let finite_min = finite.clone().reduce(f64::min);
        let finite_max = finite.reduce(f64::max);
        for (q, &maximum) in quantiles.iter_mut().zip(maxima.as_slice()) {
            if q.is_finite() {
                continue;
            }
            *q = match infinite_policy {
                InfinitePpfPolicy::Constant(value) => value,
                InfinitePpfPolicy::ClampToFinite if *q > 0.0 => finite_max.unwrap_or(maximum),
                InfinitePpfPolicy::ClampToFinite => finite_min.unwrap_or(maximum),
            };
        }

        let points = percentiles
            .into_iter()
            .zip(quantiles)
            .zip(maxima.as_slice())
            .map(|((percentile, ppf), &maximum)| QqPoint {
                percentile,
                ppf,
                maximum,
            })
            .collect();

        Ok(Self {
            plotting_position,
            infinite_policy,
            points,
        })
    }

    /// `(ppf, maximum)` pairs in ascending order.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().map(|p| (p.ppf, p.maximum))
    }

    /// Number of pairs, equal to the number of block maxima.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Goodness-of-fit measures of the pairs.
    #[must_use]
    pub fn summary(&self) -> FitSummary {
        FitSummary::from_pairs(self.pairs())
    }
}

/// Numeric goodness-of-fit measures of a Q-Q set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitSummary {
    /// Pearson correlation of fitted quantiles and maxima; `None` when
    /// either column is constant.
    pub correlation: Option<f64>,
    /// Root mean square of `maximum - ppf`.
    pub rmse: f64,
    /// Largest `|maximum - ppf|`.
    pub max_abs_deviation: f64,
}

impl FitSummary {
    #[expect(clippy::cast_precision_loss)]
    fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let pairs = pairs.into_iter().collect::<Vec<_>>();
        if pairs.is_empty() {
            return Self {
                correlation: None,
                rmse: 0.0,
                max_abs_deviation: 0.0,
            };
        }

        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
        let (mut sxy, mut sxx, mut syy, mut sse, mut max_abs) = (0.0, 0.0, 0.0, 0.0, 0.0_f64);
        for &(x, y) in &pairs {
            let (dx, dy) = (x - mean_x, y - mean_y);
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
            sse += (y - x).powi(2);
            max_abs = max_abs.max((y - x).abs());
        }

        let correlation = (sxx > 0.0 && syy > 0.0).then(|| sxy / (sxx * syy).sqrt());
        Self {
            correlation,
            rmse: (sse / n).sqrt(),
            max_abs_deviation: max_abs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::{gev::GevParameters, sample::ExecutionTimeSample};

    fn maxima(values: &[f64]) -> BlockMaxima {
        let sample = ExecutionTimeSample::new(values.iter().copied()).unwrap();
        BlockMaxima::extract(&sample, NonZeroUsize::new(1).unwrap()).unwrap()
    }

    fn gumbel() -> GevDistribution {
        GevDistribution::new(GevParameters::new(0.0, 2.0, 50.0).unwrap())
    }

    #[test]
    fn test_plotting_positions() {
        assert_eq!(PlottingPosition::Hazen.probabilities(2), [0.25, 0.75]);
        let gringorten = PlottingPosition::Gringorten.probabilities(5);
        assert!(gringorten.iter().all(|p| *p > 0.0 && *p < 1.0));
        assert!(gringorten.is_sorted());
    }

    #[test]
    fn test_rank_positions_clamp_to_largest_finite_quantile() {
        let m = maxima(&[48.0, 50.0, 51.5, 53.0]);
        let qq = QqPlot::new(
            &gumbel(),
            &m,
            PlottingPosition::Rank,
            InfinitePpfPolicy::ClampToFinite,
        )
        .unwrap();
        assert_eq!(qq.len(), 4);
        let ppf = qq.points.iter().map(|p| p.ppf).collect::<Vec<_>>();
        assert!(ppf.iter().all(|q| q.is_finite()));
        assert_eq!(ppf[3], ppf[2]);
        assert_eq!(qq.points[3].percentile, 1.0);
    }

    #[test]
    fn test_constant_policy_reproduces_fixed_replacement() {
        let m = maxima(&[48.0, 50.0, 51.5, 53.0]);
        let qq = QqPlot::new(
            &gumbel(),
            &m,
            PlottingPosition::Rank,
            InfinitePpfPolicy::Constant(1.0),
        )
        .unwrap();
        assert_eq!(qq.points[3].ppf, 1.0);
        assert!(qq.points[0].ppf > 1.0);
    }

    #[test]
    fn test_weibull_positions_are_finite() {
        let m = maxima(&[47.0, 49.0, 50.0, 51.0, 52.5, 55.0]);
        let qq = QqPlot::new(
            &gumbel(),
            &m,
            PlottingPosition::Weibull,
            InfinitePpfPolicy::Constant(0.0),
        )
        .unwrap();
        assert!(qq.pairs().all(|(ppf, _)| ppf.is_finite()));
        let maxima_column = qq.pairs().map(|(_, max)| max).collect::<Vec<_>>();
        assert_eq!(maxima_column, m.as_slice());
        assert!(qq.pairs().map(|(ppf, _)| ppf).is_sorted());
    }

    #[test]
    fn test_non_finite_constant_is_rejected() {
        let m = maxima(&[48.0, 50.0, 51.5, 53.0]);
        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let result = QqPlot::new(
                &gumbel(),
                &m,
                PlottingPosition::Rank,
                InfinitePpfPolicy::Constant(value),
            );
            assert!(matches!(
                result,
                Err(EvtError::NonFiniteReplacement { .. })
            ));
        }
    }

    #[test]
    fn test_heavy_tail_with_rank_positions_stays_finite() {
        let m = maxima(&[1.0, 1.0, 1.0, 2.0, 10.0, 40.0]);
        let dist = GevDistribution::fit(&m).unwrap();
        assert!(dist.params().shape > 0.5);
        let qq = QqPlot::new(
            &dist,
            &m,
            PlottingPosition::Rank,
            InfinitePpfPolicy::Constant(100.0),
        )
        .unwrap();
        assert_eq!(qq.points[5].ppf, 100.0);
        assert!(qq.pairs().all(|(ppf, _)| ppf.is_finite()));
    }

    #[test]
    fn test_bounded_distribution_uses_finite_upper_bound() {
        let weibull = GevDistribution::new(GevParameters::new(-0.5, 2.0, 50.0).unwrap());
        let m = maxima(&[49.0, 51.0, 53.0]);
        let qq = QqPlot::new(
            &weibull,
            &m,
            PlottingPosition::Rank,
            InfinitePpfPolicy::Constant(0.0),
        )
        .unwrap();
        assert_eq!(qq.points[2].ppf, 54.0);
    }

    #[test]
    fn test_summary_of_perfect_fit() {
        let dist = gumbel();
        let values = PlottingPosition::Weibull
            .probabilities(9)
            .into_iter()
            .map(|p| dist.ppf(p).unwrap())
            .collect::<Vec<_>>();
        let qq = QqPlot::new(
            &dist,
            &maxima(&values),
            PlottingPosition::Weibull,
            InfinitePpfPolicy::default(),
        )
        .unwrap();
        let summary = qq.summary();
        assert!((summary.correlation.unwrap() - 1.0).abs() < 1e-12);
        assert!(summary.rmse < 1e-9);
        assert!(summary.max_abs_deviation < 1e-9);
    }

    #[test]
    fn test_summary_of_constant_column() {
        let summary = FitSummary::from_pairs([(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]);
        assert_eq!(summary.correlation, None);
        assert_eq!(summary.max_abs_deviation, 4.0);
    }
}
