//! Measurement-based probabilistic timing analysis with extreme value theory.
//!
//! This crate estimates the probabilistic worst-case execution time (pWCET)
//! of a program from measured execution times:
//!
//! - **Block maxima**: split the sample into fixed-size blocks and keep each maximum
//! - **L-moments**: estimate the first three sample L-moments of the maxima
//! - **GEV fit**: derive shape, scale and location with Hosking's L-moment estimators
//! - **Evaluation**: CDF, quantile, survival (exceedance) and density of the fitted GEV
//! - **Diagnostics**: Q-Q pairs with configurable plotting positions and a fit summary
//!
//! # Modules
//!
//! - [`sample`]: Validated execution time samples
//! - [`block_maxima`]: Block maxima extraction
//! - [`lmoments`]: Sample L-moments from probability-weighted moments
//! - [`fit`]: GEV parameter estimation from L-moments
//! - [`gev`]: GEV parameters and distribution evaluation
//! - [`diagnostics`]: Q-Q pairs and goodness-of-fit summary
//! - [`curve`]: CDF and survival curves for plotting
//! - [`analysis`]: The complete pipeline driven by an explicit configuration
//!
//! # Examples
//!
//! ## Fitting block maxima
//!
//! ```
//! use std::num::NonZeroUsize;
//! use timeprobe_evt::{block_maxima::BlockMaxima, gev::GevDistribution, sample::ExecutionTimeSample};
//!
//! let sample = ExecutionTimeSample::new([
//!     12.0, 15.5, 11.2, 14.1, 13.3, 19.8, 12.9, 13.7, 16.4, 12.2, 13.1, 17.9,
//! ]).unwrap();
//! let maxima = BlockMaxima::extract(&sample, NonZeroUsize::new(3).unwrap()).unwrap();
//! let dist = GevDistribution::fit(&maxima).unwrap();
//!
//! let p = dist.survival(20.0);
//! assert!((0.0..1.0).contains(&p));
//! ```
//!
//! ## Running the whole analysis
//!
//! ```
//! use timeprobe_evt::{
//!     analysis::{AnalysisConfig, analyze},
//!     sample::ExecutionTimeSample,
//! };
//!
//! let sample = ExecutionTimeSample::new((0..100).map(|i| f64::from((i * 37) % 101))).unwrap();
//! let config = AnalysisConfig {
//!     boundary: Some(110.0),
//!     ..AnalysisConfig::default()
//! };
//! let report = analyze(&sample, &config).unwrap();
//! assert_eq!(report.qq.len(), 10);
//! assert!(report.exceedance.unwrap().probability < 0.5);
//! ```

pub use self::error::EvtError;

pub mod analysis;
pub mod block_maxima;
pub mod curve;
pub mod diagnostics;
mod error;
pub mod fit;
pub mod gev;
pub mod lmoments;
pub mod sample;
