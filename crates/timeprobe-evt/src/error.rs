/// Errors raised by the estimation pipeline.
///
/// Every variant carries the offending values so that callers can report a
/// human-readable cause. None of them are retryable: the same input always
/// produces the same error.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum EvtError {
    #[display(
        "sample of {sample_len} values cannot be split into blocks of {block_size} (length must be a positive multiple of the block size)"
    )]
    InvalidBlockConfiguration { sample_len: usize, block_size: usize },
    #[display("{count} block maxima available, at least {required} are needed to fit a GEV")]
    InsufficientSampleSize { count: usize, required: usize },
    #[display("block maxima have no dispersion (l2 = {l2})")]
    DegenerateDistribution { l2: f64 },
    #[display("L-skewness {tau3} is outside (-1, 1)")]
    LMomentRatioOutOfRange { tau3: f64 },
    #[display("fitted parameters are not a valid GEV (shape={shape}, scale={scale}, location={location})")]
    InvalidFit {
        shape: f64,
        scale: f64,
        location: f64,
    },
    #[display("probability {probability} is outside [0, 1]")]
    OutOfDomainEvaluation { probability: f64 },
    #[display("execution time #{index} is not a finite non-negative number: {value}")]
    InvalidSample { index: usize, value: f64 },
    #[display("boundary value must be a finite positive number, got {value}")]
    InvalidBoundary { value: f64 },
    #[display("replacement for infinite quantiles must be finite, got {value}")]
    NonFiniteReplacement { value: f64 },
    #[display("invalid curve range: start={start}, end={end}, step={step}")]
    InvalidCurveRange { start: f64, end: f64, step: f64 },
}
