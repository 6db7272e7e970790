use std::{
    io::{self, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use timeprobe_evt::{analysis::WcetReport, curve::Curve, diagnostics::QqPlot};

use crate::util;

#[derive(Debug, Serialize)]
pub(super) struct JsonReport<'a> {
    analyzed_at: DateTime<Utc>,
    input: &'a Path,
    #[serde(flatten)]
    report: &'a WcetReport,
}

impl<'a> JsonReport<'a> {
    pub(super) fn new(input: &'a Path, report: &'a WcetReport) -> Self {
        Self {
            analyzed_at: Utc::now(),
            input,
            report,
        }
    }
}

pub(super) fn write_text<W>(w: &mut W, input: &Path, report: &WcetReport) -> io::Result<()>
where
    W: Write,
{
    let params = report.params();
    let (lower, upper) = report.distribution.support();

    writeln!(w, "WCET Analysis")?;
    writeln!(w, "=============")?;
    writeln!(w)?;
    writeln!(w, "Input:        {}", input.display())?;
    writeln!(
        w,
        "Measurements: {} (min {:.2}, max {:.2}, mean {:.2}, std {:.2})",
        report.sample.count,
        report.sample.min,
        report.sample.max,
        report.sample.mean,
        report.sample.std_dev
    )?;
    writeln!(
        w,
        "Block maxima: {} blocks of {} (min {:.2}, max {:.2})",
        report.maxima.count, report.block_size, report.maxima.min, report.maxima.max
    )?;
    writeln!(w)?;

    writeln!(w, "GEV Fit")?;
    writeln!(w, "-------")?;
    writeln!(
        w,
        "L-moments:    l1={:.4} l2={:.4} l3={:.4} t3={:.4}",
        report.lmoments.l1,
        report.lmoments.l2,
        report.lmoments.l3,
        report.lmoments.tau3()
    )?;
    writeln!(
        w,
        "Parameters:   shape={:.4} scale={:.4} location={:.4}",
        params.shape, params.scale, params.location
    )?;
    let tail = if params.is_gumbel() {
        "Gumbel (light, unbounded upper tail)".to_string()
    } else if upper.is_finite() {
        format!("Weibull (upper tail bounded at {upper:.2})")
    } else {
        format!("Frechet (heavy upper tail, lower bound {lower:.2})")
    };
    writeln!(w, "Tail type:    {tail}")?;
    writeln!(w)?;

    writeln!(w, "Exceedance")?;
    writeln!(w, "----------")?;
    match report.exceedance {
        Some(e) => writeln!(
            w,
            "The probability of exceeding {} is {:e}",
            e.boundary, e.probability
        )?,
        None => writeln!(w, "No boundary given (use --boundary)")?,
    }
    writeln!(w)?;

    if !report.pwcet.is_empty() {
        writeln!(w, "pWCET")?;
        writeln!(w, "-----")?;
        writeln!(w, "{:>14}  {:>16}", "P(exceedance)", "Execution time")?;
        for estimate in &report.pwcet {
            writeln!(
                w,
                "{:>14.0e}  {:>16.2}",
                estimate.exceedance_probability, estimate.execution_time
            )?;
        }
        writeln!(w)?;
    }

    writeln!(w, "Q-Q Diagnostics")?;
    writeln!(w, "---------------")?;
    writeln!(
        w,
        "Plotting position: {}",
        format!("{:?}", report.qq.plotting_position).to_lowercase()
    )?;
    match report.fit.correlation {
        Some(r) => writeln!(w, "Correlation:       {r:.4}")?,
        None => writeln!(w, "Correlation:       undefined")?,
    }
    writeln!(w, "RMSE:              {:.4}", report.fit.rmse)?;
    writeln!(w, "Max deviation:     {:.4}", report.fit.max_abs_deviation)?;
    Ok(())
}

pub(super) fn save_curve_csv(path: &Path, curve: &Curve) -> anyhow::Result<()> {
    let rows = curve
        .points
        .iter()
        .map(|p| format!("{},{},{}", p.x, p.cdf, p.survival));
    util::save_csv(path, "x,cdf,survival", rows)
}

pub(super) fn save_qq_csv(path: &Path, qq: &QqPlot) -> anyhow::Result<()> {
    let rows = qq
        .points
        .iter()
        .map(|p| format!("{},{},{}", p.percentile, p.ppf, p.maximum));
    util::save_csv(path, "percentile,ppf,maximum", rows)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use timeprobe_evt::{
        analysis::{AnalysisConfig, analyze},
        sample::ExecutionTimeSample,
    };

    use super::*;

    fn report() -> WcetReport {
        let sample =
            ExecutionTimeSample::new((0..100).map(|i| f64::from((i * 37) % 101))).unwrap();
        let config = AnalysisConfig {
            block_size: NonZeroUsize::new(10).unwrap(),
            boundary: Some(110.0),
            ..AnalysisConfig::default()
        };
        analyze(&sample, &config).unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        let report = report();
        let mut buf = Vec::new();
        write_text(&mut buf, Path::new("times.csv"), &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Input:        times.csv"));
        assert!(text.contains("The probability of exceeding 110 is"));
        assert!(text.contains("Plotting position: weibull"));
        assert!(text.contains("1e-15"));
    }

    #[test]
    fn test_json_report_fields() {
        let report = report();
        let value = serde_json::to_value(JsonReport::new(Path::new("times.csv"), &report)).unwrap();
        assert_eq!(value["input"], "times.csv");
        assert_eq!(value["block_size"], 10);
        assert_eq!(value["exceedance"]["boundary"], 110.0);
        assert!(value["analyzed_at"].is_string());
        assert_eq!(value["qq"]["points"].as_array().unwrap().len(), 10);
    }
}
