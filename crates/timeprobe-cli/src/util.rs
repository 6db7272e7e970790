use std::{
    fmt::Write as _,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, bail};
use tracing::warn;

/// Destination of a command's output: a file, or stdout when no path is given.
pub struct Output {
    writer: Box<dyn Write>,
    target: String,
}

impl Output {
    /// Creates `path`, or locks stdout when `path` is `None`.
    pub fn create(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                writer: Box::new(io::stdout().lock()),
                target: "stdout".to_owned(),
            });
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            target: path.display().to_string(),
        })
    }

    /// Human-readable name of the destination for messages.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Writes `value` as pretty-printed JSON with a trailing newline.
    pub fn write_json<T>(mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        serde_json::to_writer_pretty(&mut self.writer, value)
            .with_context(|| format!("Failed to write JSON to {}", self.target))?;
        self.writer
            .write_all(b"\n")
            .with_context(|| format!("Failed to write JSON to {}", self.target))?;
        self.finish()
    }

    /// Flushes buffered output.
    pub fn finish(mut self) -> anyhow::Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush output to {}", self.target))
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Read execution times from a CSV file
///
/// The last non-empty row holds the comma-separated execution times; earlier
/// rows are ignored. Values are rounded to two decimal places.
///
/// # Errors
///
/// Returns error if the file cannot be read or a field is not a number
pub fn read_execution_times<P>(path: P) -> anyhow::Result<Vec<f64>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read execution times file: {}", path.display()))?;
    parse_execution_times(&content)
        .with_context(|| format!("Failed to parse execution times file: {}", path.display()))
}

fn parse_execution_times(content: &str) -> anyhow::Result<Vec<f64>> {
    let rows = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    let Some((row, ignored)) = rows.split_last() else {
        bail!("no execution times found");
    };
    if !ignored.is_empty() {
        warn!(
            ignored_rows = ignored.len(),
            "input has several rows; only the last row of execution times is used"
        );
    }

    row.split(',')
        .map(|field| field.trim().trim_matches('"'))
        .enumerate()
        // tolerate a trailing comma
        .filter(|(_, field)| !field.is_empty())
        .map(|(column, field)| {
            let value = field
                .parse::<f64>()
                .with_context(|| format!("column {}: `{field}` is not a number", column + 1))?;
            Ok(round_to_hundredths(value))
        })
        .collect()
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Write CSV rows with a header line to `path`
pub fn save_csv<I>(path: &Path, header: &str, rows: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = String>,
{
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    let mut csv_content = format!("{header}\n");
    for row in rows {
        writeln!(&mut csv_content, "{row}").context("Failed to format CSV row")?;
    }
    fs::write(path, csv_content)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}
