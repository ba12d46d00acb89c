use std::fmt::Write as _;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;

use crate::dataset::Dataset;
use crate::doi::CitationResolver;
use crate::error::IltError;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Target directory; defaults to `ilt2report_<timestamp>`.
    pub dir: Option<Utf8PathBuf>,
}

/// Writes one data file per data set plus a `report.txt` with the metadata
/// blocks. Returns the report directory.
///
/// When a resolver is given, each block gets DOI/URL lines resolved from the
/// full citation; a resolution failure is logged and the block is written
/// without them.
pub fn write_report(
    datasets: &[Dataset],
    options: &ReportOptions,
    resolver: Option<&dyn CitationResolver>,
) -> Result<Utf8PathBuf, IltError> {
    let now = Local::now();
    let dir = match &options.dir {
        Some(dir) => dir.clone(),
        None => Utf8PathBuf::from(format!("ilt2report_{}", now.format("%Y-%m-%d_%H:%M:%S"))),
    };
    fs::create_dir(dir.as_std_path())
        .map_err(|err| IltError::Filesystem(format!("create {dir}: {err}")))?;

    let mut report = String::new();
    let _ = writeln!(report, "{}", now.format("%d. %b. %Y (%H:%M:%S)"));
    let _ = writeln!(report, "{}", "-".repeat(24));

    for (index, dataset) in datasets.iter().enumerate() {
        let data_file = format!("ref{index}.dat");
        write_dataset(dataset, &dir.join(&data_file))?;
        tracing::info!(setid = %dataset.setid(), file = %data_file, "wrote data file");

        let _ = writeln!(report, "\nRef. #{index}");
        let _ = writeln!(report, "{}", "=".repeat(10));
        report.push_str(&metadata_block(dataset));

        if let Some(resolver) = resolver {
            if let Some(cite) = dataset.full_cite() {
                match resolver.resolve(&cite) {
                    Ok(found) => {
                        let _ = writeln!(report, "DOI: {} (score: {:.6})", found.doi, found.score);
                        let _ = writeln!(report, "URL: {}", found.url);
                    }
                    Err(err) => {
                        tracing::warn!(setid = %dataset.setid(), error = %err, "DOI resolution failed");
                    }
                }
            }
        }
    }

    let report_path = dir.join("report.txt");
    fs::write(report_path.as_std_path(), report)
        .map_err(|err| IltError::Filesystem(format!("write {report_path}: {err}")))?;
    Ok(dir)
}

/// Human-readable metadata for one data set, one block of the report file.
pub fn metadata_block(dataset: &Dataset) -> String {
    let mut out = String::new();
    let property = dataset
        .title()
        .rsplit(':')
        .next()
        .unwrap_or_default()
        .trim();
    let _ = writeln!(out, "Property:\n  {property}");
    if let (Some(title), Some(full)) = (dataset.reference_title(), dataset.reference_full()) {
        let _ = writeln!(out, "Reference:\n  \"{title}\",\n  {full}");
    }
    let _ = writeln!(out, "Component(s):");
    for (index, name) in dataset.component_names().iter().enumerate() {
        let _ = writeln!(out, "  {}) {name}", index + 1);
    }
    if let Some(method) = dataset.expmeth() {
        let _ = writeln!(out, "Method: {method}");
    }
    let _ = writeln!(out, "Phase(s): {}", dataset.phases().join(", "));
    if let Some(solvent) = dataset.solvent() {
        let _ = writeln!(out, "Solvent: {solvent}");
    }
    let _ = writeln!(out, "Data columns:");
    for (index, description) in dataset.column_descriptions().iter().enumerate() {
        let _ = writeln!(out, "  {}) {description}", index + 1);
    }
    let _ = writeln!(out, "Data points: {}", dataset.points());
    let _ = writeln!(out, "ILT2 setid: {}", dataset.setid());
    out
}

/// Writes the matrix as delimited text: a `# `-prefixed header of the joined
/// column descriptions, then one space-separated line per row in `%+1.8e`
/// formatting.
pub fn write_dataset(dataset: &Dataset, path: &Utf8Path) -> Result<(), IltError> {
    write_dataset_with_header(dataset, path, &dataset.header_line())
}

pub fn write_dataset_with_header(
    dataset: &Dataset,
    path: &Utf8Path,
    header: &str,
) -> Result<(), IltError> {
    let mut out = String::new();
    let _ = writeln!(out, "# {header}");
    for row in dataset.matrix().iter_rows() {
        let line = row
            .iter()
            .map(|value| format_scientific(*value))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{line}");
    }
    fs::write(path.as_std_path(), out)
        .map_err(|err| IltError::Filesystem(format!("write {path}: {err}")))
}

/// `%+1.8e` as numpy renders it: explicit mantissa sign, 8 fractional
/// digits, and a signed two-digit exponent (`+2.98150000e+02`).
pub fn format_scientific(value: f64) -> String {
    let base = format!("{value:+.8e}");
    let Some((mantissa, exponent)) = base.split_once('e') else {
        // inf/NaN carry no exponent
        return base;
    };
    let Ok(exp) = exponent.parse::<i32>() else {
        return base;
    };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}
