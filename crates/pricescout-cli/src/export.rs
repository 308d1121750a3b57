//! Report exporters. JSON carries the whole report; CSV carries the ranked
//! merged listings with the same field names.

use std::path::{Path, PathBuf};

use pricescout_core::{FilteredProduct, Report, ReportSummary};
use serde::Serialize;

const CSV_COLUMNS: [&str; 11] = [
    "site",
    "title",
    "price",
    "price_value",
    "brand",
    "rating",
    "review_count",
    "delivery_info",
    "within_budget",
    "url",
    "image_url",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    #[serde(flatten)]
    report: &'a Report,
    summary: ReportSummary,
}

/// Keep letters, digits, spaces, `-` and `_`, then turn spaces into `_`.
pub(crate) fn safe_term(term: &str) -> String {
    term.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Where to write the export for `term`.
///
/// Without `output` the name is `unified_search_<term>.<ext>`. In a batch
/// run `output` is a stem shared by every query and the term is appended.
pub(crate) fn output_path(
    output: Option<&Path>,
    term: &str,
    format: ExportFormat,
    batch: bool,
) -> PathBuf {
    let ext = format.extension();
    let safe = safe_term(term);
    match output {
        None => PathBuf::from(format!("unified_search_{safe}.{ext}")),
        Some(stem) if batch => {
            let stem = strip_extension(stem, ext);
            PathBuf::from(format!("{}_{safe}.{ext}", stem.display()))
        }
        Some(path) => {
            let stem = strip_extension(path, ext);
            PathBuf::from(format!("{}.{ext}", stem.display()))
        }
    }
}

fn strip_extension(path: &Path, ext: &str) -> PathBuf {
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

pub(crate) fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonExport {
        report,
        summary: report.summary(),
    })
}

pub(crate) fn render_csv(report: &Report) -> String {
    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');
    for item in &report.merged {
        out.push_str(&csv_row(item).join(","));
        out.push('\n');
    }
    out
}

fn csv_row(item: &FilteredProduct) -> Vec<String> {
    let p = &item.product;
    let opt = |value: Option<String>| value.unwrap_or_default();
    [
        p.source.as_str().to_string(),
        p.title.clone(),
        p.price_text.clone(),
        opt(p.price_value.map(|v| v.to_string())),
        opt(p.brand.clone()),
        opt(p.rating.map(|r| format!("{r:.1}"))),
        opt(p.review_count.map(|n| n.to_string())),
        opt(p.delivery_info.clone()),
        item.within_budget.to_string(),
        p.url.clone(),
        opt(p.image_url.clone()),
    ]
    .into_iter()
    .map(|field| csv_escape(&field))
    .collect()
}

/// Quote a field containing a delimiter, quote, or line break.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render `report` in `format` and write it to `path`.
pub(crate) fn write_report(report: &Report, path: &Path, format: ExportFormat) -> anyhow::Result<()> {
    let body = match format {
        ExportFormat::Json => render_json(report)?,
        ExportFormat::Csv => render_csv(report),
    };
    std::fs::write(path, body)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), items = report.merged.len(), "exported report");
    Ok(())
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
