//! Console summary printed after each query.

use std::fmt::Write as _;

use pricescout_core::Report;
use rust_decimal::Decimal;

const RULE_WIDTH: usize = 80;
const TOP_LISTINGS: usize = 10;

fn fmt_price(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.round_dp(2).normalize().to_string())
}

/// Render the per-source table, top merged listings, and price statistics.
pub(crate) fn render(report: &Report) -> String {
    let summary = report.summary();
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let budget = report
        .query
        .max_price()
        .map(|max| format!(" (max {})", fmt_price(Some(max))))
        .unwrap_or_default();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "SEARCH SUMMARY: {}{budget}", report.query.term());
    let _ = writeln!(out, "{rule}");

    let _ = writeln!(out, "{:<14}{:<10}STATUS", "SOURCE", "PRODUCTS");
    for (source, stats) in &summary.per_source {
        let status = stats
            .error
            .as_ref()
            .map_or_else(|| "ok".to_string(), ToString::to_string);
        let _ = writeln!(
            out,
            "{:<14}{:<10}{}",
            source.display_name(),
            stats.product_count,
            status
        );
    }

    if !report.merged.is_empty() {
        let _ = writeln!(out);
        for (rank, item) in report.merged.iter().take(TOP_LISTINGS).enumerate() {
            let p = &item.product;
            let budget_note = match (item.within_budget, item.savings) {
                (true, Some(savings)) => format!("  [within budget, {} under]", fmt_price(Some(savings))),
                (true, None) => String::new(),
                (false, _) => "  [price unknown]".to_string(),
            };
            let _ = writeln!(
                out,
                "{:>3}. {:<16}{:<12}{}{budget_note}",
                rank + 1,
                p.price_text,
                p.source.display_name(),
                p.title
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "merged listings: {} ({} within budget, {} duplicates removed)",
        summary.merged_count,
        summary.within_budget_count,
        report.duplicates.len()
    );
    let _ = writeln!(
        out,
        "price min {} / median {} / max {}",
        fmt_price(summary.min_price),
        fmt_price(summary.median_price),
        fmt_price(summary.max_price)
    );
    out
}
