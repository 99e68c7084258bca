//! Plain text rendering of validation reports.

use super::ValidationReport;
use std::fmt::Write;

/// Render a report as plain text.
pub fn to_text(report: &ValidationReport) -> String {
    let summary = report.summary();
    let mut out = String::new();

    let _ = writeln!(out, "{}", report.title);
    let _ = writeln!(out, "{}", "=".repeat(report.title.chars().count()));
    let _ = writeln!(
        out,
        "{} passed, {} failed of {} ({:.1}%)",
        summary.passed,
        summary.failed,
        summary.total,
        summary.pass_rate * 100.0
    );
    if let Some(mean) = summary.mean_score {
        let _ = writeln!(out, "mean score {:.3}", mean);
    }

    for c in &report.comparisons {
        let status = if report.comparison_passed(&c.result) {
            "ok"
        } else {
            "FAILED"
        };
        let _ = writeln!(
            out,
            "\n{}: {:.3} {} [{}]",
            c.name, c.result.overall_score, c.result.quality, status
        );
        for issue in &c.result.issues {
            let _ = writeln!(out, "  {}", issue);
        }
    }

    for v in &report.visuals {
        let status = if v.result.passed { "ok" } else { "FAILED" };
        let _ = write!(
            out,
            "\n{}: ssim {:.4}, {:.2}% pixels differ [{}]",
            v.name,
            v.result.ssim_score,
            v.result.pixel_diff_ratio * 100.0,
            status
        );
        if let Some(reason) = &v.result.failure {
            let _ = write!(out, " ({})", reason);
        }
        out.push('\n');
    }

    out
}
