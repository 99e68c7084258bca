//! Markdown rendering of validation reports.

use super::{cell, ValidationReport};
use std::fmt::Write;

/// Render a report as Markdown.
pub fn to_markdown(report: &ValidationReport) -> String {
    let summary = report.summary();
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", report.title);
    let _ = writeln!(
        out,
        "Generated {} (minimum quality {})\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.min_quality
    );

    out.push_str("## Summary\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    let _ = writeln!(out, "| Total | {} |", summary.total);
    let _ = writeln!(out, "| Passed | {} |", summary.passed);
    let _ = writeln!(out, "| Failed | {} |", summary.failed);
    let _ = writeln!(out, "| Pass rate | {:.1}% |", summary.pass_rate * 100.0);
    if let Some(mean) = summary.mean_score {
        let _ = writeln!(out, "| Mean score | {:.3} |", mean);
    }
    if let Some(mean) = summary.mean_ssim {
        let _ = writeln!(out, "| Mean SSIM | {:.4} |", mean);
    }
    out.push('\n');

    if !report.comparisons.is_empty() {
        out.push_str("## Document comparisons\n\n");
        out.push_str("| Name | Score | Quality | Errors | Warnings | Result |\n");
        out.push_str("|---|---:|---|---:|---:|---|\n");
        for c in &report.comparisons {
            let _ = writeln!(
                out,
                "| {} | {:.3} | {} | {} | {} | {} |",
                cell(&c.name),
                c.result.overall_score,
                c.result.quality,
                c.result.errors().count(),
                c.result.warnings().count(),
                verdict(report.comparison_passed(&c.result))
            );
        }
        out.push('\n');

        for c in report.comparisons.iter().filter(|c| !c.result.issues.is_empty()) {
            let _ = writeln!(out, "### {}\n", c.name);
            for issue in &c.result.issues {
                let _ = writeln!(
                    out,
                    "- **{}** `{}`: {}",
                    issue.severity, issue.path, issue.message
                );
            }
            out.push('\n');
        }
    }

    if !report.visuals.is_empty() {
        out.push_str("## Visual comparisons\n\n");
        out.push_str("| Name | SSIM | Pixel diff | Size | Result |\n");
        out.push_str("|---|---:|---:|---|---|\n");
        for v in &report.visuals {
            let result = match &v.result.failure {
                Some(reason) => format!("FAIL ({})", cell(reason)),
                None => verdict(v.result.passed).to_string(),
            };
            let _ = writeln!(
                out,
                "| {} | {:.4} | {:.2}% | {}x{} | {} |",
                cell(&v.name),
                v.result.ssim_score,
                v.result.pixel_diff_ratio * 100.0,
                v.result.width,
                v.result.height,
                result
            );
        }
        out.push('\n');
    }

    out.trim_end().to_string() + "\n"
}

fn verdict(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}
