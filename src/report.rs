use std::fmt::Write;

use crate::analyzer::Analysis;
use crate::models::Metric;

pub const CAPTION: &str = "T-test compares pre vs test period for each metric within each group.";

/// Four decimals; undefined values render as an empty cell.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_nan() => String::new(),
        Some(value) => format!("{value:.4}"),
        None => String::new(),
    }
}

pub fn window_lines(analysis: &Analysis) -> [String; 2] {
    let window = &analysis.window;
    [
        format!(
            "Test Period: {} to {} ({} days)",
            window.test_start, window.test_end, window.test_length
        ),
        format!(
            "Pre-Test Period: {} to {}",
            window.pre_test_start, window.pre_test_end
        ),
    ]
}

/// Plain-text rendering for the terminal.
pub fn build_text(analysis: &Analysis) -> String {
    let mut output = String::new();

    for line in window_lines(analysis) {
        let _ = writeln!(output, "{line}");
    }
    let _ = writeln!(
        output,
        "Rates per {} over {} records.",
        analysis.denominator.column(),
        analysis.pre_test_records + analysis.test_records
    );

    if analysis.is_empty() {
        let _ = writeln!(output, "No records fall in the test or pre-test period.");
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Conversion rates summary:");
    for row in analysis.summary.iter() {
        let cells: Vec<String> = Metric::ALL
            .iter()
            .map(|metric| format!("{} {}", metric, format_value(row.means.get(*metric))))
            .collect();
        let _ = writeln!(
            output,
            "- {} / {} ({} records): {}",
            row.period,
            row.data_set,
            row.record_count,
            cells.join(", ")
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "T-test results (Test vs Pre-Test):");
    if analysis.comparisons.is_empty() {
        let _ = writeln!(
            output,
            "No metric has at least two observations in both periods."
        );
    }
    for result in analysis.comparisons.iter() {
        let _ = writeln!(
            output,
            "- {} {}: t {} p {}{}",
            result.data_set,
            result.metric,
            format_value(Some(result.t_statistic)),
            format_value(Some(result.p_value)),
            if result.significant { " (significant)" } else { "" }
        );
    }

    output
}

pub fn build_report(analysis: &Analysis) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Test vs Control Performance Report");
    let _ = writeln!(
        output,
        "Generated for cohort {} and recency {} (rates per {})",
        analysis.selection.cohort,
        analysis.selection.recency,
        analysis.denominator.column()
    );
    let _ = writeln!(output);
    for line in window_lines(analysis) {
        let _ = writeln!(output, "- {line}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Conversion Rates Summary");

    if analysis.summary.is_empty() {
        let _ = writeln!(output, "No records fall in the test or pre-test period.");
    } else {
        let header: Vec<&str> = Metric::ALL.iter().map(|metric| metric.name()).collect();
        let _ = writeln!(output, "| period | data_set | records | {} |", header.join(" | "));
        let _ = writeln!(output, "|---|---|---:|{}", "---:|".repeat(Metric::ALL.len()));
        for row in analysis.summary.iter() {
            let cells: Vec<String> = Metric::ALL
                .iter()
                .map(|metric| format_value(row.means.get(*metric)))
                .collect();
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                row.period,
                row.data_set,
                row.record_count,
                cells.join(" | ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## T-Test Results (Test vs Pre-Test)");

    if analysis.comparisons.is_empty() {
        let _ = writeln!(
            output,
            "No metric has at least two observations in both periods."
        );
    } else {
        let _ = writeln!(
            output,
            "| Group | Metric | T-Statistic | P-Value | Significant (<0.05) |"
        );
        let _ = writeln!(output, "|---|---|---:|---:|---|");
        for result in analysis.comparisons.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                result.data_set,
                result.metric,
                format_value(Some(result.t_statistic)),
                format_value(Some(result.p_value)),
                if result.significant { "yes" } else { "no" }
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "_{CAPTION}_");

    output
}
