use super::agreement::{AgreementResult, ComparisonConfig, RoundingPolicy};
use super::serialization::csv_line;
use super::similarity::{PixelProbe, SimilarityReport};
use crate::numerics::format_numeric;
use serde::Serialize;

pub const AGREEMENT_CSV_HEADER: [&str; 6] = [
    "kernel_file",
    "serial_file",
    "mismatch_count",
    "similarity_percent",
    "total_cells",
    "median_abs_diff",
];

/// One row of an agreement table: a kernel/serial pair under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementRow {
    pub kernel_file: String,
    pub serial_file: String,
    pub mismatch_count: usize,
    pub similarity_percent: f64,
    pub total_cells: usize,
    pub median_abs_diff: f64,
}

impl AgreementRow {
    pub fn new(
        kernel_file: impl Into<String>,
        serial_file: impl Into<String>,
        result: &AgreementResult,
    ) -> Self {
        Self {
            kernel_file: kernel_file.into(),
            serial_file: serial_file.into(),
            mismatch_count: result.mismatch_count,
            similarity_percent: result.similarity_percent(),
            total_cells: result.total_cells,
            median_abs_diff: result.median_abs_diff,
        }
    }

    fn cells(&self) -> [String; 6] {
        [
            self.kernel_file.clone(),
            self.serial_file.clone(),
            self.mismatch_count.to_string(),
            self.similarity_percent.to_string(),
            self.total_cells.to_string(),
            self.median_abs_diff.to_string(),
        ]
    }
}

/// All rows produced for a single configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementTable {
    pub config: ComparisonConfig,
    pub rows: Vec<AgreementRow>,
}

impl AgreementTable {
    pub fn new(config: ComparisonConfig) -> Self {
        Self {
            config,
            rows: Vec::new(),
        }
    }

    /// `similarity_floor_01_decimal.csv`, `similarity_round_5_units.csv`, ...
    pub fn file_name(&self) -> String {
        format!(
            "similarity_{}_{}.csv",
            self.config.policy,
            precision_tag(self.config.precision)
        )
    }

    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(csv_line(AGREEMENT_CSV_HEADER));
        lines.extend(self.rows.iter().map(|row| csv_line(row.cells())));
        lines.join("\n") + "\n"
    }
}

pub fn precision_tag(precision: f64) -> String {
    if precision == 0.1 {
        return "01_decimal".to_string();
    }
    if precision == 1.0 {
        return "1_unit".to_string();
    }
    if precision.fract() == 0.0 {
        return format!("{}_units", precision);
    }
    format!("{}", precision).replace('.', "")
}

pub fn render_agreement_table(table: &AgreementTable) -> String {
    let mut rows = vec![AGREEMENT_CSV_HEADER.map(str::to_string)];
    rows.extend(table.rows.iter().map(|row| {
        [
            row.kernel_file.clone(),
            row.serial_file.clone(),
            row.mismatch_count.to_string(),
            format!("{:.4}", row.similarity_percent),
            row.total_cells.to_string(),
            format_numeric(row.median_abs_diff),
        ]
    }));

    let mut widths = [0usize; 6];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut lines = vec![format!(
        "Agreement table ({} precision {}):",
        policy_label(table.config.policy),
        table.config.precision
    )];
    for row in &rows {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:>width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line);
    }
    lines.join("\n")
}

fn policy_label(policy: RoundingPolicy) -> &'static str {
    match policy {
        RoundingPolicy::Floor => "FLOOR",
        RoundingPolicy::Round => "ROUND",
    }
}

pub fn render_similarity_report(report: &SimilarityReport) -> String {
    let mut lines = Vec::new();

    match report.probe {
        PixelProbe::InRange {
            row,
            col,
            value_a,
            value_b,
            abs_diff,
            percent_diff,
        } => {
            lines.push(format!(
                "Pixel [{},{}] - Grid A: {:.6}, Grid B: {:.6}",
                row, col, value_a, value_b
            ));
            lines.push(format!("Absolute difference: {:.6}", abs_diff));
            if let Some(percent) = percent_diff {
                lines.push(format!("Percent difference: {:.6}%", percent));
            }
        }
        PixelProbe::OutOfRange { row, col, shape } => {
            lines.push(format!(
                "Pixel [{},{}] is out of range for grid shape {}",
                row, col, shape
            ));
        }
    }

    lines.push(String::new());
    lines.push("Grid statistics:".to_string());
    for (label, statistics) in [("A", &report.statistics_a), ("B", &report.statistics_b)] {
        lines.push(format!(
            "Grid {} - Min: {}, Max: {}, Mean: {}",
            label,
            format_numeric(statistics.min),
            format_numeric(statistics.max),
            format_numeric(statistics.mean)
        ));
    }

    lines.push(String::new());
    if report.discrepancies.is_empty() {
        lines.push(format!(
            "No pixel differs by more than {}",
            report.discrepancy_threshold
        ));
    } else {
        lines.push(format!(
            "First {} pixels differing by more than {}:",
            report.discrepancies.len(),
            report.discrepancy_threshold
        ));
        for discrepancy in &report.discrepancies {
            lines.push(format!(
                "Pixel [{},{}] - Grid A: {:.6}, Grid B: {:.6}, Diff: {:.6}",
                discrepancy.row,
                discrepancy.col,
                discrepancy.value_a,
                discrepancy.value_b,
                discrepancy.abs_diff
            ));
        }
    }

    lines.push(format!(
        "Comparison of values normalized per grid and rounded to {} decimals",
        report.quantization_decimals
    ));
    lines.push(format!("SSIM (simplified): {:.6}", report.ssim));
    lines.push(format!("MAE: {:.6}", report.mae));
    lines.push(format!("MSE: {:.6}", report.mse));
    lines.push(format!("RMSE: {:.6}", report.rmse));
    lines.push(format!("Correlation: {:.6}", report.pearson_correlation));
    lines.push(format!("Mean % diff: {:.6}%", report.mean_percent_diff));
    lines.join("\n")
}
