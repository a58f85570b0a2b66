//! Named defaults shared by the agreement and similarity engines.
//!
//! Callers override them through `SimilaritySettings` or a comparison plan.

/// Dynamic range `L` used by the simplified SSIM stabilizers.
///
/// This is the 8-bit convention even though the engine feeds SSIM with data
/// normalized to [0, 1]. The mismatch makes `C1`/`C2` dominate the formula and
/// pushes scores toward 1.0.
pub const SSIM_DYNAMIC_RANGE: f64 = 255.0;
pub const SSIM_K1: f64 = 0.01;
pub const SSIM_K2: f64 = 0.03;

/// Guards the min-max denominator of a constant grid.
pub const NORMALIZATION_EPSILON: f64 = 1.0e-10;
pub const NORMALIZED_DECIMALS: i32 = 3;

pub const DISCREPANCY_THRESHOLD: f64 = 0.001;
pub const MAX_REPORTED_DISCREPANCIES: usize = 5;

pub const DEFAULT_PROBE_ROW: usize = 4866;
pub const DEFAULT_PROBE_COL: usize = 3768;

/// Decimals kept by the ROUND policy after scaling by the precision step.
pub const ROUND_POLICY_DECIMALS: i32 = 2;

pub const STANDARD_PRECISIONS: [f64; 3] = [0.1, 1.0, 5.0];

/// Precision whose FLOOR and ROUND tables are echoed after an agreement run.
pub const SUMMARY_PRECISION: f64 = 0.1;

pub fn ssim_c1(dynamic_range: f64, k1: f64) -> f64 {
    (k1 * dynamic_range).powi(2)
}

pub fn ssim_c2(dynamic_range: f64, k2: f64) -> f64 {
    (k2 * dynamic_range).powi(2)
}
