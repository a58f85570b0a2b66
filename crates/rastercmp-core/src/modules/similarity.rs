//! Normalized similarity metrics between two grids.
//!
//! Each grid is min-max normalized against its *own* range, rounded to a fixed
//! number of decimals, and every metric is taken from those derived grids.
//! Because the ranges are independent, a constant offset or gain between the
//! two sources disappears from the metrics; compare raw values with
//! [`crate::modules::agreement`] when that matters.
//!
//! The simplified SSIM treats the whole grid as a single window and uses the
//! 8-bit dynamic range `L = 255` on [0, 1] data (see
//! [`crate::common::constants::SSIM_DYNAMIC_RANGE`]).
//!
//! Metrics only use cells where both derived values are finite. Degenerate
//! inputs map to fixed values instead of errors:
//!
//! | metric | case | value |
//! | --- | --- | --- |
//! | `ssim`, `mae`, `mse`, `rmse`, `pearson_correlation` | no finite pair | `0.0` |
//! | `pearson_correlation` | a zero variance | `1.0` if the grids agree everywhere, else `0.0` |
//! | `mean_percent_diff` | grid A has no non-zero cell | `0.0` |
//! | `GridStatistics` | all-NaN grid | NaN |

use crate::common::constants::{
    DEFAULT_PROBE_COL, DEFAULT_PROBE_ROW, DISCREPANCY_THRESHOLD, MAX_REPORTED_DISCREPANCIES,
    NORMALIZATION_EPSILON, NORMALIZED_DECIMALS, SSIM_DYNAMIC_RANGE, SSIM_K1, SSIM_K2, ssim_c1,
    ssim_c2,
};
use crate::domain::{CompareError, CompareResult, Grid, GridShape, ensure_same_shape};
use crate::numerics::{mean, round_to_decimals};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilaritySettings {
    pub ssim_dynamic_range: f64,
    pub ssim_k1: f64,
    pub ssim_k2: f64,
    pub normalization_epsilon: f64,
    pub quantization_decimals: i32,
    pub discrepancy_threshold: f64,
    pub max_discrepancies: usize,
}

impl Default for SimilaritySettings {
    fn default() -> Self {
        Self {
            ssim_dynamic_range: SSIM_DYNAMIC_RANGE,
            ssim_k1: SSIM_K1,
            ssim_k2: SSIM_K2,
            normalization_epsilon: NORMALIZATION_EPSILON,
            quantization_decimals: NORMALIZED_DECIMALS,
            discrepancy_threshold: DISCREPANCY_THRESHOLD,
            max_discrepancies: MAX_REPORTED_DISCREPANCIES,
        }
    }
}

impl SimilaritySettings {
    pub fn validate(&self) -> CompareResult<()> {
        let checks = [
            (
                self.ssim_dynamic_range.is_finite() && self.ssim_dynamic_range > 0.0,
                "ssimDynamicRange must be a finite positive number",
            ),
            (
                self.ssim_k1.is_finite() && self.ssim_k1 >= 0.0,
                "ssimK1 must be a finite non-negative number",
            ),
            (
                self.ssim_k2.is_finite() && self.ssim_k2 >= 0.0,
                "ssimK2 must be a finite non-negative number",
            ),
            (
                self.normalization_epsilon.is_finite() && self.normalization_epsilon >= 0.0,
                "normalizationEpsilon must be a finite non-negative number",
            ),
            (
                (0..=15).contains(&self.quantization_decimals),
                "quantizationDecimals must be between 0 and 15",
            ),
            (
                self.discrepancy_threshold.is_finite() && self.discrepancy_threshold >= 0.0,
                "discrepancyThreshold must be a finite non-negative number",
            ),
        ];

        match checks.iter().find(|(valid, _)| !valid) {
            Some((_, message)) => Err(CompareError::input_validation(
                "INPUT.INVALID_SETTINGS",
                *message,
            )),
            None => Ok(()),
        }
    }

    pub fn c1(&self) -> f64 {
        ssim_c1(self.ssim_dynamic_range, self.ssim_k1)
    }

    pub fn c2(&self) -> f64 {
        ssim_c2(self.ssim_dynamic_range, self.ssim_k2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Discrepancy {
    pub row: usize,
    pub col: usize,
    pub value_a: f64,
    pub value_b: f64,
    pub abs_diff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PixelProbe {
    InRange {
        row: usize,
        col: usize,
        value_a: f64,
        value_b: f64,
        abs_diff: f64,
        /// `None` when the grid A value is zero.
        percent_diff: Option<f64>,
    },
    OutOfRange {
        row: usize,
        col: usize,
        shape: GridShape,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityReport {
    pub ssim: f64,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub pearson_correlation: f64,
    pub mean_percent_diff: f64,
    pub discrepancies: Vec<Discrepancy>,
    pub statistics_a: GridStatistics,
    pub statistics_b: GridStatistics,
    pub probe: PixelProbe,
    pub quantization_decimals: i32,
    pub discrepancy_threshold: f64,
}

/// [`analyze`] with default settings and the default probe coordinate.
pub fn analyze_default(grid_a: &Grid, grid_b: &Grid) -> CompareResult<SimilarityReport> {
    analyze(grid_a, grid_b, &SimilaritySettings::default(), None)
}

pub fn analyze(
    grid_a: &Grid,
    grid_b: &Grid,
    settings: &SimilaritySettings,
    probe: Option<(usize, usize)>,
) -> CompareResult<SimilarityReport> {
    ensure_same_shape(grid_a, grid_b)?;
    settings.validate()?;

    let quantized_a = normalize_and_quantize(grid_a, settings);
    let quantized_b = normalize_and_quantize(grid_b, settings);

    let pairs = quantized_a
        .values()
        .iter()
        .zip(quantized_b.values())
        .map(|(&a, &b)| (a, b))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect::<Vec<_>>();

    let moments = PairMoments::from_pairs(&pairs);
    let ssim = moments.map_or(0.0, |moments| simplified_ssim(&moments, settings));
    let pearson_correlation = moments.map_or(0.0, |moments| pearson(&moments, &pairs));

    let mae = mean(pairs.iter().map(|(a, b)| (a - b).abs())).unwrap_or(0.0);
    let mse = mean(pairs.iter().map(|(a, b)| (a - b) * (a - b))).unwrap_or(0.0);
    let mean_percent_diff = mean(
        pairs
            .iter()
            .filter(|(a, _)| *a != 0.0)
            .map(|(a, b)| ((a - b) / a).abs()),
    )
    .map_or(0.0, |ratio| ratio * 100.0);

    let (row, col) = probe.unwrap_or((DEFAULT_PROBE_ROW, DEFAULT_PROBE_COL));

    Ok(SimilarityReport {
        ssim,
        mae,
        mse,
        rmse: mse.sqrt(),
        pearson_correlation,
        mean_percent_diff,
        discrepancies: find_discrepancies(&quantized_a, &quantized_b, settings),
        statistics_a: grid_statistics(&quantized_a),
        statistics_b: grid_statistics(&quantized_b),
        probe: probe_pixel(&quantized_a, &quantized_b, row, col),
        quantization_decimals: settings.quantization_decimals,
        discrepancy_threshold: settings.discrepancy_threshold,
    })
}

/// Min-max normalizes `grid` against its own finite range, then rounds.
pub fn normalize_and_quantize(grid: &Grid, settings: &SimilaritySettings) -> Grid {
    let Some((min, max)) = finite_range(grid.values()) else {
        return grid.map(|_| f64::NAN);
    };
    let denominator = max - min + settings.normalization_epsilon;
    grid.map(|value| round_to_decimals((value - min) / denominator, settings.quantization_decimals))
}

pub fn grid_statistics(grid: &Grid) -> GridStatistics {
    match finite_range(grid.values()) {
        Some((min, max)) => GridStatistics {
            min,
            max,
            mean: mean(grid.values().iter().copied().filter(|v| v.is_finite()))
                .unwrap_or(f64::NAN),
        },
        None => GridStatistics {
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
        },
    }
}

pub fn find_discrepancies(
    grid_a: &Grid,
    grid_b: &Grid,
    settings: &SimilaritySettings,
) -> Vec<Discrepancy> {
    let cols = grid_a.cols();
    grid_a
        .values()
        .iter()
        .zip(grid_b.values())
        .enumerate()
        .filter_map(|(index, (&value_a, &value_b))| {
            let abs_diff = (value_a - value_b).abs();
            (abs_diff > settings.discrepancy_threshold).then_some(Discrepancy {
                row: index / cols,
                col: index % cols,
                value_a,
                value_b,
                abs_diff,
            })
        })
        .take(settings.max_discrepancies)
        .collect()
}

pub fn probe_pixel(grid_a: &Grid, grid_b: &Grid, row: usize, col: usize) -> PixelProbe {
    match (grid_a.get(row, col), grid_b.get(row, col)) {
        (Some(value_a), Some(value_b)) => {
            let abs_diff = (value_a - value_b).abs();
            PixelProbe::InRange {
                row,
                col,
                value_a,
                value_b,
                abs_diff,
                percent_diff: (value_a != 0.0).then(|| abs_diff / value_a.abs() * 100.0),
            }
        }
        _ => PixelProbe::OutOfRange {
            row,
            col,
            shape: grid_a.shape(),
        },
    }
}

#[derive(Debug, Clone, Copy)]
struct PairMoments {
    mean_a: f64,
    mean_b: f64,
    variance_a: f64,
    variance_b: f64,
    covariance: f64,
}

impl PairMoments {
    /// Population moments; `None` without any pair.
    fn from_pairs(pairs: &[(f64, f64)]) -> Option<Self> {
        let mean_a = mean(pairs.iter().map(|(a, _)| *a))?;
        let mean_b = mean(pairs.iter().map(|(_, b)| *b))?;
        let variance_a = mean(pairs.iter().map(|(a, _)| (a - mean_a) * (a - mean_a)))?;
        let variance_b = mean(pairs.iter().map(|(_, b)| (b - mean_b) * (b - mean_b)))?;
        let covariance = mean(pairs.iter().map(|(a, b)| (a - mean_a) * (b - mean_b)))?;
        Some(Self {
            mean_a,
            mean_b,
            variance_a,
            variance_b,
            covariance,
        })
    }
}

fn simplified_ssim(moments: &PairMoments, settings: &SimilaritySettings) -> f64 {
    let c1 = settings.c1();
    let c2 = settings.c2();
    let numerator = (2.0 * moments.mean_a * moments.mean_b + c1) * (2.0 * moments.covariance + c2);
    let denominator = (moments.mean_a * moments.mean_a + moments.mean_b * moments.mean_b + c1)
        * (moments.variance_a + moments.variance_b + c2);
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

fn pearson(moments: &PairMoments, pairs: &[(f64, f64)]) -> f64 {
    if moments.variance_a == 0.0 || moments.variance_b == 0.0 {
        return if pairs.iter().all(|(a, b)| a == b) {
            1.0
        } else {
            0.0
        };
    }
    let correlation = moments.covariance / (moments.variance_a * moments.variance_b).sqrt();
    correlation.clamp(-1.0, 1.0)
}

fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
}
