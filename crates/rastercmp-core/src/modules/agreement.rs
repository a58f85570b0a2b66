//! Quantized pixel agreement between two grids.
//!
//! Both grids are snapped to a precision step under a rounding policy and
//! compared cell by cell. The median absolute difference is taken from the
//! raw grids, not from the snapped ones.

use crate::common::constants::{ROUND_POLICY_DECIMALS, STANDARD_PRECISIONS};
use crate::domain::{CompareError, CompareResult, Grid, ensure_same_shape};
use crate::numerics::{median_in_place, round_to_decimals};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// `floor(x / precision) * precision`
    Floor,
    /// `round(x / precision, 2) * precision`, ties to even
    Round,
}

impl RoundingPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Round => "round",
        }
    }

    pub fn quantize(self, value: f64, precision: f64) -> f64 {
        let scaled = value / precision;
        let snapped = match self {
            Self::Floor => scaled.floor(),
            Self::Round => round_to_decimals(scaled, ROUND_POLICY_DECIMALS),
        };
        snapped * precision
    }
}

impl Display for RoundingPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ComparisonConfig {
    pub precision: f64,
    pub policy: RoundingPolicy,
}

impl ComparisonConfig {
    pub const fn new(precision: f64, policy: RoundingPolicy) -> Self {
        Self { precision, policy }
    }

    pub fn validate(&self) -> CompareResult<()> {
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err(CompareError::input_validation(
                "INPUT.INVALID_PRECISION",
                format!(
                    "precision must be a finite positive number, got {}",
                    self.precision
                ),
            ));
        }
        Ok(())
    }
}

impl Display for ComparisonConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.policy, self.precision)
    }
}

/// Default plan: every standard precision under FLOOR, then every standard
/// precision under ROUND.
pub fn standard_configurations() -> Vec<ComparisonConfig> {
    [RoundingPolicy::Floor, RoundingPolicy::Round]
        .into_iter()
        .flat_map(|policy| {
            STANDARD_PRECISIONS
                .into_iter()
                .map(move |precision| ComparisonConfig::new(precision, policy))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgreementResult {
    pub mismatch_count: usize,
    pub total_cells: usize,
    pub median_abs_diff: f64,
}

impl AgreementResult {
    pub fn matching_cells(&self) -> usize {
        self.total_cells - self.mismatch_count
    }

    pub fn similarity_percent(&self) -> f64 {
        if self.total_cells == 0 {
            return 0.0;
        }
        self.matching_cells() as f64 / self.total_cells as f64 * 100.0
    }
}

pub fn compare(
    grid_a: &Grid,
    grid_b: &Grid,
    config: ComparisonConfig,
) -> CompareResult<AgreementResult> {
    ensure_same_shape(grid_a, grid_b)?;
    config.validate()?;

    let ComparisonConfig { precision, policy } = config;
    // IEEE inequality: a NaN on either side is always a mismatch.
    let mismatch_count = grid_a
        .values()
        .iter()
        .zip(grid_b.values())
        .filter(|&(&a, &b)| policy.quantize(a, precision) != policy.quantize(b, precision))
        .count();

    let mut finite_diffs = grid_a
        .values()
        .iter()
        .zip(grid_b.values())
        .map(|(a, b)| (a - b).abs())
        .filter(|diff| diff.is_finite())
        .collect::<Vec<_>>();
    let median_abs_diff = median_in_place(&mut finite_diffs).unwrap_or(0.0);

    Ok(AgreementResult {
        mismatch_count,
        total_cells: grid_a.len(),
        median_abs_diff,
    })
}

/// Runs `compare` once per configuration, in order.
pub fn compare_all(
    grid_a: &Grid,
    grid_b: &Grid,
    configs: &[ComparisonConfig],
) -> CompareResult<Vec<(ComparisonConfig, AgreementResult)>> {
    configs
        .iter()
        .map(|config| compare(grid_a, grid_b, *config).map(|result| (*config, result)))
        .collect()
}
