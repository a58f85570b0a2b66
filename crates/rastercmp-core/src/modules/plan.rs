use super::agreement::{ComparisonConfig, standard_configurations};
use super::similarity::SimilaritySettings;
use crate::domain::CompareError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which comparisons to run for every grid pair.
///
/// ```json
/// {
///   "configurations": [
///     { "precision": 0.1, "policy": "floor" },
///     { "precision": 0.1, "policy": "round" }
///   ],
///   "similarity": { "maxDiscrepancies": 10 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComparisonPlan {
    #[serde(default = "standard_configurations")]
    pub configurations: Vec<ComparisonConfig>,
    #[serde(default)]
    pub similarity: SimilaritySettings,
}

impl Default for ComparisonPlan {
    fn default() -> Self {
        Self {
            configurations: standard_configurations(),
            similarity: SimilaritySettings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read comparison plan '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse comparison plan '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid comparison plan '{}': {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

impl From<PlanError> for CompareError {
    fn from(error: PlanError) -> Self {
        let message = error.to_string();
        match error {
            PlanError::Read { .. } => CompareError::io_system("IO.PLAN_ACCESS", message),
            PlanError::Parse { .. } | PlanError::Invalid { .. } => {
                CompareError::input_validation("INPUT.PLAN", message)
            }
        }
    }
}

pub fn load_comparison_plan(plan_path: impl AsRef<Path>) -> Result<ComparisonPlan, PlanError> {
    let plan_path = plan_path.as_ref();
    let source = fs::read_to_string(plan_path).map_err(|source| PlanError::Read {
        path: plan_path.to_path_buf(),
        source,
    })?;
    parse_comparison_plan(&source, plan_path)
}

pub fn parse_comparison_plan(source: &str, origin: &Path) -> Result<ComparisonPlan, PlanError> {
    let plan: ComparisonPlan =
        serde_json::from_str(source).map_err(|source| PlanError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
    validate_plan(&plan).map_err(|message| PlanError::Invalid {
        path: origin.to_path_buf(),
        message,
    })?;
    Ok(plan)
}

fn validate_plan(plan: &ComparisonPlan) -> Result<(), String> {
    if plan.configurations.is_empty() {
        return Err("plan must list at least one configuration".to_string());
    }
    for (index, config) in plan.configurations.iter().enumerate() {
        config
            .validate()
            .map_err(|error| format!("configuration {}: {}", index + 1, error.message()))?;
    }
    plan.similarity
        .validate()
        .map_err(|error| error.message().to_string())
}

#[cfg(test)]
mod tests {
    use super::{ComparisonPlan, PlanError, load_comparison_plan, parse_comparison_plan};
    use crate::modules::agreement::{ComparisonConfig, RoundingPolicy};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn empty_object_uses_standard_plan() {
        let plan = parse_comparison_plan("{}", Path::new("<inline>")).expect("plan should parse");
        assert_eq!(plan, ComparisonPlan::default());
        assert_eq!(plan.configurations.len(), 6);
    }

    #[test]
    fn similarity_overrides_keep_other_defaults() {
        let plan = parse_comparison_plan(
            r#"
            {
              "configurations": [{ "precision": 0.5, "policy": "round" }],
              "similarity": { "maxDiscrepancies": 10 }
            }
            "#,
            Path::new("<inline>"),
        )
        .expect("plan should parse");

        assert_eq!(
            plan.configurations,
            vec![ComparisonConfig::new(0.5, RoundingPolicy::Round)]
        );
        assert_eq!(plan.similarity.max_discrepancies, 10);
        assert_eq!(plan.similarity.ssim_dynamic_range, 255.0);
        assert_eq!(plan.similarity.quantization_decimals, 3);
    }

    #[test]
    fn invalid_plans_are_rejected() {
        let empty = parse_comparison_plan(r#"{ "configurations": [] }"#, Path::new("p.json"))
            .expect_err("empty configuration list should fail");
        assert!(matches!(empty, PlanError::Invalid { .. }));

        let negative = parse_comparison_plan(
            r#"{ "configurations": [{ "precision": -1.0, "policy": "floor" }] }"#,
            Path::new("p.json"),
        )
        .expect_err("negative precision should fail");
        assert!(negative.to_string().contains("configuration 1"));

        let unknown_policy = parse_comparison_plan(
            r#"{ "configurations": [{ "precision": 1.0, "policy": "ceil" }] }"#,
            Path::new("p.json"),
        )
        .expect_err("unknown policy should fail");
        assert!(matches!(unknown_policy, PlanError::Parse { .. }));
    }

    #[test]
    fn plan_loads_from_disk_and_reports_missing_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("plan.json");
        fs::write(
            &path,
            r#"{ "configurations": [{ "precision": 1.0, "policy": "floor" }] }"#,
        )
        .expect("plan should be written");

        let plan = load_comparison_plan(&path).expect("plan should load");
        assert_eq!(plan.configurations.len(), 1);

        let missing = load_comparison_plan(temp.path().join("missing.json"))
            .expect_err("missing plan should fail");
        let error = crate::domain::CompareError::from(missing);
        assert_eq!(error.placeholder(), "IO.PLAN_ACCESS");
        assert_eq!(error.exit_code(), 3);
    }
}
