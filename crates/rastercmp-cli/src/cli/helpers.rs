use super::CliError;
use globset::Glob;
use rastercmp_core::domain::CompareError;
use rastercmp_core::modules::plan::{ComparisonPlan, load_comparison_plan};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FileRole {
    Serial,
    Kernel,
}

/// Maps a file name to its role in a comparison and to the case it belongs to.
pub(super) trait PairingStrategy {
    fn role(&self, file_name: &str) -> Option<FileRole>;

    fn case_id(&self, file_name: &str) -> Option<String>;
}

/// Role from a marker substring, case from the first `-<digits>-` token.
///
/// `dem-0-serial.tif` and `dem-0-kernels.tif` are both case `0`.
#[derive(Debug, Clone)]
pub(super) struct SubstringPairing {
    serial_marker: String,
    kernel_marker: String,
}

impl Default for SubstringPairing {
    fn default() -> Self {
        Self {
            serial_marker: "serial".to_string(),
            kernel_marker: "kernels".to_string(),
        }
    }
}

impl PairingStrategy for SubstringPairing {
    fn role(&self, file_name: &str) -> Option<FileRole> {
        if file_name.contains(&self.kernel_marker) {
            Some(FileRole::Kernel)
        } else if file_name.contains(&self.serial_marker) {
            Some(FileRole::Serial)
        } else {
            None
        }
    }

    fn case_id(&self, file_name: &str) -> Option<String> {
        let segments = file_name.split('-').collect::<Vec<_>>();
        // only segments with a '-' on both sides
        let inner = segments.len().saturating_sub(1);
        segments
            .iter()
            .take(inner)
            .skip(1)
            .find(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
            .map(|token| token.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct GridPair {
    pub(super) case_id: String,
    pub(super) kernel_path: PathBuf,
    pub(super) serial_path: PathBuf,
}

impl GridPair {
    pub(super) fn kernel_name(&self) -> String {
        file_name_of(&self.kernel_path)
    }

    pub(super) fn serial_name(&self) -> String {
        file_name_of(&self.serial_path)
    }
}

pub(super) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Files directly under `dir` whose name matches `pattern`, sorted by name.
pub(super) fn discover_grid_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let matcher = Glob::new(pattern)
        .map_err(|source| {
            CliError::Usage(format!("invalid file pattern '{}': {}", pattern, source))
        })?
        .compile_matcher();

    let entries = fs::read_dir(dir).map_err(|source| {
        CliError::Compare(CompareError::io_system(
            "IO.GRIDS_DIR",
            format!("failed to list '{}': {}", dir.display(), source),
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            CliError::Compare(CompareError::io_system(
                "IO.GRIDS_DIR",
                format!("failed to read entry in '{}': {}", dir.display(), source),
            ))
        })?;
        let path = entry.path();
        if path.is_file() && matcher.is_match(entry.file_name()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Pairs every kernel file with the first serial file of the same case.
pub(super) fn pair_grid_files(files: &[PathBuf], strategy: &dyn PairingStrategy) -> Vec<GridPair> {
    let mut serial_by_case = BTreeMap::new();
    let mut kernels = Vec::new();

    for path in files {
        let name = file_name_of(path);
        match strategy.role(&name) {
            Some(FileRole::Serial) => match strategy.case_id(&name) {
                Some(case_id) => {
                    serial_by_case.entry(case_id).or_insert_with(|| path.clone());
                }
                None => warn!(file = %name, "cannot determine case id of serial file"),
            },
            Some(FileRole::Kernel) => kernels.push((name, path)),
            None => {}
        }
    }

    let mut pairs = Vec::with_capacity(kernels.len());
    for (name, kernel_path) in kernels {
        let Some(case_id) = strategy.case_id(&name) else {
            warn!(file = %name, "cannot determine case id of kernel file");
            continue;
        };
        let Some(serial_path) = serial_by_case.get(&case_id) else {
            warn!(file = %name, case = %case_id, "no serial file for kernel file");
            continue;
        };
        pairs.push(GridPair {
            case_id,
            kernel_path: kernel_path.clone(),
            serial_path: serial_path.clone(),
        });
    }
    pairs
}

pub(super) fn load_plan(plan_path: Option<&Path>) -> Result<ComparisonPlan, CliError> {
    match plan_path {
        Some(path) => load_comparison_plan(path).map_err(|error| CliError::Compare(error.into())),
        None => Ok(ComparisonPlan::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FileRole, PairingStrategy, SubstringPairing, discover_grid_files, pair_grid_files,
    };
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn substring_pairing_reads_role_and_case() {
        let pairing = SubstringPairing::default();
        assert_eq!(pairing.role("dem-0-kernels.tif"), Some(FileRole::Kernel));
        assert_eq!(pairing.role("dem-1-serial.tif"), Some(FileRole::Serial));
        assert_eq!(pairing.role("notes.tif"), None);

        assert_eq!(pairing.case_id("dem-0-kernels.tif").as_deref(), Some("0"));
        assert_eq!(pairing.case_id("run-x-12-serial.tif").as_deref(), Some("12"));
        assert_eq!(pairing.case_id("dem-kernels.tif"), None);
        assert_eq!(pairing.case_id("0-serial.tif"), None);
    }

    #[test]
    fn kernels_pair_with_matching_serial_case() {
        let files = [
            "dem-0-kernels.tif",
            "dem-0-serial.tif",
            "dem-1-kernels.tif",
            "dem-1-serial.tif",
            "dem-2-kernels.tif",
            "dem-kernels.tif",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect::<Vec<_>>();

        let pairs = pair_grid_files(&files, &SubstringPairing::default());
        let summary = pairs
            .iter()
            .map(|pair| (pair.kernel_name(), pair.serial_name()))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("dem-0-kernels.tif".to_string(), "dem-0-serial.tif".to_string()),
                ("dem-1-kernels.tif".to_string(), "dem-1-serial.tif".to_string()),
            ]
        );
        assert_eq!(pairs[1].case_id, "1");
    }

    #[test]
    fn discovery_filters_by_glob_and_sorts() {
        let temp = TempDir::new().expect("tempdir should be created");
        for name in ["b-1-serial.tif", "a-0-serial.tif", "readme.txt"] {
            fs::write(temp.path().join(name), "1\n").expect("write");
        }
        fs::create_dir(temp.path().join("nested.tif")).expect("mkdir");

        let files = discover_grid_files(temp.path(), "*.tif").expect("discovery should succeed");
        let names = files
            .iter()
            .map(|path| path.file_name().and_then(|n| n.to_str()).unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a-0-serial.tif", "b-1-serial.tif"]);
    }
}
