//! Read-only layout of covariate projections.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use seiir_primitives::{CovariateName, Selector};
use tracing::warn;

use crate::error::{PathsError, PathsResult};

const SCENARIO_FILE_SUFFIX: &str = "_scenario.csv";
const INFO_FILE_SUFFIX: &str = "info.csv";

/// Covariate projections, one directory per covariate holding one file per
/// selectable variant. Covariate inputs are never written by the forecast, so
/// this layout cannot create directories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CovariatePaths {
    root: PathBuf,
}

impl CovariatePaths {
    /// Opens the layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the covariate version.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every variant of one covariate.
    #[must_use]
    pub fn covariate_dir(&self, covariate: &CovariateName) -> PathBuf {
        self.root.join(covariate.as_str())
    }

    /// Projection file for one covariate variant.
    #[must_use]
    pub fn scenario_file(&self, covariate: &CovariateName, selector: &Selector) -> PathBuf {
        self.covariate_dir(covariate)
            .join(format!("{selector}{SCENARIO_FILE_SUFFIX}"))
    }

    /// Every variant available for a covariate, keyed by selector.
    ///
    /// Files whose variant part is not a valid selector are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PathsError::Io`] when the covariate directory cannot be read.
    pub fn scenario_files(&self, covariate: &CovariateName) -> PathsResult<BTreeMap<Selector, PathBuf>> {
        let mut mapping = BTreeMap::new();
        for path in list_files(&self.covariate_dir(covariate))? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(variant) = name.strip_suffix(SCENARIO_FILE_SUFFIX) else {
                continue;
            };
            match Selector::new(variant) {
                Ok(selector) => {
                    mapping.insert(selector, path);
                }
                Err(err) => warn!(path = %path.display(), %err, "skipping covariate file"),
            }
        }
        Ok(mapping)
    }

    /// Metadata files that accompany a covariate's projections.
    ///
    /// # Errors
    ///
    /// Returns [`PathsError::Io`] when the covariate directory cannot be read.
    pub fn info_files(&self, covariate: &CovariateName) -> PathsResult<Vec<PathBuf>> {
        Ok(list_files(&self.covariate_dir(covariate))?
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(INFO_FILE_SUFFIX))
            })
            .collect())
    }
}

/// Regular files directly inside `dir`, sorted by path.
fn list_files(dir: &Path) -> PathsResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| PathsError::io(dir, source))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PathsError::io(dir, source))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    use uuid::Uuid;

    fn temp_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("covariates-{}", Uuid::new_v4()));
        path
    }

    #[test]
    fn maps_selectors_to_files() {
        let root = temp_root();
        let mobility = CovariateName::new("mobility").unwrap();
        let dir = root.join("mobility");
        fs::create_dir_all(&dir).unwrap();
        for name in ["reference_scenario.csv", "worse_scenario.csv", "mobility_info.csv", "notes.txt"] {
            fs::write(dir.join(name), "location_id,date,value\n").unwrap();
        }

        let paths = CovariatePaths::new(&root);
        let mapping = paths.scenario_files(&mobility).unwrap();
        let selectors: Vec<&str> = mapping.keys().map(Selector::as_str).collect();
        assert_eq!(selectors, ["reference", "worse"]);
        assert_eq!(
            mapping[&Selector::new("worse").unwrap()],
            paths.scenario_file(&mobility, &Selector::new("worse").unwrap())
        );

        let info = paths.info_files(&mobility).unwrap();
        assert_eq!(info, [dir.join("mobility_info.csv")]);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_covariate_directory_is_io_error() {
        let paths = CovariatePaths::new(temp_root());
        let err = paths
            .scenario_files(&CovariateName::new("testing").unwrap())
            .unwrap_err();
        assert!(matches!(err, PathsError::Io { .. }));
    }
}
