//! Read-only layout of infectionator outputs.

use std::fs;
use std::path::{Path, PathBuf};

use seiir_primitives::{DrawId, LocationId};
use tracing::warn;

use crate::error::{PathsError, PathsResult};

/// Per-location infection draws. Folders are named `<location name>_<id>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfectionPaths {
    root: PathBuf,
}

impl InfectionPaths {
    /// Opens the layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the infection version.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The unique folder holding one location's draws.
    ///
    /// # Errors
    ///
    /// Returns [`PathsError::MissingLocation`] or
    /// [`PathsError::AmbiguousLocation`] unless exactly one folder matches, and
    /// [`PathsError::Io`] when the root cannot be read.
    pub fn location_dir(&self, location_id: LocationId) -> PathsResult<PathBuf> {
        let suffix = format!("_{location_id}");
        let mut matches: Vec<PathBuf> = self
            .location_dirs()?
            .into_iter()
            .filter(|dir| {
                dir.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&suffix))
            })
            .collect();

        match matches.len() {
            0 => Err(PathsError::MissingLocation {
                location_id,
                root: self.root.clone(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(PathsError::AmbiguousLocation {
                location_id,
                matches,
            }),
        }
    }

    /// Every location with an infection folder, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns [`PathsError::Io`] when the root cannot be read.
    pub fn modelled_locations(&self) -> PathsResult<Vec<LocationId>> {
        let mut locations = Vec::new();
        for dir in self.location_dirs()? {
            let id = dir
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.rsplit('_').next())
                .map(str::parse::<LocationId>);
            match id {
                Some(Ok(id)) => locations.push(id),
                _ => warn!(path = %dir.display(), "skipping folder without a location id"),
            }
        }
        locations.sort_unstable();
        Ok(locations)
    }

    /// Infection and death draws for one location.
    ///
    /// # Errors
    ///
    /// See [`InfectionPaths::location_dir`].
    pub fn infection_file(&self, location_id: LocationId, draw_id: DrawId) -> PathsResult<PathBuf> {
        Ok(self.location_dir(location_id)?.join(format!(
            "draw{:04}_prepped_deaths_and_cases_all_age.csv",
            draw_id.get()
        )))
    }

    fn location_dirs(&self) -> PathsResult<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root).map_err(|source| PathsError::io(&self.root, source))?;
        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| PathsError::io(&self.root, source))?
                .path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}
