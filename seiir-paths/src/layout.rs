//! Shared behaviour of writable directory layouts.

use std::fs;
use std::path::{Path, PathBuf};

use seiir_primitives::DrawId;
use tracing::debug;

use crate::error::{PathsError, PathsResult};

/// File name used for per-draw CSV outputs.
#[must_use]
pub fn draw_file(draw_id: DrawId) -> String {
    format!("draw_{draw_id}.csv")
}

/// A directory tree a pipeline stage writes into.
pub trait OutputLayout {
    /// Short name used in logs and errors, e.g. `regression`.
    const KIND: &'static str;

    /// Root of the tree.
    fn root(&self) -> &Path;

    /// Whether the tree was opened for reading only.
    fn read_only(&self) -> bool;

    /// Every sub-directory the stage writes into.
    fn directories(&self) -> Vec<PathBuf>;

    /// Creates every sub-directory of the tree.
    ///
    /// # Errors
    ///
    /// Returns [`PathsError::ReadOnly`] when the layout is read-only and
    /// [`PathsError::Io`] when a directory cannot be created.
    fn make_dirs(&self) -> PathsResult<()> {
        if self.read_only() {
            return Err(PathsError::ReadOnly {
                layout: Self::KIND,
                root: self.root().to_path_buf(),
            });
        }

        debug!(
            layout = Self::KIND,
            root = %self.root().display(),
            "creating sub-directory structure"
        );
        for directory in self.directories() {
            fs::create_dir_all(&directory).map_err(|source| PathsError::io(&directory, source))?;
        }
        Ok(())
    }
}
