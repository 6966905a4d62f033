//! Reading and writing specification documents.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult, SchemaError};
use crate::schema::{ForecastSpecification, RawSpecification};

/// Loads and validates a forecast specification from a YAML file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read,
/// [`ConfigError::Schema`] when the document does not match the schema, and
/// [`ConfigError::Reference`] when it refers to an undeclared scenario.
pub fn load(path: impl AsRef<Path>) -> ConfigResult<ForecastSpecification> {
    ForecastSpecification::load(path)
}

impl ForecastSpecification {
    /// Loads and validates a forecast specification from a YAML file.
    ///
    /// # Errors
    ///
    /// See [`load`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading forecast specification");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::io(path, source))?;
        let spec = Self::from_yaml(&content)?;
        info!(
            path = %path.display(),
            scenarios = spec.scenarios.len(),
            "forecast specification loaded"
        );
        Ok(spec)
    }

    /// Parses and validates a forecast specification from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Schema`] or [`ConfigError::Reference`] as for
    /// [`load`].
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        // Parsed through the raw shape so bound and reference failures keep
        // their own error kinds instead of being folded into `Malformed`.
        let raw: RawSpecification = serde_yaml::from_str(yaml).map_err(SchemaError::from)?;
        Self::try_from(raw)
    }

    /// Renders the specification as YAML. Loading the output yields an equal
    /// specification.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Emit`] if serialization fails.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        serde_yaml::to_string(self).map_err(|source| ConfigError::Emit { source })
    }

    /// Writes the specification to `path` as YAML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be written and
    /// [`ConfigError::Emit`] if serialization fails.
    pub fn dump(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::io(parent, source))?;
        }
        fs::write(path, yaml).map_err(|source| ConfigError::io(path, source))?;
        debug!(path = %path.display(), "forecast specification written");
        Ok(())
    }
}
