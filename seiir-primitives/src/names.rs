//! Names that double as directory or file-name components on disk.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 64;

macro_rules! path_safe_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new name after validating its format.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidIdentifier`] if the name is empty, too long,
            /// a relative path marker, or contains unsupported characters.
            pub fn new(name: impl Into<String>) -> Result<Self> {
                let name = name.into();
                validate_name($kind, &name)?;
                Ok(Self(name))
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

path_safe_name!(
    /// Name of a forecast scenario, e.g. `reference` or `worse`.
    ///
    /// Scenario names become directory names under the forecast output root.
    ScenarioName,
    "scenario name"
);

path_safe_name!(
    /// Name of a covariate, e.g. `mobility` or `pneumonia`.
    CovariateName,
    "covariate name"
);

path_safe_name!(
    /// Selects one variant of a covariate's projections, e.g. `reference`.
    ///
    /// Resolves to `<covariate>/<selector>_scenario.csv` in a covariate version.
    Selector,
    "covariate selector"
);

fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    let reject = |reason: String| Error::InvalidIdentifier {
        kind,
        id: name.into(),
        reason,
    };

    if name.is_empty() {
        return Err(reject("name cannot be empty".into()));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(reject(format!("name length must be <= {MAX_NAME_LEN}")));
    }

    if name == "." || name == ".." {
        return Err(reject("name cannot be a relative path marker".into()));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(reject(
            "name must contain ASCII alphanumeric, dash, underscore, or dot".into(),
        ));
    }

    Ok(())
}
