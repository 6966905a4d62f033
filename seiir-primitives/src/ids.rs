//! Draw and location identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Index of one stochastic replicate of the pipeline, numbered from zero.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawId(u32);

impl DrawId {
    /// Creates a draw identifier from its index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the draw index.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Iterates over the first `count` draws.
    pub fn range(count: u32) -> impl Iterator<Item = Self> {
        (0..count).map(Self)
    }
}

impl Display for DrawId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<u32> for DrawId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for DrawId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self).map_err(|_| Error::InvalidNumericId {
            kind: "draw id",
            input: s.into(),
        })
    }
}

/// Identifier of a modelled location in the location hierarchy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(u32);

impl LocationId {
    /// Creates a location identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for LocationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<u32> for LocationId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for LocationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self).map_err(|_| Error::InvalidNumericId {
            kind: "location id",
            input: s.into(),
        })
    }
}
