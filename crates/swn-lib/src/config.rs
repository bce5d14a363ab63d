use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable consulted by [`LookupStrategy::from_env`].
pub const LOOKUP_ENV_VAR: &str = "SWN_LOOKUP";

/// Whether the KD-tree endpoint index was compiled in.
pub const SPATIAL_INDEX_AVAILABLE: bool = cfg!(feature = "spatial-index");

/// Requested strategy for endpoint coincidence lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// Use the KD-tree when available, otherwise scan.
    #[default]
    Auto,
    /// Require the KD-tree index.
    Indexed,
    /// Always scan every line.
    Linear,
}

impl LookupStrategy {
    /// Read the strategy from `SWN_LOOKUP`, if set.
    pub fn from_env() -> Result<Option<Self>> {
        match env::var(LOOKUP_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => value.parse().map(Some),
            _ => Ok(None),
        }
    }
}

impl FromStr for LookupStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(LookupStrategy::Auto),
            "indexed" | "kdtree" => Ok(LookupStrategy::Indexed),
            "linear" => Ok(LookupStrategy::Linear),
            _ => Err(Error::UnknownLookupStrategy {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for LookupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            LookupStrategy::Auto => "auto",
            LookupStrategy::Indexed => "indexed",
            LookupStrategy::Linear => "linear",
        };
        f.write_str(value)
    }
}

/// Options fixed when a [`crate::Network`] is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkOptions {
    pub lookup: LookupStrategy,
}

impl NetworkOptions {
    pub fn with_lookup(lookup: LookupStrategy) -> Self {
        Self { lookup }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.lookup == LookupStrategy::Indexed && !SPATIAL_INDEX_AVAILABLE {
            return Err(Error::SpatialIndexUnavailable);
        }
        Ok(())
    }
}
