//! Surface water network library entry points.
//!
//! This crate validates a table of 3-D stream segment lines, reconstructs
//! which segment drains into which, and derives outlets, headwaters and
//! per-outlet catchment groups. Higher-level consumers (the CLI, model
//! exporters, plotting) should only depend on the items exported here.
//!

pub mod config;
pub mod error;
pub mod geometry;
pub mod network;
pub mod reach;
pub mod render;
pub mod spatial;
pub mod table;
pub mod topology;
pub mod warning;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{LookupStrategy, NetworkOptions, LOOKUP_ENV_VAR, SPATIAL_INDEX_AVAILABLE};
pub use error::{Error, Result};
pub use geometry::{Coord, Geometry, Line, LineId, Point3};
pub use network::Network;
pub use reach::{Reach, ReachTable};
pub use spatial::{build_lookup, EndpointLookup, LinearLookup, LookupKind};
#[cfg(feature = "spatial-index")]
pub use spatial::KdTreeLookup;
pub use table::LineTable;
pub use topology::Evaluation;
pub use warning::NetworkWarning;
