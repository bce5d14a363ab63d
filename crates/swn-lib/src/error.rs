use thiserror::Error;

use crate::geometry::LineId;

/// Convenient result alias for the surface water network library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Every variant is a fatal precondition failure detected before any topology
/// work happens. Recoverable conditions found during evaluation are reported
/// as [`crate::NetworkWarning`] values instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the input is not a table of geometries.
    #[error("lines must be a geometry table: {reason}")]
    NotAGeometryTable { reason: String },

    /// Raised when the line table has no rows.
    #[error("one or more lines are required")]
    NoLines,

    /// Raised when a geometry is not a single-part line.
    #[error("lines must all be LineString types; line {id} is a {found}")]
    WrongGeometryType { id: LineId, found: &'static str },

    /// Raised when a line has fewer than two vertices.
    #[error("line {id} has {count} coordinate(s); at least 2 are required")]
    TooFewPoints { id: LineId, count: usize },

    /// Raised when a vertex has a non-finite planar coordinate.
    #[error("line {id} has a non-finite coordinate at vertex {vertex}")]
    InvalidCoordinate { id: LineId, vertex: usize },

    /// Raised when any vertex of a line lacks a Z coordinate.
    #[error("lines must all have Z dimension; line {id} is missing elevation at vertex {vertex}")]
    MissingElevation { id: LineId, vertex: usize },

    /// Raised when the same identifier appears on more than one row.
    #[error("duplicate line identifier encountered: {id}")]
    DuplicateLineId { id: LineId },

    /// Raised when a lookup strategy name cannot be parsed.
    #[error("unknown lookup strategy '{value}'; expected one of: auto, indexed, linear")]
    UnknownLookupStrategy { value: String },

    /// Raised when the KD-tree lookup is requested but was not compiled in.
    #[error("spatial index requested but the `spatial-index` feature is disabled")]
    SpatialIndexUnavailable,

    /// Raised when a value grid does not match the model grid shape.
    #[error("grid shape mismatch: expected {expected_rows}x{expected_cols}, found {rows}x{cols}")]
    GridShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    /// Raised when a cell index falls outside a grid.
    #[error("cell ({row}, {col}) is outside a {rows}x{cols} grid")]
    CellOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Raised when a layer value range is empty or inverted.
    #[error("invalid value range: min {min} must be below max {max}")]
    InvalidRange { min: f64, max: f64 },

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
