//! Tabular container of caller-supplied line geometries.
//!
//! A [`LineTable`] is the only input accepted by [`crate::Network`]. Rows keep
//! their insertion order, which later determines outlet ordering and
//! tie-breaking, and every row is keyed by a unique [`LineId`].
//!
//! The JSON form is column-oriented, mirroring a data frame with a geometry
//! column:
//!
//! ```json
//! {
//!   "index": [10, 11, 12],
//!   "geometry": [
//!     {"type": "LineString", "coordinates": [[40, 130, 15], [60, 100, 14]]},
//!     {"type": "LineString", "coordinates": [[70, 130, 15], [60, 100, 14]]},
//!     {"type": "LineString", "coordinates": [[60, 100, 14], [60, 80, 12]]}
//!   ]
//! }
//! ```
//!
//! When `index` is omitted the rows are numbered `0..n`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geometry::{Geometry, LineId};

/// Ordered rows of `(identifier, geometry)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineTable {
    ids: Vec<LineId>,
    geometries: Vec<Geometry>,
    seen: HashSet<LineId>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            geometries: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Build a table from `(id, geometry)` rows, rejecting duplicate identifiers.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (LineId, Geometry)>,
    {
        let mut table = Self::new();
        for (id, geometry) in rows {
            table.push(id, geometry)?;
        }
        Ok(table)
    }

    /// Build a table from geometries using a `0..n` range index.
    pub fn from_geometries<I>(geometries: I) -> Self
    where
        I: IntoIterator<Item = Geometry>,
    {
        let geometries: Vec<Geometry> = geometries.into_iter().collect();
        let ids: Vec<LineId> = (0..geometries.len() as LineId).collect();
        Self {
            seen: ids.iter().copied().collect(),
            ids,
            geometries,
        }
    }

    /// Append a row.
    pub fn push(&mut self, id: LineId, geometry: Geometry) -> Result<()> {
        if !self.seen.insert(id) {
            return Err(Error::DuplicateLineId { id });
        }
        self.ids.push(id);
        self.geometries.push(geometry);
        Ok(())
    }

    /// Parse the column-oriented JSON form described in the module docs.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(columns) = value else {
            return Err(not_a_table(format!(
                "expected an object of columns, found {}",
                json_kind(value)
            )));
        };

        let geometry = match columns.get("geometry") {
            Some(Value::Array(geometry)) => geometry,
            Some(other) => {
                return Err(not_a_table(format!(
                    "`geometry` column must be an array, found {}",
                    json_kind(other)
                )))
            }
            None => return Err(not_a_table("missing `geometry` column")),
        };

        let ids: Vec<LineId> = match columns.get("index") {
            None | Some(Value::Null) => (0..geometry.len() as LineId).collect(),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value.as_i64().ok_or_else(|| {
                        not_a_table(format!("index value {value} is not an integer"))
                    })
                })
                .collect::<Result<_>>()?,
            Some(other) => {
                return Err(not_a_table(format!(
                    "`index` column must be an array, found {}",
                    json_kind(other)
                )))
            }
        };

        if ids.len() != geometry.len() {
            return Err(not_a_table(format!(
                "`index` has {} rows but `geometry` has {}",
                ids.len(),
                geometry.len()
            )));
        }

        let mut table = Self::with_capacity(ids.len());
        for (id, raw) in ids.into_iter().zip(geometry) {
            if !table.seen.insert(id) {
                return Err(Error::DuplicateLineId { id });
            }
            let geometry = Geometry::deserialize(raw)
                .map_err(|err| not_a_table(format!("row {id} is not a geometry: {err}")))?;
            table.ids.push(id);
            table.geometries.push(geometry);
        }

        Ok(table)
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Parse a JSON document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(&value)
    }

    /// Read a JSON document from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[LineId] {
        &self.ids
    }

    /// Iterate rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (LineId, &Geometry)> {
        self.ids.iter().copied().zip(self.geometries.iter())
    }
}

fn not_a_table(reason: impl Into<String>) -> Error {
    Error::NotAGeometryTable {
        reason: reason.into(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
