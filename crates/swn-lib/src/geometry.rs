use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Caller-supplied identifier of a stream segment.
pub type LineId = i64;

/// Single vertex as supplied by the caller; elevation is optional until validated.
///
/// Serialised as a GeoJSON position: an array of two or three numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coord {
    /// Planar coordinate without elevation.
    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Coordinate with elevation.
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl TryFrom<Vec<f64>> for Coord {
    type Error = String;

    fn try_from(values: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y] => Ok(Self::xy(*x, *y)),
            [x, y, z] => Ok(Self::xyz(*x, *y, *z)),
            other => Err(format!(
                "a position needs 2 or 3 numbers, found {}",
                other.len()
            )),
        }
    }
}

impl From<Coord> for Vec<f64> {
    fn from(coord: Coord) -> Self {
        match coord.z {
            Some(z) => vec![coord.x, coord.y, z],
            None => vec![coord.x, coord.y],
        }
    }
}

/// Geometry value attached to one row of a [`crate::LineTable`].
///
/// Only `LineString` is accepted by the network; the other variants exist so
/// that wrong geometry types are rejected with a precise error rather than a
/// parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    Polygon(Vec<Vec<Coord>>),
}

impl Geometry {
    /// Build a 3-D line string from `[x, y, z]` triples.
    pub fn line_string_z<I>(points: I) -> Self
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        Geometry::LineString(
            points
                .into_iter()
                .map(|[x, y, z]| Coord::xyz(x, y, z))
                .collect(),
        )
    }

    /// Build a planar line string from `[x, y]` pairs.
    pub fn line_string_xy<I>(points: I) -> Self
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        Geometry::LineString(points.into_iter().map(|[x, y]| Coord::xy(x, y)).collect())
    }

    /// Geometry type name as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
        }
    }
}

/// Validated 3-D vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Planar location used for endpoint coincidence.
    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.x, self.y, self.z)
    }
}

/// One validated stream segment. Flow runs from `start` to `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    id: LineId,
    points: Vec<Point3>,
}

impl Line {
    /// Validate a geometry and turn it into a line.
    ///
    /// Checks, in order: single-part line string, at least two vertices,
    /// finite planar coordinates, and an elevation on every vertex.
    pub fn from_geometry(id: LineId, geometry: &Geometry) -> Result<Self> {
        let Geometry::LineString(coords) = geometry else {
            return Err(Error::WrongGeometryType {
                id,
                found: geometry.kind(),
            });
        };

        if coords.len() < 2 {
            return Err(Error::TooFewPoints {
                id,
                count: coords.len(),
            });
        }

        let mut points = Vec::with_capacity(coords.len());
        for (vertex, coord) in coords.iter().enumerate() {
            if !coord.x.is_finite() || !coord.y.is_finite() {
                return Err(Error::InvalidCoordinate { id, vertex });
            }
            let Some(z) = coord.z.filter(|z| z.is_finite()) else {
                return Err(Error::MissingElevation { id, vertex });
            };
            points.push(Point3 {
                x: coord.x,
                y: coord.y,
                z,
            });
        }

        Ok(Self { id, points })
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Upstream end of the segment.
    pub fn start(&self) -> Point3 {
        self.points[0]
    }

    /// Downstream end of the segment.
    pub fn end(&self) -> Point3 {
        self.points[self.points.len() - 1]
    }
}
