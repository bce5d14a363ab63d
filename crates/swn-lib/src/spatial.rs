//! Endpoint lookup used to find which lines start where another line ends.
//!
//! # Overview
//!
//! Coincidence is tested on planar `(x, y)` only, with exact floating-point
//! equality; geometries are expected to be snapped beforehand. Two
//! implementations sit behind [`EndpointLookup`]:
//!
//! - [`KdTreeLookup`]: a 2-D KD-tree (kiddo) over line start points giving
//!   O(log n) average-case candidate retrieval. Only compiled with the
//!   `spatial-index` feature.
//! - [`LinearLookup`]: an exhaustive scan, always available.
//!
//! Both return candidate rows in ascending input order, so the choice of
//! lookup never changes evaluation results.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{LookupStrategy, SPATIAL_INDEX_AVAILABLE};
use crate::geometry::Line;

/// Lookup implementation actually in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    KdTree,
    Linear,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LookupKind::KdTree => "kd-tree",
            LookupKind::Linear => "linear",
        })
    }
}

/// Uniform interface over endpoint lookup strategies.
pub trait EndpointLookup: fmt::Debug + Send + Sync {
    /// Rows of lines whose upstream end sits exactly at `xy`, in input order.
    fn starting_at(&self, xy: [f64; 2]) -> Vec<usize>;

    /// Which implementation this is.
    fn kind(&self) -> LookupKind;
}

/// Build the lookup for `lines` according to the requested strategy.
///
/// `Indexed` without the `spatial-index` feature is rejected when network
/// options are validated; if it slips through here the linear scan is used.
pub fn build_lookup(strategy: LookupStrategy, lines: &[Line]) -> Box<dyn EndpointLookup> {
    let lookup: Box<dyn EndpointLookup> = match strategy {
        LookupStrategy::Linear => Box::new(LinearLookup::new(lines)),
        LookupStrategy::Auto | LookupStrategy::Indexed => {
            if !SPATIAL_INDEX_AVAILABLE && strategy == LookupStrategy::Indexed {
                warn!("spatial index unavailable; falling back to linear endpoint scan");
            }
            indexed_or_linear(lines)
        }
    };

    info!(
        lines = lines.len(),
        kind = %lookup.kind(),
        "built endpoint lookup"
    );
    lookup
}

#[cfg(feature = "spatial-index")]
fn indexed_or_linear(lines: &[Line]) -> Box<dyn EndpointLookup> {
    Box::new(KdTreeLookup::new(lines))
}

#[cfg(not(feature = "spatial-index"))]
fn indexed_or_linear(lines: &[Line]) -> Box<dyn EndpointLookup> {
    tracing::debug!("spatial-index feature disabled; using linear endpoint scan");
    Box::new(LinearLookup::new(lines))
}

fn start_points(lines: &[Line]) -> Vec<[f64; 2]> {
    lines.iter().map(|line| line.start().xy()).collect()
}

/// Exhaustive scan over every line start.
#[derive(Debug, Clone)]
pub struct LinearLookup {
    starts: Vec<[f64; 2]>,
}

impl LinearLookup {
    pub fn new(lines: &[Line]) -> Self {
        Self {
            starts: start_points(lines),
        }
    }
}

impl EndpointLookup for LinearLookup {
    fn starting_at(&self, xy: [f64; 2]) -> Vec<usize> {
        self.starts
            .iter()
            .enumerate()
            .filter(|(_, start)| **start == xy)
            .map(|(row, _)| row)
            .collect()
    }

    fn kind(&self) -> LookupKind {
        LookupKind::Linear
    }
}

#[cfg(feature = "spatial-index")]
pub use kdtree::KdTreeLookup;

#[cfg(feature = "spatial-index")]
mod kdtree {
    use std::collections::HashMap;
    use std::fmt;

    use kiddo::float::kdtree::KdTree;
    use kiddo::SquaredEuclidean;
    use tracing::debug;

    use super::{start_points, EndpointLookup, LookupKind};
    use crate::geometry::Line;

    /// KD-tree bucket size (kiddo default).
    const BUCKET_SIZE: usize = 32;

    /// Squared search radius; exact equality is checked on every hit.
    const SEARCH_RADIUS: f64 = 1e-12;

    /// KD-tree over distinct line start points.
    ///
    /// Each planar location is inserted once, since kiddo leaves cannot split
    /// more than a bucket of identical points. Tree items index `points` and
    /// `rows`, the latter holding every line starting there in input order.
    pub struct KdTreeLookup {
        tree: KdTree<f64, usize, 2, BUCKET_SIZE, u32>,
        points: Vec<[f64; 2]>,
        rows: Vec<Vec<usize>>,
        lines: usize,
    }

    impl KdTreeLookup {
        pub fn new(lines: &[Line]) -> Self {
            let starts = start_points(lines);
            let mut slots: HashMap<[u64; 2], usize> = HashMap::with_capacity(starts.len());
            let mut points: Vec<[f64; 2]> = Vec::new();
            let mut rows: Vec<Vec<usize>> = Vec::new();
            let mut tree: KdTree<f64, usize, 2, BUCKET_SIZE, u32> = KdTree::new();

            for (row, start) in starts.iter().enumerate() {
                let slot = *slots.entry(point_key(start)).or_insert_with(|| {
                    let slot = points.len();
                    tree.add(start, slot);
                    points.push(*start);
                    rows.push(Vec::new());
                    slot
                });
                rows[slot].push(row);
            }

            debug!(
                lines = starts.len(),
                points = points.len(),
                "indexed line start points"
            );
            Self {
                tree,
                points,
                rows,
                lines: starts.len(),
            }
        }

        /// Number of indexed lines.
        pub fn len(&self) -> usize {
            self.lines
        }

        pub fn is_empty(&self) -> bool {
            self.lines == 0
        }

        /// Number of distinct start locations in the tree.
        pub fn distinct_points(&self) -> usize {
            self.points.len()
        }
    }

    /// Bit pattern of a planar point, with `-0.0` folded onto `0.0` so keys
    /// agree with `==`.
    fn point_key(xy: &[f64; 2]) -> [u64; 2] {
        xy.map(|value| (if value == 0.0 { 0.0f64 } else { value }).to_bits())
    }

    impl fmt::Debug for KdTreeLookup {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("KdTreeLookup")
                .field("lines", &self.lines)
                .field("points", &self.points.len())
                .finish()
        }
    }

    impl EndpointLookup for KdTreeLookup {
        fn starting_at(&self, xy: [f64; 2]) -> Vec<usize> {
            if self.points.is_empty() {
                return Vec::new();
            }
            let mut rows: Vec<usize> = self
                .tree
                .within::<SquaredEuclidean>(&xy, SEARCH_RADIUS)
                .into_iter()
                .map(|neighbour| neighbour.item)
                .filter(|&slot| self.points[slot] == xy)
                .flat_map(|slot| self.rows[slot].iter().copied())
                .collect();
            rows.sort_unstable();
            rows
        }

        fn kind(&self) -> LookupKind {
            LookupKind::KdTree
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn lines() -> Vec<Line> {
        [
            [[0.0, 0.0, 3.0], [1.0, 1.0, 2.0]],
            [[1.0, 1.0, 2.0], [2.0, 2.0, 1.0]],
            [[1.0, 1.0, 2.0], [2.0, 0.0, 1.0]],
            [[1.0, 1.0000001, 2.0], [3.0, 3.0, 1.0]],
        ]
        .into_iter()
        .enumerate()
        .map(|(row, points)| {
            Line::from_geometry(row as i64, &Geometry::line_string_z(points)).expect("valid line")
        })
        .collect()
    }

    #[test]
    fn linear_lookup_matches_exactly() {
        let lookup = LinearLookup::new(&lines());
        assert_eq!(lookup.kind(), LookupKind::Linear);
        assert_eq!(lookup.starting_at([1.0, 1.0]), vec![1, 2]);
        assert_eq!(lookup.starting_at([0.0, 0.0]), vec![0]);
        assert!(lookup.starting_at([5.0, 5.0]).is_empty());
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn kdtree_lookup_agrees_with_linear() {
        let lines = lines();
        let linear = LinearLookup::new(&lines);
        let indexed = KdTreeLookup::new(&lines);
        assert_eq!(indexed.kind(), LookupKind::KdTree);
        assert_eq!(indexed.len(), 4);
        assert_eq!(indexed.distinct_points(), 3);

        for line in &lines {
            let xy = line.end().xy();
            assert_eq!(indexed.starting_at(xy), linear.starting_at(xy));
        }
        assert_eq!(indexed.starting_at([1.0, 1.0]), vec![1, 2]);
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn kdtree_lookup_holds_more_coincident_starts_than_a_bucket() {
        let shared: Vec<Line> = (0..40)
            .map(|row| {
                let end = [1.0 + row as f64, -1.0, 1.0];
                Line::from_geometry(row, &Geometry::line_string_z([[0.0, 0.0, 2.0], end]))
                    .expect("valid line")
            })
            .collect();
        let indexed = KdTreeLookup::new(&shared);
        assert_eq!(indexed.len(), 40);
        assert_eq!(indexed.distinct_points(), 1);
        assert_eq!(indexed.starting_at([0.0, 0.0]), (0..40).collect::<Vec<_>>());
        assert_eq!(indexed.starting_at([-0.0, 0.0]), (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn build_lookup_honours_strategy() {
        let lines = lines();
        assert_eq!(
            build_lookup(LookupStrategy::Linear, &lines).kind(),
            LookupKind::Linear
        );
        let expected = if SPATIAL_INDEX_AVAILABLE {
            LookupKind::KdTree
        } else {
            LookupKind::Linear
        };
        assert_eq!(build_lookup(LookupStrategy::Auto, &lines).kind(), expected);
    }
}
