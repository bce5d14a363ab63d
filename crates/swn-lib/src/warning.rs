use std::fmt;

use serde::Serialize;

use crate::geometry::LineId;

/// Recoverable condition found while evaluating a network.
///
/// Evaluation always completes; these describe why the result may be suspect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkWarning {
    /// More than one line starts where `line` ends. `chosen` is the first
    /// candidate in input order.
    AmbiguousDownstream {
        line: LineId,
        candidates: Vec<LineId>,
        chosen: LineId,
    },
    /// Lines meet in plan but not in elevation at their shared node.
    ElevationMismatch {
        upstream: LineId,
        downstream: LineId,
        upstream_z: f64,
        downstream_z: f64,
    },
    /// The line ends higher than it starts.
    ElevationRise {
        line: LineId,
        start_z: f64,
        end_z: f64,
    },
    /// Lines that never drain to an outlet; only possible with cyclic topology.
    Unrooted { lines: Vec<LineId> },
}

impl NetworkWarning {
    /// Identifiers of every line the warning refers to.
    pub fn lines(&self) -> Vec<LineId> {
        match self {
            NetworkWarning::AmbiguousDownstream {
                line, candidates, ..
            } => std::iter::once(*line)
                .chain(candidates.iter().copied())
                .collect(),
            NetworkWarning::ElevationMismatch {
                upstream,
                downstream,
                ..
            } => vec![*upstream, *downstream],
            NetworkWarning::ElevationRise { line, .. } => vec![*line],
            NetworkWarning::Unrooted { lines } => lines.clone(),
        }
    }
}

impl fmt::Display for NetworkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkWarning::AmbiguousDownstream {
                line,
                candidates,
                chosen,
            } => write!(
                f,
                "line {line} has {} downstream candidates {}; using {chosen}",
                candidates.len(),
                join_ids(candidates)
            ),
            NetworkWarning::ElevationMismatch {
                upstream,
                downstream,
                upstream_z,
                downstream_z,
            } => write!(
                f,
                "line {upstream} ends at elevation {upstream_z} but downstream line \
                 {downstream} starts at {downstream_z}"
            ),
            NetworkWarning::ElevationRise {
                line,
                start_z,
                end_z,
            } => write!(
                f,
                "line {line} rises from elevation {start_z} to {end_z} along its flow direction"
            ),
            NetworkWarning::Unrooted { lines } => write!(
                f,
                "{} line(s) do not drain to any outlet: {}",
                lines.len(),
                join_ids(lines)
            ),
        }
    }
}

fn join_ids(ids: &[LineId]) -> String {
    format!(
        "[{}]",
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}
