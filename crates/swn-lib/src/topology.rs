//! Topology evaluation: downstream resolution, elevation checks, node
//! classification and catchment grouping.
//!
//! Everything here is a pure function of the validated lines and the endpoint
//! lookup. The result is assembled in one piece after all resolutions finish.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::geometry::{Line, LineId};
use crate::reach::{Reach, ReachTable};
use crate::spatial::EndpointLookup;
use crate::warning::NetworkWarning;

/// Complete result of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    reaches: ReachTable,
    outlets: Vec<LineId>,
    headwaters: Vec<LineId>,
    warnings: Vec<NetworkWarning>,
    #[serde(skip)]
    upstream: Vec<Vec<usize>>,
}

impl Evaluation {
    pub fn reaches(&self) -> &ReachTable {
        &self.reaches
    }

    /// Lines with no downstream neighbour, in input order.
    pub fn outlets(&self) -> &[LineId] {
        &self.outlets
    }

    /// Lines no other line flows into, in input order.
    pub fn headwaters(&self) -> &[LineId] {
        &self.headwaters
    }

    pub fn warnings(&self) -> &[NetworkWarning] {
        &self.warnings
    }

    pub fn end_node(&self) -> LineId {
        self.reaches.end_node()
    }

    /// `(outlet, member count)` per catchment, in outlet order.
    pub fn catchment_sizes(&self) -> Vec<(LineId, usize)> {
        self.outlets
            .iter()
            .map(|&outlet| {
                let count = self
                    .reaches
                    .iter()
                    .filter(|reach| reach.cat_group == outlet)
                    .count();
                (outlet, count)
            })
            .collect()
    }

    /// Members of the catchment rooted at `outlet`, in input order.
    ///
    /// Returns `None` when `outlet` is not an outlet.
    pub fn catchment(&self, outlet: LineId) -> Option<Vec<LineId>> {
        if !self.outlets.contains(&outlet) {
            return None;
        }
        Some(
            self.reaches
                .iter()
                .filter(|reach| reach.cat_group == outlet)
                .map(|reach| reach.id)
                .collect(),
        )
    }

    /// Lines flowing directly into `id`, in input order.
    pub fn upstream_of(&self, id: LineId) -> Option<Vec<LineId>> {
        let row = self.reaches.position(id)?;
        let reaches = self.reaches.as_slice();
        Some(
            self.upstream[row]
                .iter()
                .map(|&upstream| reaches[upstream].id)
                .collect(),
        )
    }
}

/// Evaluate the topology of `lines`.
pub fn evaluate(lines: &[Line], lookup: &dyn EndpointLookup) -> Evaluation {
    let end_node = choose_end_node(lines);
    let mut warnings = Vec::new();

    let mut downstream: Vec<Option<usize>> = Vec::with_capacity(lines.len());
    for (row, line) in lines.iter().enumerate() {
        let target = resolve_downstream(row, lines, lookup, &mut warnings);
        check_elevations(line, target.map(|target| &lines[target]), &mut warnings);
        downstream.push(target);
    }

    let mut upstream: Vec<Vec<usize>> = vec![Vec::new(); lines.len()];
    for (row, target) in downstream.iter().enumerate() {
        if let Some(target) = *target {
            upstream[target].push(row);
        }
    }

    let outlet_rows: Vec<usize> = (0..lines.len())
        .filter(|&row| downstream[row].is_none())
        .collect();
    let headwaters: Vec<LineId> = (0..lines.len())
        .filter(|&row| upstream[row].is_empty())
        .map(|row| lines[row].id())
        .collect();

    let groups = group_catchments(&outlet_rows, &upstream);

    let unrooted: Vec<LineId> = groups
        .iter()
        .enumerate()
        .filter(|(_, group)| group.is_none())
        .map(|(row, _)| lines[row].id())
        .collect();
    if !unrooted.is_empty() {
        let warning = NetworkWarning::Unrooted { lines: unrooted };
        warn!(%warning, "network contains lines without an outlet");
        warnings.push(warning);
    }

    let reaches = lines
        .iter()
        .enumerate()
        .map(|(row, line)| Reach {
            id: line.id(),
            to_node: downstream[row].map_or(end_node, |target| lines[target].id()),
            cat_group: groups[row].map_or(end_node, |outlet| lines[outlet].id()),
        })
        .collect();

    let outlets: Vec<LineId> = outlet_rows.iter().map(|&row| lines[row].id()).collect();

    debug!(
        lines = lines.len(),
        outlets = outlets.len(),
        headwaters = headwaters.len(),
        warnings = warnings.len(),
        "evaluated reach topology"
    );

    Evaluation {
        reaches: ReachTable::new(end_node, reaches),
        outlets,
        headwaters,
        warnings,
        upstream,
    }
}

/// Pick an identifier that cannot collide with any line.
///
/// `0` when every identifier is positive, otherwise the first unused value
/// counting down from `-1`.
pub fn choose_end_node(lines: &[Line]) -> LineId {
    if lines.iter().all(|line| line.id() > 0) {
        return 0;
    }
    let ids: HashSet<LineId> = lines.iter().map(Line::id).collect();
    let mut candidate: LineId = -1;
    while ids.contains(&candidate) {
        candidate -= 1;
    }
    candidate
}

/// Row of the line that `lines[row]` drains into, if any.
///
/// With several candidates the first in input order wins and a warning is
/// recorded.
fn resolve_downstream(
    row: usize,
    lines: &[Line],
    lookup: &dyn EndpointLookup,
    warnings: &mut Vec<NetworkWarning>,
) -> Option<usize> {
    let line = &lines[row];
    let candidates: Vec<usize> = lookup
        .starting_at(line.end().xy())
        .into_iter()
        .filter(|&candidate| candidate != row)
        .collect();

    let chosen = *candidates.first()?;
    if candidates.len() > 1 {
        let warning = NetworkWarning::AmbiguousDownstream {
            line: line.id(),
            candidates: candidates
                .iter()
                .map(|&candidate| lines[candidate].id())
                .collect(),
            chosen: lines[chosen].id(),
        };
        warn!(line = line.id(), %warning, "ambiguous downstream connection");
        warnings.push(warning);
    }
    Some(chosen)
}

fn check_elevations(line: &Line, target: Option<&Line>, warnings: &mut Vec<NetworkWarning>) {
    let start_z = line.start().z;
    let end_z = line.end().z;
    if start_z < end_z {
        let warning = NetworkWarning::ElevationRise {
            line: line.id(),
            start_z,
            end_z,
        };
        warn!(line = line.id(), %warning, "elevation rises along line");
        warnings.push(warning);
    }

    if let Some(target) = target {
        let downstream_z = target.start().z;
        if end_z != downstream_z {
            let warning = NetworkWarning::ElevationMismatch {
                upstream: line.id(),
                downstream: target.id(),
                upstream_z: end_z,
                downstream_z,
            };
            warn!(
                upstream = line.id(),
                downstream = target.id(),
                %warning,
                "elevation mismatch at shared node"
            );
            warnings.push(warning);
        }
    }
}

/// Walk upstream from every outlet, returning the outlet row for each line.
fn group_catchments(outlet_rows: &[usize], upstream: &[Vec<usize>]) -> Vec<Option<usize>> {
    let mut groups: Vec<Option<usize>> = vec![None; upstream.len()];
    let mut stack = Vec::new();

    for &outlet in outlet_rows {
        stack.push(outlet);
        while let Some(row) = stack.pop() {
            if groups[row].is_some() {
                continue;
            }
            groups[row] = Some(outlet);
            stack.extend(upstream[row].iter().copied());
        }
    }

    groups
}
