use std::collections::HashMap;

use serde::Serialize;

use crate::geometry::LineId;

/// Derived topology for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reach {
    pub id: LineId,
    /// Downstream line, or the network's end node when the line is an outlet.
    pub to_node: LineId,
    /// Outlet line whose catchment this line belongs to.
    pub cat_group: LineId,
}

/// Reach rows indexed identically to the input line table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReachTable {
    end_node: LineId,
    reaches: Vec<Reach>,
    #[serde(skip)]
    positions: HashMap<LineId, usize>,
}

impl ReachTable {
    pub(crate) fn new(end_node: LineId, reaches: Vec<Reach>) -> Self {
        let positions = reaches
            .iter()
            .enumerate()
            .map(|(row, reach)| (reach.id, row))
            .collect();
        Self {
            end_node,
            reaches,
            positions,
        }
    }

    /// Terminal marker used in `to_node` for outlets.
    pub fn end_node(&self) -> LineId {
        self.end_node
    }

    pub fn len(&self) -> usize {
        self.reaches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reaches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reach> {
        self.reaches.iter()
    }

    pub fn as_slice(&self) -> &[Reach] {
        &self.reaches
    }

    /// Look up the reach for a line identifier.
    pub fn get(&self, id: LineId) -> Option<&Reach> {
        self.positions.get(&id).map(|&row| &self.reaches[row])
    }

    /// Row position of a line identifier.
    pub fn position(&self, id: LineId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn ids(&self) -> Vec<LineId> {
        self.reaches.iter().map(|reach| reach.id).collect()
    }

    /// The `to_node` column.
    pub fn to_nodes(&self) -> Vec<LineId> {
        self.reaches.iter().map(|reach| reach.to_node).collect()
    }

    /// The `cat_group` column.
    pub fn cat_groups(&self) -> Vec<LineId> {
        self.reaches.iter().map(|reach| reach.cat_group).collect()
    }

    /// Downstream line of `id`; `None` for outlets and unknown identifiers.
    pub fn downstream(&self, id: LineId) -> Option<LineId> {
        self.get(id)
            .map(|reach| reach.to_node)
            .filter(|&to_node| to_node != self.end_node)
    }

    /// Map every line to a value derived from its reach, e.g. for rendering.
    pub fn attribute_map<V, F>(&self, mut value: F) -> HashMap<LineId, V>
    where
        F: FnMut(&Reach) -> V,
    {
        self.reaches
            .iter()
            .map(|reach| (reach.id, value(reach)))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ReachTable {
    type Item = &'a Reach;
    type IntoIter = std::slice::Iter<'a, Reach>;

    fn into_iter(self) -> Self::IntoIter {
        self.reaches.iter()
    }
}
