use std::collections::HashMap;

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::info;

use crate::config::{LookupStrategy, NetworkOptions};
use crate::error::{Error, Result};
use crate::geometry::{Geometry, Line, LineId};
use crate::reach::ReachTable;
use crate::spatial::{build_lookup, EndpointLookup, LookupKind};
use crate::table::LineTable;
use crate::topology::{self, Evaluation};
use crate::warning::NetworkWarning;

/// Surface water network built from stream segment lines.
///
/// Construction validates the lines; topology is derived separately by
/// [`Network::evaluate_reaches`], which may be called any number of times and
/// always recomputes every derived table from the immutable lines.
#[derive(Debug)]
pub struct Network {
    lines: Vec<Line>,
    positions: HashMap<LineId, usize>,
    options: NetworkOptions,
    lookup: OnceCell<Box<dyn EndpointLookup>>,
    evaluation: Option<Evaluation>,
}

impl Network {
    /// Validate `table` and construct an unevaluated network.
    pub fn new(table: LineTable) -> Result<Self> {
        Self::with_options(table, NetworkOptions::default())
    }

    /// Construct with explicit options.
    pub fn with_options(table: LineTable, options: NetworkOptions) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::NoLines);
        }

        // Geometry types are checked across all rows before any vertex checks.
        if let Some((id, geometry)) = table
            .iter()
            .find(|(_, geometry)| !matches!(geometry, Geometry::LineString(_)))
        {
            return Err(Error::WrongGeometryType {
                id,
                found: geometry.kind(),
            });
        }

        let lines = table
            .iter()
            .map(|(id, geometry)| Line::from_geometry(id, geometry))
            .collect::<Result<Vec<_>>>()?;

        // Input problems take precedence over option problems.
        options.validate()?;

        let positions = lines
            .iter()
            .enumerate()
            .map(|(row, line)| (line.id(), row))
            .collect();

        info!(
            lines = lines.len(),
            lookup = %options.lookup,
            "constructed surface water network"
        );

        Ok(Self {
            lines,
            positions,
            options,
            lookup: OnceCell::new(),
            evaluation: None,
        })
    }

    /// Construct from the column-oriented JSON table form.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::new(LineTable::from_value(value)?)
    }

    /// Construct from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(LineTable::from_json_str(json)?)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always false; a network holds at least one line.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.positions.get(&id).map(|&row| &self.lines[row])
    }

    pub fn options(&self) -> &NetworkOptions {
        &self.options
    }

    /// Requested endpoint lookup strategy.
    pub fn lookup_strategy(&self) -> LookupStrategy {
        self.options.lookup
    }

    /// Lookup implementation, once the first evaluation has built it.
    pub fn lookup_kind(&self) -> Option<LookupKind> {
        self.lookup.get().map(|lookup| lookup.kind())
    }

    /// Derive the reach table, outlets, headwaters and catchment groups.
    ///
    /// Recoverable problems are logged and available from
    /// [`Network::warnings`]; this never fails.
    pub fn evaluate_reaches(&mut self) -> &ReachTable {
        let lines = &self.lines;
        let strategy = self.options.lookup;
        let lookup = self.lookup.get_or_init(|| build_lookup(strategy, lines));

        let evaluation = topology::evaluate(lines, lookup.as_ref());
        info!(
            lines = lines.len(),
            outlets = evaluation.outlets().len(),
            headwaters = evaluation.headwaters().len(),
            warnings = evaluation.warnings().len(),
            end_node = evaluation.end_node(),
            "evaluated reaches"
        );

        self.evaluation.insert(evaluation).reaches()
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluation.is_some()
    }

    /// Full result of the last evaluation.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn reaches(&self) -> Option<&ReachTable> {
        self.evaluation.as_ref().map(Evaluation::reaches)
    }

    pub fn outlets(&self) -> Option<&[LineId]> {
        self.evaluation.as_ref().map(Evaluation::outlets)
    }

    pub fn headwaters(&self) -> Option<&[LineId]> {
        self.evaluation.as_ref().map(Evaluation::headwaters)
    }

    /// Terminal marker used in `to_node`; `None` until evaluated.
    pub fn end_node(&self) -> Option<LineId> {
        self.evaluation.as_ref().map(Evaluation::end_node)
    }

    /// Warnings from the last evaluation; empty before the first one.
    pub fn warnings(&self) -> &[NetworkWarning] {
        self.evaluation
            .as_ref()
            .map(Evaluation::warnings)
            .unwrap_or(&[])
    }

    pub fn catchment_sizes(&self) -> Option<Vec<(LineId, usize)>> {
        self.evaluation.as_ref().map(Evaluation::catchment_sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::basic_table;

    #[test]
    fn starts_unevaluated() {
        let network = Network::new(basic_table()).expect("valid network");
        assert_eq!(network.len(), 3);
        assert!(!network.is_evaluated());
        assert!(network.reaches().is_none());
        assert!(network.outlets().is_none());
        assert!(network.end_node().is_none());
        assert!(network.lookup_kind().is_none());
        assert!(network.warnings().is_empty());
    }

    #[test]
    fn lookup_is_built_once() {
        let mut network = Network::new(basic_table()).expect("valid network");
        network.evaluate_reaches();
        let kind = network.lookup_kind();
        assert!(kind.is_some());
        network.evaluate_reaches();
        assert_eq!(network.lookup_kind(), kind);
    }

    #[test]
    fn line_lookup_by_id() {
        let network = Network::new(basic_table()).expect("valid network");
        let line = network.line(2).expect("line 2 exists");
        assert_eq!(line.start().xy(), [60.0, 100.0]);
        assert!(network.line(3).is_none());
    }
}
