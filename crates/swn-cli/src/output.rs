//! Output formatting for evaluation results.
//!
//! Every renderer writes to a caller-supplied [`Write`] so the same code serves
//! stdout and tests. Text output is tab separated; JSON output is a single
//! pretty-printed document per command.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use swn_lib::{Evaluation, LineId, LookupStrategy, NetworkWarning, Reach};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct EvaluateReport<'a> {
    lines: usize,
    lookup: LookupStrategy,
    end_node: LineId,
    reaches: &'a [Reach],
    outlets: &'a [LineId],
    headwaters: &'a [LineId],
    warnings: &'a [NetworkWarning],
}

#[derive(Serialize)]
struct CatchmentRow {
    outlet: LineId,
    size: usize,
}

/// Render the full reach table.
pub fn render_evaluation<W: Write>(
    out: &mut W,
    evaluation: &Evaluation,
    lookup: LookupStrategy,
    format: OutputFormat,
) -> io::Result<()> {
    let reaches = evaluation.reaches();
    match format {
        OutputFormat::Json => write_json(
            out,
            &EvaluateReport {
                lines: reaches.len(),
                lookup,
                end_node: evaluation.end_node(),
                reaches: reaches.as_slice(),
                outlets: evaluation.outlets(),
                headwaters: evaluation.headwaters(),
                warnings: evaluation.warnings(),
            },
        ),
        OutputFormat::Text => {
            writeln!(out, "id\tto_node\tcat_group")?;
            for reach in reaches {
                writeln!(out, "{}\t{}\t{}", reach.id, reach.to_node, reach.cat_group)?;
            }
            writeln!(
                out,
                "\n{} lines: {} outlet(s), {} headwater(s), end node {}",
                reaches.len(),
                evaluation.outlets().len(),
                evaluation.headwaters().len(),
                evaluation.end_node()
            )
        }
    }
}

/// Render a list of line identifiers under `key`.
pub fn render_ids<W: Write>(
    out: &mut W,
    key: &str,
    ids: &[LineId],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json(out, &serde_json::json!({ key: ids })),
        OutputFormat::Text => {
            for id in ids {
                writeln!(out, "{id}")?;
            }
            Ok(())
        }
    }
}

/// Render `(outlet, size)` per catchment.
pub fn render_catchments<W: Write>(
    out: &mut W,
    evaluation: &Evaluation,
    format: OutputFormat,
) -> io::Result<()> {
    let rows: Vec<CatchmentRow> = evaluation
        .catchment_sizes()
        .into_iter()
        .map(|(outlet, size)| CatchmentRow { outlet, size })
        .collect();

    match format {
        OutputFormat::Json => write_json(
            out,
            &serde_json::json!({
                "end_node": evaluation.end_node(),
                "catchments": rows,
            }),
        ),
        OutputFormat::Text => {
            writeln!(out, "outlet\tsize")?;
            for row in &rows {
                writeln!(out, "{}\t{}", row.outlet, row.size)?;
            }
            Ok(())
        }
    }
}

/// Human-readable warnings summary; writes nothing when there are none.
pub fn render_warning_summary<W: Write>(out: &mut W, warnings: &[NetworkWarning]) -> io::Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }
    let noun = if warnings.len() == 1 { "warning" } else { "warnings" };
    writeln!(out, "{} {noun}:", warnings.len())?;
    for warning in warnings {
        writeln!(out, "  - {warning}")?;
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swn_lib::{Geometry, LineTable, Network};

    fn evaluation() -> Evaluation {
        let table = LineTable::from_geometries([
            Geometry::line_string_z([[40.0, 130.0, 15.0], [60.0, 100.0, 14.0]]),
            Geometry::line_string_z([[70.0, 130.0, 15.0], [60.0, 100.0, 14.0]]),
            Geometry::line_string_z([[60.0, 100.0, 14.0], [60.0, 80.0, 12.0]]),
        ]);
        let mut network = Network::new(table).expect("valid network");
        network.evaluate_reaches();
        network.evaluation().cloned().expect("evaluated")
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).expect("write to buffer");
        String::from_utf8(buffer).expect("utf8")
    }

    #[test]
    fn text_reach_table() {
        let evaluation = evaluation();
        let text = render(|out| {
            render_evaluation(out, &evaluation, LookupStrategy::Auto, OutputFormat::Text)
        });
        assert!(text.starts_with("id\tto_node\tcat_group\n0\t2\t2\n1\t2\t2\n2\t-1\t2\n"));
        assert!(text.contains("3 lines: 1 outlet(s), 2 headwater(s), end node -1"));
    }

    #[test]
    fn json_reach_table() {
        let evaluation = evaluation();
        let text = render(|out| {
            render_evaluation(out, &evaluation, LookupStrategy::Linear, OutputFormat::Json)
        });
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["lookup"], "linear");
        assert_eq!(value["end_node"], -1);
        assert_eq!(value["reaches"][2]["cat_group"], 2);
    }

    #[test]
    fn catchments_and_ids() {
        let evaluation = evaluation();
        let text = render(|out| render_catchments(out, &evaluation, OutputFormat::Text));
        assert_eq!(text, "outlet\tsize\n2\t3\n");

        let json = render(|out| render_ids(out, "outlets", &[2], OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["outlets"], serde_json::json!([2]));
    }

    #[test]
    fn warning_summary_is_silent_without_warnings() {
        assert!(render(|out| render_warning_summary(out, &[])).is_empty());

        let warnings = [NetworkWarning::ElevationRise {
            line: 4,
            start_z: 1.0,
            end_z: 2.0,
        }];
        let text = render(|out| render_warning_summary(out, &warnings));
        assert!(text.starts_with("1 warning:\n  - "));
    }
}
