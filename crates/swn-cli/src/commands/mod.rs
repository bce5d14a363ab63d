//! Subcommand handlers.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use swn_lib::{LineTable, LookupStrategy, Network, NetworkOptions};

use crate::output::{
    render_catchments, render_evaluation, render_ids, render_warning_summary, OutputFormat,
};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalOptions {
    pub lookup: LookupStrategy,
    pub format: OutputFormat,
    /// Suppress the warnings summary.
    pub quiet: bool,
}

/// Resolve the lookup strategy: explicit flag, then `SWN_LOOKUP`, then the default.
pub fn resolve_lookup(flag: Option<LookupStrategy>) -> Result<LookupStrategy> {
    if let Some(lookup) = flag {
        return Ok(lookup);
    }
    let from_env = LookupStrategy::from_env()
        .with_context(|| format!("invalid {} value", swn_lib::LOOKUP_ENV_VAR))?;
    Ok(from_env.unwrap_or_default())
}

/// Read a line table from `path` and build an evaluated network.
pub fn load_network(path: &Path, lookup: LookupStrategy) -> Result<Network> {
    let table = LineTable::from_path(path)
        .with_context(|| format!("failed to read line table from {}", path.display()))?;
    debug!(path = %path.display(), rows = table.len(), "loaded line table");

    let mut network = Network::with_options(table, NetworkOptions::with_lookup(lookup))
        .with_context(|| format!("invalid surface water network in {}", path.display()))?;
    network.evaluate_reaches();
    Ok(network)
}

/// Handle `evaluate`: print the reach table.
pub fn handle_evaluate(path: &Path, global: &GlobalOptions) -> Result<()> {
    let network = load_network(path, global.lookup)?;
    let evaluation = network
        .evaluation()
        .context("network was not evaluated")?;

    let mut out = io::stdout().lock();
    render_evaluation(&mut out, evaluation, network.lookup_strategy(), global.format)
        .context("failed to write reach table")?;
    finish(&mut out, &network, global)
}

/// Handle `outlets`: print outlet identifiers in input order.
pub fn handle_outlets(path: &Path, global: &GlobalOptions) -> Result<()> {
    let network = load_network(path, global.lookup)?;
    let outlets = network.outlets().unwrap_or_default();

    let mut out = io::stdout().lock();
    render_ids(&mut out, "outlets", outlets, global.format).context("failed to write outlets")?;
    finish(&mut out, &network, global)
}

/// Handle `headwaters`: print headwater identifiers in input order.
pub fn handle_headwaters(path: &Path, global: &GlobalOptions) -> Result<()> {
    let network = load_network(path, global.lookup)?;
    let headwaters = network.headwaters().unwrap_or_default();

    let mut out = io::stdout().lock();
    render_ids(&mut out, "headwaters", headwaters, global.format)
        .context("failed to write headwaters")?;
    finish(&mut out, &network, global)
}

/// Handle `catchments`: print each outlet with its catchment size.
pub fn handle_catchments(path: &Path, global: &GlobalOptions) -> Result<()> {
    let network = load_network(path, global.lookup)?;
    let evaluation = network
        .evaluation()
        .context("network was not evaluated")?;

    let mut out = io::stdout().lock();
    render_catchments(&mut out, evaluation, global.format)
        .context("failed to write catchments")?;
    finish(&mut out, &network, global)
}

fn finish<W: Write>(out: &mut W, network: &Network, global: &GlobalOptions) -> Result<()> {
    out.flush().context("failed to flush stdout")?;
    if global.quiet || global.format == OutputFormat::Json {
        return Ok(());
    }
    render_warning_summary(&mut io::stderr().lock(), network.warnings())
        .context("failed to write warnings summary")
}
