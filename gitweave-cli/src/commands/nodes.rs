use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gitweave_core::classify::{node_attribute, node_colours};
use gitweave_core::config::GitweaveConfig;
use gitweave_core::export::write_nodes;
use gitweave_core::log::NodeSpec;

use super::{LogArgs, NetworkArgs, load_log, open_output, write_json};

#[derive(Args, Debug)]
pub struct NodesArgs {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub network: NetworkArgs,

    /// Add a `colour` attribute classifying authors and source files
    #[arg(long)]
    pub colour: bool,

    /// CSV columns after id,type (repeatable; default: the node attributes)
    #[arg(long = "column", value_name = "ATTR")]
    pub columns: Vec<String>,

    /// Output format: csv, json
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    pub format: String,

    /// Write to FILE instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Every attribute the node spec copies, without duplicates.
fn spec_columns(spec: &NodeSpec) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    let all = spec
        .mode1_atom_attrs
        .iter()
        .chain(&spec.mode1_vector_attrs)
        .chain(&spec.mode2_atom_attrs)
        .chain(&spec.mode2_vector_attrs);
    for name in all {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    columns
}

pub fn run(args: &NodesArgs, config: &GitweaveConfig) -> anyhow::Result<()> {
    let log = load_log(&args.log, config)?;
    let preset = args.network.resolve(config)?;
    let mut nodes = log.generate_nodes(&preset.mode1, &preset.mode2, &preset.nodes);
    if args.colour {
        node_attribute(&mut nodes, "colour", node_colours);
    }

    let mut out = open_output(args.out.as_deref())?;
    if args.format == "json" {
        write_json(&mut out, &nodes)?;
    } else {
        let mut columns = if !args.columns.is_empty() {
            args.columns.clone()
        } else if !config.export.node_columns.is_empty() {
            config.export.node_columns.clone()
        } else {
            spec_columns(&preset.nodes)
        };
        if args.colour && !columns.iter().any(|c| c == "colour") {
            columns.push("colour".to_string());
        }
        write_nodes(&mut out, &nodes, &columns)?;
    }
    out.flush()?;

    info!(nodes = nodes.len(), "Done");
    Ok(())
}
