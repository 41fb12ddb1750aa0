use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gitweave_core::config::GitweaveConfig;
use gitweave_core::edges::collapse_edges;
use gitweave_core::export::write_edges;

use super::{LogArgs, NetworkArgs, load_log, open_output, write_json};

#[derive(Args, Debug)]
pub struct EdgesArgs {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub network: NetworkArgs,

    /// CSV columns after id1,id2 (repeatable; default from config)
    #[arg(long = "column", value_name = "ATTR")]
    pub columns: Vec<String>,

    /// Merge parallel edges, weighting each by how many were merged
    #[arg(long)]
    pub collapse: bool,

    /// With --collapse, add up edge weights instead of counting edges
    #[arg(long, requires = "collapse")]
    pub sum_weights: bool,

    /// Output format: csv, json
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    pub format: String,

    /// Write to FILE instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &EdgesArgs, config: &GitweaveConfig) -> anyhow::Result<()> {
    let log = load_log(&args.log, config)?;
    let preset = args.network.resolve(config)?;
    let mut edges = log.generate_edges(
        &preset.mode1,
        &preset.mode2,
        preset.helper,
        &preset.edge_attributes,
    );
    if args.collapse {
        edges = collapse_edges(&edges, args.sum_weights);
    }

    let mut out = open_output(args.out.as_deref())?;
    if args.format == "json" {
        write_json(&mut out, &edges)?;
    } else {
        let columns = if args.columns.is_empty() {
            &config.export.edge_columns
        } else {
            &args.columns
        };
        write_edges(&mut out, &edges, columns)?;
    }
    out.flush()?;

    info!(edges = edges.len(), "Done");
    Ok(())
}
