use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use gitweave_core::config::GitweaveConfig;
use gitweave_core::export::write_tsv;

use super::{LogArgs, load_log, open_output};

#[derive(Args, Debug)]
pub struct TsvArgs {
    #[command(flatten)]
    pub log: LogArgs,

    /// Tags to leave out (repeatable; default from config: message, changes)
    #[arg(long = "skip", value_name = "TAG")]
    pub skip: Vec<String>,

    /// Write to FILE instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &TsvArgs, config: &GitweaveConfig) -> anyhow::Result<()> {
    let log = load_log(&args.log, config)?;
    let skip = if args.skip.is_empty() {
        &config.export.tsv_ignore
    } else {
        &args.skip
    };

    let mut out = open_output(args.out.as_deref())?;
    write_tsv(&mut out, &log, skip)?;
    out.flush()?;
    Ok(())
}
