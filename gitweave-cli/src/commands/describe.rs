use std::io::Write;

use clap::Args;

use gitweave_core::config::GitweaveConfig;

use super::{LogArgs, load_log, open_output, write_json};

#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub log: LogArgs,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Also list emails committed under more than one author name
    #[arg(long)]
    pub dup_emails: bool,
}

pub fn run(args: &DescribeArgs, config: &GitweaveConfig) -> anyhow::Result<()> {
    let mut log = load_log(&args.log, config)?;
    log.source.get_or_insert_with(|| "json input".to_string());
    let summary = log.describe();

    let mut out = open_output(None)?;
    if args.json {
        write_json(&mut out, &summary)?;
    } else {
        writeln!(out, "{summary}")?;
    }
    if args.dup_emails {
        let dups = log.detect_dup_emails();
        if args.json {
            write_json(&mut out, &dups)?;
        } else {
            writeln!(out, "Emails associated with multiple authors:")?;
            for (email, authors) in &dups {
                writeln!(out, "\t{email}: {}", authors.join(", "))?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
