pub mod describe;
pub mod edges;
pub mod nodes;
pub mod tsv;

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use tracing::info;

use gitweave_core::config::GitweaveConfig;
use gitweave_core::edges::EdgeHelper;
use gitweave_core::error::InputError;
use gitweave_core::log::{CommitLog, IgnoreMode, NetworkPreset};
use gitweave_core::predicate::Predicate;
use gitweave_core::types::AttrValue;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the author/file edge list of a commit log
    Edges(edges::EdgesArgs),
    /// Write the node list of a commit log network
    Nodes(nodes::NodesArgs),
    /// Dump commit records as tab-separated values
    Tsv(tsv::TsvArgs),
    /// Summarize a commit log
    Describe(describe::DescribeArgs),
}

pub fn run(cmd: Command, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => GitweaveConfig::load(path)
            .with_context(|| format!("Cannot load config: {}", path.display()))?,
        None => GitweaveConfig::default(),
    };

    match cmd {
        Command::Edges(args) => edges::run(&args, &config),
        Command::Nodes(args) => nodes::run(&args, &config),
        Command::Tsv(args) => tsv::run(&args, &config),
        Command::Describe(args) => describe::run(&args, &config),
    }
}

// ── Shared arguments ─────────────────────────────────────────────────

/// Where the commit log comes from and how to narrow it down.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Commit log JSON: an array of records or an object keyed by hash ("-" for stdin)
    #[arg(long, short)]
    pub input: PathBuf,

    /// Keep records matching TAG:FUN:VALUE (repeatable)
    #[arg(long = "filter", value_name = "TAG:FUN:VALUE")]
    pub filters: Vec<String>,

    /// Drop records matching TAG:FUN:VALUE (repeatable)
    #[arg(long = "exclude", value_name = "TAG:FUN:VALUE")]
    pub excludes: Vec<String>,

    /// Remove files whose path matches REGEX (repeatable)
    #[arg(long = "ignore", value_name = "REGEX")]
    pub ignores: Vec<String>,

    /// Keep only matching files instead of removing them
    #[arg(long)]
    pub ignore_no_match: bool,

    /// Replace OLD with NEW in TAG before filtering, e.g. to merge author names (repeatable)
    #[arg(long = "replace", value_name = "TAG:OLD:NEW")]
    pub replaces: Vec<String>,

    /// Add utc_date, utc_datetime, and domain to every record
    #[arg(long)]
    pub annotate: bool,
}

/// Which tags become nodes and how edges are built.
#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// Network preset: author/file/simple, author/file, author/file/weighted
    #[arg(long)]
    pub preset: Option<String>,

    /// Tag whose values become the first node set
    #[arg(long)]
    pub mode1: Option<String>,

    /// Tag whose values become the second node set
    #[arg(long)]
    pub mode2: Option<String>,

    /// Edge generator: simple, changes
    #[arg(long)]
    pub helper: Option<String>,

    /// Record tags copied onto each edge (repeatable)
    #[arg(long = "attr", value_name = "TAG")]
    pub attrs: Vec<String>,
}

impl NetworkArgs {
    /// Config defaults, then the preset, then individual flags.
    pub fn resolve(&self, config: &GitweaveConfig) -> anyhow::Result<NetworkPreset> {
        let mut preset = match &self.preset {
            Some(name) => NetworkPreset::named(name)?,
            None => config.network_preset()?,
        };
        if let Some(mode1) = &self.mode1 {
            preset.mode1.clone_from(mode1);
        }
        if let Some(mode2) = &self.mode2 {
            preset.mode2.clone_from(mode2);
        }
        if let Some(helper) = &self.helper {
            preset.helper = helper.parse::<EdgeHelper>()?;
        }
        if !self.attrs.is_empty() {
            preset.edge_attributes.clone_from(&self.attrs);
        }
        Ok(preset)
    }
}

/// Split `TAG:FUN:VALUE`. The value may itself contain colons.
pub fn parse_filter_spec(spec: &str) -> Result<(String, String, AttrValue), InputError> {
    let mut parts = spec.splitn(3, ':');
    let (Some(tag), Some(fun), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(InputError::MalformedFilter(spec.to_string()));
    };
    if tag.is_empty() || fun.is_empty() {
        return Err(InputError::MalformedFilter(spec.to_string()));
    }
    Ok((tag.to_string(), fun.to_string(), AttrValue::from(value)))
}

/// Split `TAG:OLD:NEW`. The new value may contain colons.
pub fn parse_replace_spec(spec: &str) -> Result<(String, String, String), InputError> {
    let mut parts = spec.splitn(3, ':');
    let (Some(tag), Some(old), Some(new)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(InputError::MalformedReplace(spec.to_string()));
    };
    if tag.is_empty() || old.is_empty() {
        return Err(InputError::MalformedReplace(spec.to_string()));
    }
    Ok((tag.to_string(), old.to_string(), new.to_string()))
}

/// A command-line filter ready to apply.
///
/// A value that looks like an integer is tested both as text and as a
/// number, so `hash:equals:1234567` and `fedits:>=:3` both match.
#[derive(Debug)]
pub struct CliFilter {
    tag: String,
    text: Predicate,
    number: Option<Predicate>,
}

impl CliFilter {
    pub fn parse(spec: &str) -> anyhow::Result<Self> {
        let (tag, fun, value) = parse_filter_spec(spec)?;
        let number = value
            .as_text()
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(|n| Predicate::new(&fun, AttrValue::Int(n)).ok());
        let text = Predicate::new(&fun, value)?;
        Ok(Self { tag, text, number })
    }

    pub fn apply(&self, log: &CommitLog, negate: bool) -> CommitLog {
        match &self.number {
            None => log.filter(&self.tag, &self.text, negate),
            Some(number) => log.filter_with(
                &self.tag,
                |value| self.text.test(value) || number.test(value),
                negate,
                format!("{} {} | Negate: {negate}", self.tag, self.text),
            ),
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    let mut text = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Cannot read input: stdin")?;
    } else {
        text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read input: {}", path.display()))?;
    }
    Ok(text)
}

/// Load the log, then apply config filters and ignores followed by those
/// given on the command line.
pub fn load_log(args: &LogArgs, config: &GitweaveConfig) -> anyhow::Result<CommitLog> {
    let text = read_input(&args.input)?;
    let mut log = CommitLog::from_json(&text)
        .with_context(|| format!("Malformed commit log: {}", args.input.display()))?;
    log.path = Some(args.input.display().to_string());
    let total = log.len();

    for spec in &args.replaces {
        let (tag, old, new) = parse_replace_spec(spec)?;
        log = log.replace_val(&tag, &old, &new);
    }
    for rule in &config.filters {
        log = log.filter(&rule.tag, &rule.predicate()?, rule.negate);
    }
    let cli_rules = args
        .filters
        .iter()
        .map(|s| (s, false))
        .chain(args.excludes.iter().map(|s| (s, true)));
    for (spec, negate) in cli_rules {
        log = CliFilter::parse(spec)?.apply(&log, negate);
    }

    for pattern in &config.ignore.patterns {
        log = log.ignore(pattern, config.ignore.mode)?;
    }
    let mode = if args.ignore_no_match {
        IgnoreMode::NoMatch
    } else {
        IgnoreMode::Match
    };
    for pattern in &args.ignores {
        log = log.ignore(pattern, mode)?;
    }

    if args.annotate {
        log = log.annotate();
    }
    info!(kept = log.len(), total, "Loaded commit log");
    Ok(log)
}

/// Open `--out`, or stdout when absent.
pub fn open_output(out: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file: {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json<T: serde::Serialize>(w: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}
