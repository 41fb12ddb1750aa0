// Commit log collection: filtering, annotation, and network generation.
//
// A `CommitLog` owns an ordered set of records keyed by short hash. Every
// transformation returns a new log and appends a summary to `filters`, so a
// derived log always records how it was obtained from the parsed input.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::date::{make_utc_date, make_utc_datetime, parse_git_date};
use crate::domain::{email_domain, make_domain};
use crate::edges::EdgeHelper;
use crate::error::{InputError, PredicateError, Result};
use crate::frequency::most_common;
use crate::predicate::Predicate;
use crate::types::{AttrValue, COMMIT_TAGS, CommitRecord, Edge, NodeAttributes};

/// Pseudo-tag that makes [`CommitLog::filter`] test every tag of a record.
pub const ANY_TAG: &str = "any";

/// Whether [`CommitLog::ignore`] drops the files that match or those that don't.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IgnoreMode {
    #[default]
    Match,
    NoMatch,
}

impl FromStr for IgnoreMode {
    type Err = InputError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "match" => Ok(Self::Match),
            "no-match" | "no match" => Ok(Self::NoMatch),
            other => Err(InputError::UnknownIgnoreMode(other.to_string())),
        }
    }
}

/// Attributes copied onto generated nodes.
///
/// Atom attributes are taken from the first record a node appears in;
/// vector attributes accumulate one value per record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub mode1_atom_attrs: Vec<String>,
    pub mode1_vector_attrs: Vec<String>,
    pub mode2_atom_attrs: Vec<String>,
    pub mode2_vector_attrs: Vec<String>,
}

/// A named bundle of network generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPreset {
    pub mode1: String,
    pub mode2: String,
    pub helper: EdgeHelper,
    pub edge_attributes: Vec<String>,
    pub nodes: NodeSpec,
}

fn strings(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| (*t).to_string()).collect()
}

impl NetworkPreset {
    /// Look up a preset: `author/file/simple`, `author/file`, or
    /// `author/file/weighted`.
    pub fn named(name: &str) -> std::result::Result<Self, InputError> {
        let author_file_nodes = NodeSpec {
            mode1_atom_attrs: strings(&["email"]),
            mode1_vector_attrs: strings(&["hash", "fedits"]),
            mode2_atom_attrs: Vec::new(),
            mode2_vector_attrs: strings(&["date", "hash"]),
        };
        let base = Self {
            mode1: "author".to_string(),
            mode2: "files".to_string(),
            helper: EdgeHelper::Simple,
            edge_attributes: Vec::new(),
            nodes: NodeSpec::default(),
        };
        match name {
            "author/file/simple" => Ok(base),
            "author/file" => Ok(Self {
                edge_attributes: strings(&["author", "hash"]),
                nodes: author_file_nodes,
                ..base
            }),
            "author/file/weighted" => Ok(Self {
                helper: EdgeHelper::Changes,
                edge_attributes: strings(&["author", "hash", "date"]),
                nodes: author_file_nodes,
                ..base
            }),
            other => Err(InputError::UnknownPreset(other.to_string())),
        }
    }
}

/// Nodes and edges of a generated network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    pub nodes: Vec<(String, NodeAttributes)>,
    pub edges: Vec<Edge>,
}

/// Node ids contributed by one tag value: list elements, map keys, or the
/// value itself.
fn node_ids(value: &AttrValue) -> Vec<String> {
    match value {
        AttrValue::List(items) => items.iter().map(ToString::to_string).collect(),
        AttrValue::Map(map) => map.keys().cloned().collect(),
        scalar => vec![scalar.to_string()],
    }
}

fn value_matches(test: &impl Fn(&AttrValue) -> bool, value: &AttrValue) -> bool {
    if let AttrValue::List(items) = value {
        if items.iter().any(test) {
            return true;
        }
    }
    test(value)
}

/// Ordered collection of commit records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CommitLogRepr")]
pub struct CommitLog {
    records: Vec<(String, CommitRecord)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    /// Where the records came from (e.g. `local git`).
    pub source: Option<String>,
    /// Repository path the records were read from.
    pub path: Option<String>,
    /// Summaries of the filters and ignores applied so far.
    pub filters: Vec<String>,
}

/// Serialized form of [`CommitLog`]; the key index is rebuilt on load.
#[derive(Deserialize)]
struct CommitLogRepr {
    records: Vec<(String, CommitRecord)>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    filters: Vec<String>,
}

impl From<CommitLogRepr> for CommitLog {
    fn from(repr: CommitLogRepr) -> Self {
        let mut log = Self {
            source: repr.source,
            path: repr.path,
            filters: repr.filters,
            ..Self::default()
        };
        for (key, record) in repr.records {
            log.insert(key, record);
        }
        log
    }
}

impl CommitLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log keyed by each record's `hash`, or its position when the
    /// hash is missing.
    pub fn from_records(records: impl IntoIterator<Item = CommitRecord>) -> Self {
        let mut log = Self::new();
        for (i, record) in records.into_iter().enumerate() {
            let key = record.hash.clone().unwrap_or_else(|| i.to_string());
            log.insert(key, record);
        }
        log
    }

    /// Parse a JSON array of records, or an object mapping hash → record.
    ///
    /// Records are decoded one at a time; one that does not fit the record
    /// shape is logged with its position and skipped.
    pub fn from_json(json: &str) -> Result<Self> {
        use serde_json::Value;

        let mut log = Self::new();
        let mut skipped = 0_usize;
        match serde_json::from_str::<Value>(json)? {
            Value::Array(items) => {
                for (i, item) in items.into_iter().enumerate() {
                    match serde_json::from_value::<CommitRecord>(item) {
                        Ok(record) => {
                            let key = record.hash.clone().unwrap_or_else(|| i.to_string());
                            log.insert(key, record);
                        }
                        Err(e) => {
                            warn!(index = i, error = %e, "Skipping malformed commit record");
                            skipped += 1;
                        }
                    }
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    match serde_json::from_value::<CommitRecord>(item) {
                        Ok(mut record) => {
                            if record.hash.is_none() {
                                record.hash = Some(key.clone());
                            }
                            log.insert(key, record);
                        }
                        Err(e) => {
                            warn!(key = key.as_str(), error = %e, "Skipping malformed commit record");
                            skipped += 1;
                        }
                    }
                }
            }
            other => {
                let found = match other {
                    Value::Null => "null",
                    Value::Bool(_) => "a boolean",
                    Value::Number(_) => "a number",
                    _ => "a string",
                };
                return Err(InputError::MalformedLog(found.to_string()).into());
            }
        }
        debug!(records = log.len(), skipped, "Loaded commit log");
        Ok(log)
    }

    /// Insert or replace the record stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, record: CommitRecord) {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            self.records[i].1 = record;
        } else {
            self.index.insert(key.clone(), self.records.len());
            self.records.push((key, record));
        }
    }

    pub fn get(&self, key: &str) -> Option<&CommitRecord> {
        self.index.get(key).map(|&i| &self.records[i].1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommitRecord)> {
        self.records.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|(k, _)| k.as_str())
    }

    /// Copy of this log holding only the records `keep` accepts, with
    /// `summary` appended to the filter history.
    fn derive(&self, summary: String, keep: impl Fn(&CommitRecord) -> bool) -> Self {
        let mut out = Self {
            source: self.source.clone(),
            path: self.path.clone(),
            filters: self.filters.clone(),
            ..Self::default()
        };
        out.filters.push(summary);
        for (key, record) in &self.records {
            if keep(record) {
                out.insert(key.clone(), record.clone());
            }
        }
        out
    }

    /// Every tag present in the log, canonical tags first.
    pub fn attributes(&self) -> Vec<String> {
        let present: BTreeSet<String> = self.records.iter().flat_map(|(_, r)| r.tags()).collect();
        let mut ordered: Vec<String> = COMMIT_TAGS
            .iter()
            .filter(|tag| present.contains(**tag))
            .map(|tag| (*tag).to_string())
            .collect();
        ordered.extend(
            present
                .into_iter()
                .filter(|tag| !COMMIT_TAGS.contains(&tag.as_str())),
        );
        ordered
    }

    /// All values of `tag` across the log, with list values flattened.
    pub fn vector(&self, tag: &str) -> Vec<AttrValue> {
        let mut out = Vec::new();
        for (_, record) in &self.records {
            match record.get(tag) {
                Some(AttrValue::List(items)) => out.extend(items),
                Some(value) => out.push(value),
                None => {}
            }
        }
        out
    }

    /// Keep the records whose `tag` satisfies `predicate`.
    ///
    /// List values match when any element does. The tag [`ANY_TAG`] tests
    /// every tag of the record. `negate` keeps the complement instead.
    pub fn filter(&self, tag: &str, predicate: &Predicate, negate: bool) -> Self {
        if tag == "date" && predicate.is_ordering() {
            warn!(
                predicate = %predicate,
                "Dates compared lexicographically; use since/before for chronological comparison"
            );
        }

        let summary = format!("{tag} {predicate} | Negate: {negate}");
        self.filter_with(tag, |value| predicate.test(value), negate, summary)
    }

    /// Keep the records whose `tag` passes a caller-supplied `test`.
    ///
    /// Matching follows [`CommitLog::filter`]; `summary` is recorded in the
    /// filter history in place of a predicate description.
    pub fn filter_with(
        &self,
        tag: &str,
        test: impl Fn(&AttrValue) -> bool,
        negate: bool,
        summary: impl Into<String>,
    ) -> Self {
        let out = self.derive(summary.into(), |record| {
            let hit = if tag == ANY_TAG {
                record
                    .tags()
                    .iter()
                    .filter_map(|t| record.get(t))
                    .any(|value| value_matches(&test, &value))
            } else {
                record
                    .get(tag)
                    .is_some_and(|value| value_matches(&test, &value))
            };
            hit != negate
        });
        debug!(tag, kept = out.len(), of = self.len(), "Filtered commit log");
        out
    }

    /// Shorthand for building the predicate by name and filtering.
    pub fn filter_by(
        &self,
        tag: &str,
        fun: &str,
        value: impl Into<AttrValue>,
        negate: bool,
    ) -> std::result::Result<Self, PredicateError> {
        let predicate = Predicate::new(fun, value.into())?;
        Ok(self.filter(tag, &predicate, negate))
    }

    /// Drop files whose path matches `pattern` (or, with
    /// [`IgnoreMode::NoMatch`], those that don't) from `files` and `changes`.
    pub fn ignore(
        &self,
        pattern: &str,
        mode: IgnoreMode,
    ) -> std::result::Result<Self, PredicateError> {
        let re = Regex::new(pattern).map_err(|source| PredicateError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let keep_file = |file: &str| re.is_match(file) == (mode == IgnoreMode::NoMatch);

        let note = match mode {
            IgnoreMode::Match => "matches",
            IgnoreMode::NoMatch => "doesn't match",
        };
        let mut out = self.derive(
            format!("Ignore files that {note} the regular expression: {pattern}"),
            |_| true,
        );
        for (_, record) in &mut out.records {
            if let Some(files) = record.files.as_mut() {
                files.retain(|f| keep_file(f.as_str()));
            }
            if let Some(changes) = record.changes.as_mut() {
                changes.retain(|f, _| keep_file(f.as_str()));
            }
        }
        Ok(out)
    }

    /// Copy of this log with every `current` value of `tag` replaced by `new`.
    ///
    /// Applies to text tags and to the elements of list tags such as
    /// `files`. Used to merge the names an author has committed under.
    pub fn replace_val(&self, tag: &str, current: &str, new: &str) -> Self {
        let mut out = self.clone();
        let replaced: usize = out
            .records
            .iter_mut()
            .map(|(_, record)| record.replace_text(tag, current, new))
            .sum();
        if replaced > 0 {
            info!(tag, current, new, replaced, "Replaced values");
        } else if self.records.iter().any(|(_, r)| r.contains(tag)) {
            warn!(tag, current, "Value does not appear in any record");
        } else {
            warn!(tag, "Tag does not appear in this log");
        }
        out
    }

    /// Distinct `(email, author)` pairs, sorted by email.
    ///
    /// Records missing either tag are left out.
    pub fn author_email_list(&self) -> Vec<(String, String)> {
        let pairs: BTreeSet<(String, String)> = self
            .records
            .iter()
            .filter_map(|(_, r)| Some((r.email.clone()?, r.author.clone()?)))
            .collect();
        pairs.into_iter().collect()
    }

    /// Emails used under more than one author name, each mapped to those
    /// names in order of first appearance.
    pub fn detect_dup_emails(&self) -> BTreeMap<String, Vec<String>> {
        let mut authors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (_, record) in &self.records {
            let (Some(email), Some(author)) = (&record.email, &record.author) else {
                continue;
            };
            let names = authors.entry(email.clone()).or_default();
            if !names.contains(author) {
                names.push(author.clone());
            }
        }
        authors.retain(|_, names| names.len() > 1);
        if !authors.is_empty() {
            info!(emails = authors.len(), "Found emails shared by several authors");
        }
        authors
    }

    /// Add `cu_auth_changes` to every record with files.
    ///
    /// For each file of the commit the tag holds `file:weight`, where weight
    /// is the sum of the author's `changes` to that file over all of their
    /// commits dated at or before this one. Files the author never has
    /// change counts for are left out. Records lacking an author or a
    /// parseable date are not tagged.
    pub fn generate_cu_auth_changes(&self) -> Self {
        let dated: Vec<(&str, DateTime<Utc>, &CommitRecord)> = self
            .records
            .iter()
            .filter_map(|(_, r)| {
                let author = r.author.as_deref()?;
                let date = parse_git_date(r.date.as_deref()?)?;
                Some((author, date.with_timezone(&Utc), r))
            })
            .collect();

        let tags: Vec<Option<AttrValue>> = self
            .records
            .par_iter()
            .map(|(_, record)| {
                let files = record.files.as_ref()?;
                let author = record.author.as_deref()?;
                let date = parse_git_date(record.date.as_deref()?)?.with_timezone(&Utc);

                let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
                for (_, _, earlier) in dated.iter().filter(|(a, d, _)| *a == author && *d <= date) {
                    for (file, weight) in earlier.changes.iter().flatten() {
                        *totals.entry(file.as_str()).or_default() += weight;
                    }
                }
                let cumulative: Vec<AttrValue> = files
                    .iter()
                    .filter_map(|f| {
                        totals
                            .get(f.as_str())
                            .map(|w| AttrValue::from(format!("{f}:{w}")))
                    })
                    .collect();
                Some(AttrValue::List(cumulative))
            })
            .collect();

        let mut out = self.clone();
        let mut tagged = 0_usize;
        for ((_, record), value) in out.records.iter_mut().zip(tags) {
            if let Some(value) = value {
                record.set_extra("cu_auth_changes", Some(value));
                tagged += 1;
            }
        }
        debug!(tagged, of = self.len(), "Computed cumulative author changes");
        out
    }

    /// Add `utc_date`, `utc_datetime`, and `domain` to every record.
    pub fn annotate(&self) -> Self {
        let mut out = self.clone();
        for (_, record) in &mut out.records {
            let utc_date = make_utc_date(record).map(AttrValue::Text);
            let utc_datetime = make_utc_datetime(record).map(AttrValue::Text);
            let domain = make_domain(record).map(AttrValue::Text);
            record.set_extra("utc_date", utc_date);
            record.set_extra("utc_datetime", utc_datetime);
            record.set_extra("domain", domain);
        }
        out
    }

    /// Bipartite edges between the values of `mode1` and `mode2` in each
    /// record that has both tags.
    pub fn generate_edges(
        &self,
        mode1: &str,
        mode2: &str,
        helper: EdgeHelper,
        edge_attributes: &[String],
    ) -> Vec<Edge> {
        let edges: Vec<Edge> = self
            .records
            .par_iter()
            .flat_map_iter(|(_, record)| {
                let pairs: Vec<(String, String)> = match (record.get(mode1), record.get(mode2)) {
                    (Some(v1), Some(v2)) => {
                        let targets = node_ids(&v2);
                        node_ids(&v1)
                            .into_iter()
                            .flat_map(|a| targets.iter().map(move |b| (a.clone(), b.clone())))
                            .collect()
                    }
                    _ => Vec::new(),
                };
                pairs
                    .into_iter()
                    .map(move |(a, b)| helper.apply(&a, &b, record, edge_attributes))
            })
            .collect();
        info!(mode1, mode2, %helper, edges = edges.len(), "Generated edges");
        edges
    }

    /// One node per distinct value of `mode1` and `mode2`, in order of first
    /// appearance.
    pub fn generate_nodes(
        &self,
        mode1: &str,
        mode2: &str,
        spec: &NodeSpec,
    ) -> Vec<(String, NodeAttributes)> {
        let mut nodes: Vec<(String, NodeAttributes)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (key, record) in &self.records {
            let (Some(v1), Some(v2)) = (record.get(mode1), record.get(mode2)) else {
                continue;
            };
            let modes = [
                (mode1, v1, &spec.mode1_atom_attrs, &spec.mode1_vector_attrs),
                (mode2, v2, &spec.mode2_atom_attrs, &spec.mode2_vector_attrs),
            ];
            for (mode, value, atoms, vectors) in modes {
                for id in node_ids(&value) {
                    let i = *positions.entry(id.clone()).or_insert_with(|| {
                        let mut node = NodeAttributes::new(id.clone(), mode);
                        for tag in atoms {
                            if let Some(v) = record.get(tag) {
                                node.attrs.insert(tag.clone(), v);
                            }
                        }
                        nodes.push((id.clone(), node));
                        nodes.len() - 1
                    });
                    let node = &mut nodes[i].1;
                    node.records.push(key.clone());
                    for tag in vectors {
                        if let Some(v) = record.get(tag) {
                            let slot = node
                                .attrs
                                .entry(tag.clone())
                                .or_insert_with(|| AttrValue::List(Vec::new()));
                            match slot {
                                AttrValue::List(items) => items.push(v),
                                other => *other = AttrValue::List(vec![other.clone(), v]),
                            }
                        }
                    }
                }
            }
        }

        if nodes.is_empty() {
            warn!(mode1, mode2, "No nodes generated; check that both modes are valid tags");
        }
        nodes
    }

    /// Nodes and edges for a preset or custom parameter bundle.
    pub fn generate_network(&self, preset: &NetworkPreset) -> Network {
        Network {
            nodes: self.generate_nodes(&preset.mode1, &preset.mode2, &preset.nodes),
            edges: self.generate_edges(
                &preset.mode1,
                &preset.mode2,
                preset.helper,
                &preset.edge_attributes,
            ),
        }
    }

    /// Descriptive statistics for the log.
    pub fn describe(&self) -> LogSummary {
        let authors: BTreeSet<&str> = self
            .records
            .iter()
            .filter_map(|(_, r)| r.author.as_deref())
            .collect();
        let files: BTreeSet<String> = self.vector("files").iter().map(ToString::to_string).collect();

        let emails: BTreeSet<&str> = self
            .records
            .iter()
            .filter_map(|(_, r)| r.email.as_deref())
            .collect();
        let domains: Vec<String> = emails.into_iter().filter_map(email_domain).collect();

        let dates: Vec<DateTime<Utc>> = self
            .records
            .iter()
            .filter_map(|(_, r)| r.date.as_deref().and_then(parse_git_date))
            .map(|dt| dt.with_timezone(&Utc))
            .collect();
        let fmt_date = |dt: &DateTime<Utc>| dt.format("%Y-%m-%d %H:%M:%S").to_string();

        LogSummary {
            records: self.len(),
            source: self.source.clone(),
            path: self.path.clone(),
            filters: self.filters.clone(),
            authors: authors.len(),
            files: files.len(),
            email_domains: most_common(&domains, 10),
            first_date: dates.iter().min().map(fmt_date),
            last_date: dates.iter().max().map(fmt_date),
            merges: self.records.iter().filter(|(_, r)| r.merge.is_some()).count(),
        }
    }
}

/// Output of [`CommitLog::describe`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    pub records: usize,
    pub source: Option<String>,
    pub path: Option<String>,
    pub filters: Vec<String>,
    pub authors: usize,
    pub files: usize,
    /// Email domains used by more than one address, as `(users, domain)`.
    pub email_domains: Vec<(usize, String)>,
    /// Earliest commit date, UTC.
    pub first_date: Option<String>,
    /// Latest commit date, UTC.
    pub last_date: Option<String>,
    pub merges: usize,
}

impl fmt::Display for LogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Log containing {} records from {}.",
            self.records,
            self.source.as_deref().unwrap_or("unknown source")
        )?;
        if let Some(path) = &self.path {
            writeln!(f, "Origin: {path}")?;
        }
        if !self.filters.is_empty() {
            writeln!(f, "Filters:")?;
            for filter in &self.filters {
                writeln!(f, "\t{filter}")?;
            }
        }
        writeln!(f, "Number of authors: {}", self.authors)?;
        writeln!(f, "Number of files: {}", self.files)?;
        writeln!(f, "Most common email address domains:")?;
        for (users, domain) in &self.email_domains {
            writeln!(f, "\t{domain} [{users} users]")?;
        }
        if let (Some(first), Some(last)) = (&self.first_date, &self.last_date) {
            writeln!(f, "Date range: {first} to {last}")?;
        }
        write!(f, "Number of merges: {}", self.merges)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
