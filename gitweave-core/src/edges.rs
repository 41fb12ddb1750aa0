// Edge generators: turn one commit record and a pair of node ids into an edge,
// and merge the parallel edges a log produces.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InputError;
use crate::types::{AttrValue, CommitRecord, Edge};

fn keep_attributes(record: &CommitRecord, keep: &[String]) -> BTreeMap<String, AttrValue> {
    keep.iter()
        .filter_map(|tag| record.get(tag).map(|value| (tag.clone(), value)))
        .collect()
}

/// An unweighted edge carrying the requested record attributes.
///
/// Attributes the record does not have are left out.
pub fn net_edges_simple(
    actor: &str,
    target: &str,
    record: &CommitRecord,
    keep: &[String],
) -> Edge {
    Edge {
        source: actor.to_string(),
        target: target.to_string(),
        attrs: keep_attributes(record, keep),
    }
}

/// An edge weighted by the number of lines changed in `target`.
///
/// `target` is looked up by exact filename in the record's `changes`. When
/// the file is not listed there the edge is still produced, without a
/// `weight` attribute.
pub fn net_edges_changes(
    actor: &str,
    target: &str,
    record: &CommitRecord,
    keep: &[String],
) -> Edge {
    let mut edge = net_edges_simple(actor, target, record, keep);
    if let Some(weight) = record.changes.as_ref().and_then(|c| c.get(target)) {
        edge.attrs.insert("weight".to_string(), AttrValue::from(*weight));
    }
    edge
}

/// Merge parallel edges into one edge per unordered pair of endpoints.
///
/// The merged `weight` counts the collapsed edges, or with `sum_weights`
/// adds up their weights, an edge without one counting as 1. Other
/// attributes that differ are gathered into lists in edge order. Merged
/// edges keep the orientation and position of the first edge of their pair.
pub fn collapse_edges(edges: &[Edge], sum_weights: bool) -> Vec<Edge> {
    let mut merged: Vec<Edge> = Vec::new();
    let mut positions: HashMap<(&str, &str), usize> = HashMap::new();

    for edge in edges {
        let weight = if sum_weights { edge.weight().unwrap_or(1) } else { 1 };
        let pair = if edge.source <= edge.target {
            (edge.source.as_str(), edge.target.as_str())
        } else {
            (edge.target.as_str(), edge.source.as_str())
        };

        let Some(&i) = positions.get(&pair) else {
            let mut first = edge.clone();
            first.attrs.insert("weight".to_string(), AttrValue::Int(weight));
            positions.insert(pair, merged.len());
            merged.push(first);
            continue;
        };

        let target = &mut merged[i];
        let total = target.weight().unwrap_or(0).saturating_add(weight);
        target.attrs.insert("weight".to_string(), AttrValue::Int(total));
        for (key, value) in edge.attrs.iter().filter(|(k, _)| k.as_str() != "weight") {
            match target.attrs.get_mut(key) {
                None => {
                    target.attrs.insert(key.clone(), value.clone());
                }
                Some(AttrValue::List(items)) => match value {
                    AttrValue::List(more) => items.extend(more.iter().cloned()),
                    scalar => items.push(scalar.clone()),
                },
                Some(existing) => {
                    let mut items = vec![existing.clone()];
                    match value {
                        AttrValue::List(more) => items.extend(more.iter().cloned()),
                        scalar => items.push(scalar.clone()),
                    }
                    *existing = AttrValue::List(items);
                }
            }
        }
    }
    debug!(edges = edges.len(), collapsed = merged.len(), sum_weights, "Collapsed edges");
    merged
}

/// Which generator to use when building a network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeHelper {
    #[default]
    Simple,
    Changes,
}

impl EdgeHelper {
    pub fn apply(self, actor: &str, target: &str, record: &CommitRecord, keep: &[String]) -> Edge {
        match self {
            Self::Simple => net_edges_simple(actor, target, record, keep),
            Self::Changes => net_edges_changes(actor, target, record, keep),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Changes => "changes",
        }
    }
}

impl FromStr for EdgeHelper {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "changes" => Ok(Self::Changes),
            other => Err(InputError::UnknownHelper(other.to_string())),
        }
    }
}

impl std::fmt::Display for EdgeHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
