use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

// ── Attribute values ───────────────────────────────────────────────

/// The closed set of shapes a record or node attribute can take.
///
/// Predicates dispatch on these variants explicitly, so every pair of
/// shapes has a defined behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Text(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert a JSON value, dropping what has no attribute shape.
    ///
    /// `null`, booleans, and non-integral numbers yield `None`; inside a
    /// list or map those elements are left out.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(Self::from)),
            Value::Array(items) => Some(Self::List(items.iter().filter_map(Self::from_json).collect())),
            Value::Object(map) => Some(Self::Map(
                map.iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
            Value::Null | Value::Bool(_) => None,
        }
    }

    /// Name of the shape, for log messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Render as an element of a composite value: text is quoted.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: ")?;
                    v.fmt_nested(f)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u64> for AttrValue {
    fn from(n: u64) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

// ── Commit records ─────────────────────────────────────────────────

/// Canonical tag order for commit records, used for attribute listings and
/// TSV columns. Unknown tags follow in sorted order.
pub const COMMIT_TAGS: &[&str] = &[
    "hash",
    "author",
    "email",
    "date",
    "utc_date",
    "utc_datetime",
    "mode",
    "merge",
    "summary",
    "fedits",
    "inserts",
    "deletes",
    "message",
    "files",
    "changes",
];

/// One parsed commit. Every field is optional: upstream parsers may omit
/// any of them and consumers must treat absence as a normal condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Git-formatted author date, e.g. `Mon Apr 18 00:59:02 2016 -0400`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Merge parents, as printed by `git log` for merge commits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of files edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fedits: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// Per-file change weight. Accepts either a `{file: count}` mapping or a
    /// list of raw `--stat` lines on input.
    #[serde(
        default,
        deserialize_with = "crate::stat::deserialize_changes",
        skip_serializing_if = "Option::is_none"
    )]
    pub changes: Option<BTreeMap<String, u64>>,
    /// Derived or unrecognized tags. Unknown tags whose value is `null`,
    /// a boolean, or a float are dropped on input.
    #[serde(flatten, deserialize_with = "deserialize_extra")]
    pub extra: BTreeMap<String, AttrValue>,
}

fn deserialize_extra<'de, D>(deserializer: D) -> Result<BTreeMap<String, AttrValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(tag, value)| {
            let converted = AttrValue::from_json(&value);
            if converted.is_none() && !value.is_null() {
                debug!(tag = tag.as_str(), %value, "Dropping tag with unsupported value");
            }
            converted.map(|v| (tag, v))
        })
        .collect())
}

impl CommitRecord {
    /// Look up a tag by name. `None` means the record does not carry it.
    pub fn get(&self, tag: &str) -> Option<AttrValue> {
        let text = |v: &Option<String>| v.clone().map(AttrValue::Text);
        let int = |v: &Option<i64>| v.map(AttrValue::Int);
        match tag {
            "hash" => text(&self.hash),
            "author" => text(&self.author),
            "email" => text(&self.email),
            "date" => text(&self.date),
            "committer" => text(&self.committer),
            "mode" => text(&self.mode),
            "merge" => text(&self.merge),
            "summary" => text(&self.summary),
            "message" => text(&self.message),
            "fedits" => int(&self.fedits),
            "inserts" => int(&self.inserts),
            "deletes" => int(&self.deletes),
            "files" => self.files.clone().map(AttrValue::from),
            "changes" => self.changes.as_ref().map(|changes| {
                AttrValue::Map(
                    changes
                        .iter()
                        .map(|(file, weight)| (file.clone(), AttrValue::from(*weight)))
                        .collect(),
                )
            }),
            other => self.extra.get(other).cloned(),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Every tag this record carries, structured fields first.
    pub fn tags(&self) -> Vec<String> {
        const FIELDS: &[&str] = &[
            "hash",
            "author",
            "email",
            "date",
            "committer",
            "mode",
            "merge",
            "summary",
            "message",
            "fedits",
            "inserts",
            "deletes",
            "files",
            "changes",
        ];
        FIELDS
            .iter()
            .filter(|tag| self.contains(tag))
            .map(|tag| (*tag).to_string())
            .chain(self.extra.keys().cloned())
            .collect()
    }

    /// Replace `current` with `new` in a text tag, or in the elements of a
    /// list tag. Returns how many values changed.
    ///
    /// Renaming an entry of `files` also renames its `changes` key, adding
    /// the weights when `new` is already listed there.
    pub fn replace_text(&mut self, tag: &str, current: &str, new: &str) -> usize {
        let swap = |slot: &mut String| {
            if slot == current {
                *slot = new.to_string();
                1
            } else {
                0
            }
        };
        let field = match tag {
            "hash" => self.hash.as_mut(),
            "author" => self.author.as_mut(),
            "email" => self.email.as_mut(),
            "date" => self.date.as_mut(),
            "committer" => self.committer.as_mut(),
            "mode" => self.mode.as_mut(),
            "merge" => self.merge.as_mut(),
            "summary" => self.summary.as_mut(),
            "message" => self.message.as_mut(),
            "files" => {
                let replaced: usize = self.files.iter_mut().flatten().map(swap).sum();
                if let Some(changes) = self.changes.as_mut() {
                    if let Some(weight) = changes.remove(current) {
                        *changes.entry(new.to_string()).or_default() += weight;
                    }
                }
                return replaced;
            }
            other => match self.extra.get_mut(other) {
                Some(AttrValue::Text(text)) => Some(text),
                Some(AttrValue::List(items)) => {
                    return items
                        .iter_mut()
                        .filter_map(|item| match item {
                            AttrValue::Text(text) => Some(text),
                            _ => None,
                        })
                        .map(swap)
                        .sum();
                }
                _ => None,
            },
        };
        field.map_or(0, swap)
    }

    /// Store a derived value, or clear it when `value` is `None`.
    pub fn set_extra(&mut self, tag: &str, value: Option<AttrValue>) {
        match value {
            Some(v) => {
                self.extra.insert(tag.to_string(), v);
            }
            None => {
                self.extra.remove(tag);
            }
        }
    }
}

// ── Edges and nodes ────────────────────────────────────────────────

/// A `(source, target, attributes)` triple in a derived network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            attrs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Change weight, present only on change-edges whose file was found.
    pub fn weight(&self) -> Option<i64> {
        self.attrs.get("weight").and_then(AttrValue::as_int)
    }
}

/// Attribute dictionary of a network node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The tag this node was drawn from (`author`, `files`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Hashes of the records mentioning this node.
    #[serde(default)]
    pub records: Vec<String>,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl NodeAttributes {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            node_type: Some(node_type.into()),
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => self.id.clone().map(AttrValue::Text),
            "type" => self.node_type.clone().map(AttrValue::Text),
            "records" => Some(AttrValue::from(self.records.clone())),
            other => self.attrs.get(other).cloned(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CommitRecord {
        CommitRecord {
            hash: Some("fc3527c".into()),
            author: Some("Alice".into()),
            email: Some("alice@gmail.com".into()),
            date: Some("Fri May 6 14:41:25 2016 -0400".into()),
            files: Some(vec!["readme.md".into(), "src/main.py".into()]),
            changes: Some(BTreeMap::from([
                ("readme.md".to_string(), 3),
                ("src/main.py".to_string(), 12),
            ])),
            ..CommitRecord::default()
        }
    }

    #[test]
    fn display_renders_composites_with_quoted_text() {
        let ints = AttrValue::from(vec![2_i64, 3]);
        let texts = AttrValue::from(vec!["a", "b"]);
        let mixed = AttrValue::List(vec![AttrValue::Int(1), AttrValue::from("c")]);
        assert_eq!(ints.to_string(), "[2, 3]");
        assert_eq!(texts.to_string(), r#"["a", "b"]"#);
        assert_eq!(mixed.to_string(), r#"[1, "c"]"#);
        assert_eq!(AttrValue::from("plain").to_string(), "plain");
    }

    #[test]
    fn get_returns_structured_fields_and_extras() {
        let mut record = sample_record();
        record.set_extra("utc_date", Some("2016-05-06".into()));

        assert_eq!(record.get("author"), Some(AttrValue::from("Alice")));
        assert_eq!(
            record.get("files"),
            Some(AttrValue::from(vec!["readme.md", "src/main.py"]))
        );
        assert_eq!(record.get("utc_date"), Some(AttrValue::from("2016-05-06")));
        assert_eq!(record.get("committer"), None);
        assert_eq!(record.get("nonexistent"), None);
    }

    #[test]
    fn changes_exposed_as_map() {
        let record = sample_record();
        let Some(AttrValue::Map(changes)) = record.get("changes") else {
            panic!("changes should be a map");
        };
        assert_eq!(changes.get("src/main.py"), Some(&AttrValue::Int(12)));
    }

    #[test]
    fn set_extra_none_clears() {
        let mut record = sample_record();
        record.set_extra("domain", Some("gmail".into()));
        record.set_extra("domain", None);
        assert!(!record.contains("domain"));
    }

    #[test]
    fn tags_lists_present_fields_then_extras() {
        let mut record = sample_record();
        record.set_extra("zeta", Some(AttrValue::Int(1)));
        assert_eq!(
            record.tags(),
            vec!["hash", "author", "email", "date", "files", "changes", "zeta"]
        );
    }

    #[test]
    fn record_deserializes_with_missing_fields_and_extras() {
        let json = r#"{
            "hash": "44b4c72",
            "author": "Bob",
            "email": null,
            "files": ["a.py"],
            "changes": ["a.py | 4 ++--"],
            "branch": "main"
        }"#;
        let record: CommitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.author.as_deref(), Some("Bob"));
        assert_eq!(record.email, None);
        assert_eq!(record.date, None);
        assert_eq!(
            record.changes,
            Some(BTreeMap::from([("a.py".to_string(), 4)]))
        );
        assert_eq!(record.get("branch"), Some(AttrValue::from("main")));
    }

    #[test]
    fn null_bool_and_float_extras_are_dropped() {
        let json = r#"{
            "hash": "a1",
            "branch": null,
            "signed": true,
            "ratio": 0.5,
            "reviewers": ["Bob", null, 2],
            "stats": {"x": 1, "y": 1.5}
        }"#;
        let record: CommitRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.hash.as_deref(), Some("a1"));
        assert!(!record.contains("branch"));
        assert!(!record.contains("signed"));
        assert!(!record.contains("ratio"));
        assert_eq!(
            record.get("reviewers"),
            Some(AttrValue::List(vec![AttrValue::from("Bob"), AttrValue::Int(2)]))
        );
        assert_eq!(
            record.get("stats"),
            Some(AttrValue::Map(BTreeMap::from([("x".to_string(), AttrValue::Int(1))])))
        );
    }

    #[test]
    fn from_json_maps_value_shapes() {
        use serde_json::json;
        assert_eq!(AttrValue::from_json(&json!("a")), Some(AttrValue::from("a")));
        assert_eq!(AttrValue::from_json(&json!(-3)), Some(AttrValue::Int(-3)));
        assert_eq!(AttrValue::from_json(&json!(u64::MAX)), Some(AttrValue::Int(i64::MAX)));
        assert_eq!(AttrValue::from_json(&json!(null)), None);
        assert_eq!(AttrValue::from_json(&json!(false)), None);
        assert_eq!(AttrValue::from_json(&json!(2.5)), None);
    }

    #[test]
    fn replace_text_in_scalars_lists_and_changes() {
        let mut record = sample_record();
        record.set_extra("reviewers", Some(AttrValue::from(vec!["Al", "Bo"])));
        assert_eq!(record.replace_text("author", "Alice", "Alice Smith"), 1);
        assert_eq!(record.author.as_deref(), Some("Alice Smith"));
        assert_eq!(record.replace_text("author", "Bob", "Robert"), 0);

        assert_eq!(record.replace_text("files", "readme.md", "README.md"), 1);
        assert_eq!(
            record.changes,
            Some(BTreeMap::from([
                ("README.md".to_string(), 3),
                ("src/main.py".to_string(), 12),
            ]))
        );

        assert_eq!(record.replace_text("reviewers", "Bo", "Bob"), 1);
        assert_eq!(record.get("reviewers"), Some(AttrValue::from(vec!["Al", "Bob"])));
        assert_eq!(record.replace_text("fedits", "1", "2"), 0);
    }

    #[test]
    fn record_serializes_without_absent_fields() {
        let record = CommitRecord {
            author: Some("Alice".into()),
            ..CommitRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"author":"Alice"}"#);
    }

    #[test]
    fn edge_weight_only_when_int() {
        let edge = Edge::new("Alice", "a.py").with_attr("weight", 7_i64);
        assert_eq!(edge.weight(), Some(7));
        assert_eq!(Edge::new("Alice", "a.py").weight(), None);
    }

    #[test]
    fn node_attributes_serde_uses_type_key() {
        let node = NodeAttributes::new("Alice", "author");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "author");
        assert_eq!(json["id"], "Alice");
        let back: NodeAttributes = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = AttrValue> {
            let leaf = prop_oneof![
                any::<i64>().prop_map(AttrValue::Int),
                "[a-z]{1,8}".prop_map(AttrValue::Text),
            ];
            leaf.prop_recursive(2, 8, 4, |inner| {
                prop::collection::vec(inner, 0..4).prop_map(AttrValue::List)
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn attr_value_json_roundtrip(value in arb_value()) {
                let json = serde_json::to_string(&value).unwrap();
                let back: AttrValue = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, value);
            }
        }
    }
}
