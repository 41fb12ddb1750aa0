// Filter predicates over record values.
//
// The free functions are the building blocks; `Predicate` compiles a named
// predicate and its match value once so it can be applied to every record
// of a log.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone};
use regex::Regex;
use tracing::debug;

use crate::date::parse_git_date;
use crate::error::PredicateError;
use crate::types::AttrValue;

// ── Dates ──────────────────────────────────────────────────────────

/// The reference side of a date comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRef {
    /// A git-formatted date string.
    Git(String),
    /// An already parsed, offset-aware timestamp.
    At(DateTime<FixedOffset>),
}

impl DateRef {
    pub fn resolve(&self) -> Result<DateTime<FixedOffset>, PredicateError> {
        match self {
            Self::Git(s) => parse_date(s),
            Self::At(dt) => Ok(*dt),
        }
    }
}

impl From<&str> for DateRef {
    fn from(s: &str) -> Self {
        Self::Git(s.to_string())
    }
}

impl From<String> for DateRef {
    fn from(s: String) -> Self {
        Self::Git(s)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateRef {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::At(dt.fixed_offset())
    }
}

fn parse_date(s: &str) -> Result<DateTime<FixedOffset>, PredicateError> {
    parse_git_date(s).ok_or_else(|| PredicateError::Date(s.to_string()))
}

fn compare_dates(candidate: &str, reference: DateRef) -> Result<Ordering, PredicateError> {
    let reference = reference.resolve()?;
    Ok(parse_date(candidate)?.cmp(&reference))
}

/// Has `candidate` happened at or after `reference`?
pub fn filter_since(candidate: &str, reference: impl Into<DateRef>) -> Result<bool, PredicateError> {
    compare_dates(candidate, reference.into()).map(Ordering::is_ge)
}

/// Has `candidate` happened at or before `reference`?
pub fn filter_before(candidate: &str, reference: impl Into<DateRef>) -> Result<bool, PredicateError> {
    compare_dates(candidate, reference.into()).map(Ordering::is_le)
}

/// Has `candidate` happened strictly after `reference`?
pub fn filter_sincex(candidate: &str, reference: impl Into<DateRef>) -> Result<bool, PredicateError> {
    compare_dates(candidate, reference.into()).map(Ordering::is_gt)
}

/// Has `candidate` happened strictly before `reference`?
pub fn filter_beforex(candidate: &str, reference: impl Into<DateRef>) -> Result<bool, PredicateError> {
    compare_dates(candidate, reference.into()).map(Ordering::is_lt)
}

// ── Patterns ───────────────────────────────────────────────────────

fn compile(pattern: &str) -> Result<Regex, PredicateError> {
    Regex::new(pattern).map_err(|source| PredicateError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_anchored(pattern: &str) -> Result<Regex, PredicateError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| PredicateError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Does `pattern` match anywhere within `value`?
pub fn filter_regex(value: &str, pattern: &str) -> Result<bool, PredicateError> {
    Ok(compile(pattern)?.is_match(value))
}

/// Equality, where a text `pattern` is a regex that must match all of `value`.
///
/// Any pair other than text/text compares structurally.
pub fn filter_equals(value: &AttrValue, pattern: &AttrValue) -> Result<bool, PredicateError> {
    match (value, pattern) {
        (AttrValue::Text(v), AttrValue::Text(p)) => Ok(compile_anchored(p)?.is_match(v)),
        _ => Ok(value == pattern),
    }
}

/// Is `item` contained in `container`?
///
/// | container | item | rule                  |
/// |-----------|------|-----------------------|
/// | list      | any  | element equality      |
/// | text      | text | substring             |
/// | map       | text | key present           |
/// | otherwise |      | `false`               |
pub fn filter_has(container: &AttrValue, item: &AttrValue) -> bool {
    match (container, item) {
        (AttrValue::List(items), _) => items.contains(item),
        (AttrValue::Text(haystack), AttrValue::Text(needle)) => haystack.contains(needle.as_str()),
        (AttrValue::Map(map), AttrValue::Text(key)) => map.contains_key(key),
        (AttrValue::Text(_) | AttrValue::Map(_) | AttrValue::Int(_), _) => false,
    }
}

fn compare_same_shape(a: &AttrValue, b: &AttrValue) -> Option<Ordering> {
    match (a, b) {
        (AttrValue::Int(x), AttrValue::Int(y)) => Some(x.cmp(y)),
        (AttrValue::Text(x), AttrValue::Text(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

// ── Compiled predicates ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Lt => ord.is_lt(),
            Self::Le => ord.is_le(),
            Self::Gt => ord.is_gt(),
            Self::Ge => ord.is_ge(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
    Since,
    SinceX,
    Before,
    BeforeX,
}

impl DateOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Since => ord.is_ge(),
            Self::SinceX => ord.is_gt(),
            Self::Before => ord.is_le(),
            Self::BeforeX => ord.is_lt(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Since => "since",
            Self::SinceX => "sincex",
            Self::Before => "before",
            Self::BeforeX => "beforex",
        }
    }
}

/// A named predicate with its match value, ready to test many values.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Anchored regex over text values.
    EqualsPattern(Regex),
    /// Structural equality for non-text match values.
    EqualsValue(AttrValue),
    Has(AttrValue),
    Compare(CompareOp, AttrValue),
    Date(DateOp, DateTime<FixedOffset>),
}

impl Predicate {
    /// Build a predicate from its name (`equals`, `has`, `<`, `<=`, `>`,
    /// `>=`, `since`, `sincex`, `before`, `beforex`) and match value.
    pub fn new(name: &str, value: AttrValue) -> Result<Self, PredicateError> {
        let date_op = match name {
            "equals" => {
                return Ok(match value {
                    AttrValue::Text(p) => Self::EqualsPattern(compile_anchored(&p)?),
                    other => Self::EqualsValue(other),
                });
            }
            "has" => return Ok(Self::Has(value)),
            "<" => return Ok(Self::Compare(CompareOp::Lt, value)),
            "<=" => return Ok(Self::Compare(CompareOp::Le, value)),
            ">" => return Ok(Self::Compare(CompareOp::Gt, value)),
            ">=" => return Ok(Self::Compare(CompareOp::Ge, value)),
            "since" => DateOp::Since,
            "sincex" => DateOp::SinceX,
            "before" => DateOp::Before,
            "beforex" => DateOp::BeforeX,
            other => return Err(PredicateError::Unknown(other.to_string())),
        };
        let reference = match &value {
            AttrValue::Text(s) => parse_date(s)?,
            other => return Err(PredicateError::Date(other.to_string())),
        };
        Ok(Self::Date(date_op, reference))
    }

    /// Date predicate against an already parsed reference.
    pub fn date(op: DateOp, reference: impl Into<DateRef>) -> Result<Self, PredicateError> {
        Ok(Self::Date(op, reference.into().resolve()?))
    }

    /// Lexicographic/numeric comparison operators.
    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Compare(..))
    }

    pub fn test(&self, value: &AttrValue) -> bool {
        match self {
            Self::EqualsPattern(re) => value.as_text().is_some_and(|v| re.is_match(v)),
            Self::EqualsValue(expected) => value == expected,
            Self::Has(item) => filter_has(value, item),
            Self::Compare(op, reference) => {
                compare_same_shape(value, reference).is_some_and(|ord| op.holds(ord))
            }
            Self::Date(op, reference) => {
                let Some(raw) = value.as_text() else {
                    return false;
                };
                match parse_git_date(raw) {
                    Some(dt) => op.holds(dt.cmp(reference)),
                    None => {
                        debug!(value = raw, "Skipping unparseable date in filter");
                        false
                    }
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EqualsPattern(re) => {
                let pattern = re.as_str();
                let inner = pattern
                    .strip_prefix("^(?:")
                    .and_then(|p| p.strip_suffix(")$"))
                    .unwrap_or(pattern);
                write!(f, "equals {inner}")
            }
            Self::EqualsValue(v) => write!(f, "equals {v}"),
            Self::Has(v) => write!(f, "has {v}"),
            Self::Compare(op, v) => write!(f, "{} {v}", op.as_str()),
            Self::Date(op, dt) => write!(f, "{} {}", op.as_str(), crate::date::format_git_date(dt)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
