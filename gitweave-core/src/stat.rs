// Per-file change weights from `git log --stat` output.
//
// A stat line looks like `src/main.py | 12 +++++++-----` or, for binary
// files, `logo.png | Bin 0 -> 1234 bytes`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Parse one stat line into `(filename, weight)`.
///
/// Binary changes weigh 1. Lines without a `|` separator are not stat lines.
pub fn parse_stat_line(line: &str) -> Option<(String, u64)> {
    let (name, detail) = line.split_once('|')?;
    let file: String = name.chars().filter(|c| *c != ' ').collect();
    if file.is_empty() {
        return None;
    }

    let weight = if detail.contains("Bin") {
        1
    } else {
        let digits: String = detail.chars().filter(char::is_ascii_digit).collect();
        digits.parse().unwrap_or(0)
    };
    Some((file, weight))
}

/// Fold stat lines into a per-file mapping. Repeated files accumulate.
pub fn changes_from_stat_lines<I, S>(lines: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut changes = BTreeMap::new();
    for line in lines {
        if let Some((file, weight)) = parse_stat_line(line.as_ref()) {
            *changes.entry(file).or_insert(0) += weight;
        }
    }
    changes
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChangesRepr {
    Map(BTreeMap<String, u64>),
    Lines(Vec<String>),
}

/// Serde adapter for [`CommitRecord::changes`](crate::types::CommitRecord::changes).
pub(crate) fn deserialize_changes<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<ChangesRepr>::deserialize(deserializer)?.map(|repr| match repr {
            ChangesRepr::Map(map) => map,
            ChangesRepr::Lines(lines) => changes_from_stat_lines(lines),
        }),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────
