// Git date parsing and UTC normalization.
//
// `git log` prints author dates as `Mon Apr 18 00:59:02 2016 -0400`: weekday,
// month, day (not zero-padded), time, year, and the author's UTC offset.

use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, Utc, Weekday};
use tracing::debug;

use crate::types::CommitRecord;

const GIT_DATE_BODY: &str = "%b %d %H:%M:%S %Y %z";
const GIT_DATE_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// Parse a git-formatted date, keeping its UTC offset.
///
/// The weekday must be a valid weekday name but is not checked against the
/// calendar date, matching how git itself treats the field.
pub fn parse_git_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let (weekday, body) = s.trim().split_once(' ')?;
    Weekday::from_str(weekday).ok()?;
    DateTime::parse_from_str(body.trim_start(), GIT_DATE_BODY).ok()
}

/// Render a timestamp the way `git log` prints it.
pub fn format_git_date(dt: &DateTime<FixedOffset>) -> String {
    dt.format(GIT_DATE_FORMAT).to_string()
}

fn record_utc(record: &CommitRecord) -> Option<DateTime<Utc>> {
    let raw = record.date.as_deref()?;
    let parsed = parse_git_date(raw);
    if parsed.is_none() {
        debug!(date = raw, hash = ?record.hash, "Unparseable commit date");
    }
    parsed.map(|dt| dt.with_timezone(&Utc))
}

/// The record's date as `YYYY-MM-DD` in UTC.
///
/// `None` when the record has no `date` or it is not a git date.
pub fn make_utc_date(record: &CommitRecord) -> Option<String> {
    record_utc(record).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// The record's date as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn make_utc_datetime(record: &CommitRecord) -> Option<String> {
    record_utc(record).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// `M-D-YYYY` in the date's own offset, as used in edge-list exports.
pub fn edge_list_date(s: &str) -> Option<String> {
    let date = parse_git_date(s)?.date_naive();
    Some(format!("{}-{}-{}", date.month(), date.day(), date.year()))
}

// ── Tests ─────────────────────────────────────────────────────────────
