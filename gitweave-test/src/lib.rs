// Integration test utilities and commit log fixtures for gitweave.

use std::path::{Path, PathBuf};

use gitweave_core::stat::changes_from_stat_lines;
use gitweave_core::types::CommitRecord;

fn commit(
    hash: &str,
    author: &str,
    email: &str,
    date: &str,
    summary: &str,
    stat: &[&str],
) -> CommitRecord {
    let changes = changes_from_stat_lines(stat);
    CommitRecord {
        hash: Some(hash.to_string()),
        author: Some(author.to_string()),
        email: Some(email.to_string()),
        date: Some(date.to_string()),
        summary: Some(summary.to_string()),
        fedits: i64::try_from(changes.len()).ok(),
        files: Some(changes.keys().cloned().collect()),
        changes: Some(changes),
        ..CommitRecord::default()
    }
}

/// A small history with three authors across two timezones, a binary file,
/// and a merge commit.
pub fn sample_records() -> Vec<CommitRecord> {
    let mut merge = commit(
        "9a0e3f1",
        "Alice",
        "alice@gmail.com",
        "Tue May 10 09:15:00 2016 +0200",
        "Merge branch 'docs'",
        &[],
    );
    merge.merge = Some("7c4d2b9 51ba020".to_string());
    merge.files = None;
    merge.changes = None;
    merge.fedits = None;

    vec![
        commit(
            "fc3527c",
            "Alice",
            "alice@gmail.com",
            "Fri May 6 14:41:25 2016 -0400",
            "Add readme",
            &["README.md | 6 +++---"],
        ),
        commit(
            "44b4c72",
            "Alice",
            "alice@gmail.com",
            "Fri May 6 15:41:25 2016 -0400",
            "Network module",
            &["src/net.py | 40 ++++++++", "src/net.h | 12 ++++", "raw_logs.txt | 10 ++"],
        ),
        commit(
            "51ba020",
            "Bob",
            "bob@cs.uwaterloo.ca",
            "Sat May 7 02:50:22 2016 +0900",
            "Fix parser and add data",
            &[
                "src/net.py | 7 ++--",
                "data/miles.txt.gz | Bin 0 -> 10456 bytes",
                "README.md | 1 +",
            ],
        ),
        commit(
            "7c4d2b9",
            "Carol",
            "carol@gmail.com",
            "Mon May 9 11:00:00 2016 -0400",
            "Port to C++",
            &["src/net.cc | 120 ++++++++++", "src/net.h | 3 +-"],
        ),
        merge,
    ]
}

/// The sample records as a JSON array.
pub fn sample_log_json() -> String {
    serde_json::to_string_pretty(&sample_records()).unwrap_or_default()
}

/// A commit log JSON file in a temporary directory.
#[derive(Debug)]
pub struct LogFile {
    pub dir: tempfile::TempDir,
    path: PathBuf,
}

impl LogFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `log.json` in a fresh temporary directory.
    pub fn with_contents(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join("log.json");
        std::fs::write(&path, contents).expect("write log file");
        Self { dir, path }
    }

    pub fn sample() -> Self {
        Self::with_contents(&sample_log_json())
    }

    /// Write an extra file (e.g. a config) next to the log.
    pub fn write_sibling(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write sibling file");
        path
    }
}
