// CSV writers for edge lists and node lists, plus per-record TSV dumps.

use std::io::Write;

use tracing::debug;

use crate::date::edge_list_date;
use crate::error::ExportError;
use crate::frequency::list_to_scd;
use crate::log::CommitLog;
use crate::types::{AttrValue, Edge, NodeAttributes};

/// Placeholder for attributes an edge or node does not carry.
pub const MISSING: &str = "NA";

fn flat_text(value: &AttrValue) -> String {
    match value {
        AttrValue::List(items) => list_to_scd(items),
        other => other.to_string(),
    }
}

/// Write an edge list as CSV: `id1,id2` followed by one column per entry
/// of `columns`.
///
/// `date` values are rendered as `M-D-YYYY`; absent attributes as `NA`.
pub fn write_edges<W: Write>(
    w: &mut W,
    edges: &[Edge],
    columns: &[String],
) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(w);
    wtr.write_record(["id1", "id2"].into_iter().chain(columns.iter().map(String::as_str)))?;

    for edge in edges {
        let attrs = columns.iter().map(|col| match edge.attrs.get(col) {
            Some(AttrValue::Text(raw)) if col == "date" => {
                edge_list_date(raw).unwrap_or_else(|| raw.clone())
            }
            Some(value) => flat_text(value),
            None => MISSING.to_string(),
        });
        wtr.write_record(
            [edge.source.clone(), edge.target.clone()]
                .into_iter()
                .chain(attrs),
        )?;
    }
    wtr.flush()?;
    debug!(edges = edges.len(), "Wrote edge list");
    Ok(())
}

/// Write a node list as CSV: `id,type` followed by one column per entry of
/// `columns`. List values are joined with `;`.
pub fn write_nodes<W: Write>(
    w: &mut W,
    nodes: &[(String, NodeAttributes)],
    columns: &[String],
) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(w);
    wtr.write_record(["id", "type"].into_iter().chain(columns.iter().map(String::as_str)))?;

    for (id, node) in nodes {
        let node_type = node.node_type.clone().unwrap_or_else(|| MISSING.to_string());
        let attrs = columns.iter().map(|col| {
            node.get(col)
                .map_or_else(|| MISSING.to_string(), |v| flat_text(&v))
        });
        wtr.write_record([id.clone(), node_type].into_iter().chain(attrs))?;
    }
    wtr.flush()?;
    debug!(nodes = nodes.len(), "Wrote node list");
    Ok(())
}

/// Write one tab-separated line per record, with a header of every tag in
/// the log except those in `ignore`.
///
/// Tabs and line breaks inside values are replaced by spaces; absent tags
/// are left empty. Values are never quoted.
pub fn write_tsv<W: Write>(
    w: &mut W,
    log: &CommitLog,
    ignore: &[String],
) -> Result<(), ExportError> {
    let columns: Vec<String> = log
        .attributes()
        .into_iter()
        .filter(|tag| !ignore.contains(tag))
        .collect();
    // Nothing to write; the csv writer would emit `""` for an empty record.
    if columns.is_empty() {
        debug!(records = log.len(), "No columns for TSV");
        return Ok(());
    }
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(w);
    wtr.write_record(&columns)?;

    for (_, record) in log.iter() {
        wtr.write_record(columns.iter().map(|tag| {
            record
                .get(tag)
                .map(|v| flat_text(&v).replace(['\t', '\n', '\r'], " "))
                .unwrap_or_default()
        }))?;
    }
    wtr.flush()?;
    debug!(records = log.len(), columns = columns.len(), "Wrote TSV");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommitRecord;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), ExportError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn edges_with_weight_date_and_missing() {
        let edges = vec![
            Edge::new("Alice", "readme.md")
                .with_attr("weight", 3_i64)
                .with_attr("date", "Fri May 6 14:41:25 2016 -0400"),
            Edge::new("Bob", "net.py").with_attr("date", "not a date"),
        ];
        let out = render(|w| write_edges(w, &edges, &cols(&["weight", "date"])));
        assert_eq!(
            out,
            "id1,id2,weight,date\nAlice,readme.md,3,5-6-2016\nBob,net.py,NA,not a date\n"
        );
    }

    #[test]
    fn edge_date_keeps_author_offset() {
        let edges = vec![Edge::new("A", "f").with_attr("date", "Sat May 7 23:30:00 2016 -0400")];
        let out = render(|w| write_edges(w, &edges, &cols(&["date"])));
        assert!(out.ends_with("A,f,5-7-2016\n"));
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let edges = vec![Edge::new("Schult, Dan", "a.py").with_attr("summary", "say \"hi\"")];
        let out = render(|w| write_edges(w, &edges, &cols(&["summary"])));
        assert_eq!(out.lines().nth(1), Some(r#""Schult, Dan",a.py,"say ""hi""""#));
    }

    #[test]
    fn node_fields_with_line_breaks_are_quoted() {
        let mut node = NodeAttributes::new("Alice", "author");
        node.attrs.insert("summary".into(), AttrValue::from("two\nlines"));
        let nodes = vec![("Alice".to_string(), node)];
        let out = render(|w| write_nodes(w, &nodes, &cols(&["summary"])));
        assert_eq!(out, "id,type,summary\nAlice,author,\"two\nlines\"\n");
    }

    #[test]
    fn no_edges_writes_header_only() {
        let out = render(|w| write_edges(w, &[], &[]));
        assert_eq!(out, "id1,id2\n");
    }

    #[test]
    fn nodes_join_lists() {
        let mut alice = NodeAttributes::new("Alice", "author");
        alice.records = cols(&["fc3527c", "44b4c72"]);
        alice.attrs.insert("email".into(), AttrValue::from("alice@gmail.com"));
        let file = NodeAttributes::new("readme.md", "files");
        let nodes = vec![("Alice".to_string(), alice), ("readme.md".to_string(), file)];

        let out = render(|w| write_nodes(w, &nodes, &cols(&["email", "records"])));
        assert_eq!(
            out,
            "id,type,email,records\n\
             Alice,author,alice@gmail.com,fc3527c;44b4c72\n\
             readme.md,files,NA,\n"
        );
    }

    #[test]
    fn tsv_dump() {
        let log = CommitLog::from_records([
            CommitRecord {
                hash: Some("a1".into()),
                author: Some("Alice".into()),
                message: Some("line one\nline two".into()),
                files: Some(cols(&["x.py", "y.h"])),
                ..CommitRecord::default()
            },
            CommitRecord {
                hash: Some("b2".into()),
                fedits: Some(2),
                ..CommitRecord::default()
            },
        ]);

        let out = render(|w| write_tsv(w, &log, &[]));
        assert_eq!(
            out,
            "hash\tauthor\tfedits\tmessage\tfiles\n\
             a1\tAlice\t\tline one line two\tx.py;y.h\n\
             b2\t\t2\t\t\n"
        );

        let trimmed = render(|w| write_tsv(w, &log, &cols(&["message", "files"])));
        assert_eq!(trimmed.lines().next(), Some("hash\tauthor\tfedits"));

        assert_eq!(render(|w| write_tsv(w, &CommitLog::new(), &[])), "");
    }
}
