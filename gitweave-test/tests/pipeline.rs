use gitweave_core::classify::{NodeColour, node_attribute, node_colours};
use gitweave_core::edges::{EdgeHelper, collapse_edges};
use gitweave_core::export::{write_edges, write_nodes, write_tsv};
use gitweave_core::log::{ANY_TAG, CommitLog, IgnoreMode, NetworkPreset};
use gitweave_core::predicate::{DateOp, Predicate};
use gitweave_core::types::{AttrValue, Edge};
use gitweave_test::{sample_log_json, sample_records};

fn sample() -> CommitLog {
    CommitLog::from_records(sample_records())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn json_array_and_keyed_object_load_the_same_records() {
    let from_array = CommitLog::from_json(&sample_log_json()).unwrap();
    assert_eq!(from_array.len(), 5);

    let keyed: serde_json::Map<String, serde_json::Value> = sample_records()
        .into_iter()
        .map(|r| {
            let key = r.hash.clone().unwrap();
            (key, serde_json::to_value(r).unwrap())
        })
        .collect();
    let from_object = CommitLog::from_json(&serde_json::Value::Object(keyed).to_string()).unwrap();
    assert_eq!(from_object.len(), 5);
    for (key, record) in from_array.iter() {
        assert_eq!(from_object.get(key), Some(record));
    }
}

#[test]
fn stat_lines_in_json_become_weights() {
    let json = r#"[{
        "hash": "1dc1602",
        "author": "Dan Schult",
        "files": ["examples/drawing/knuth_miles.txt.gz", "networkx/algorithms/threshold.py"],
        "changes": [
            "examples/drawing/knuth_miles.txt.gz | Bin 0 -> 10456 bytes",
            "networkx/algorithms/threshold.py | 910 ++++++++-------"
        ]
    }]"#;
    let log = CommitLog::from_json(json).unwrap();
    let edges = log.generate_edges("author", "files", EdgeHelper::Changes, &[]);
    let weights: Vec<Option<i64>> = edges.iter().map(Edge::weight).collect();
    assert_eq!(weights, vec![Some(1), Some(910)]);
}

// ── Filtering ────────────────────────────────────────────────────

#[test]
fn filter_chain_records_history() {
    let log = sample()
        .filter_by("author", "equals", "Alice", false)
        .unwrap()
        .filter_by("merge", "equals", ".*", true)
        .unwrap();
    assert_eq!(log.keys().collect::<Vec<_>>(), vec!["fc3527c", "44b4c72"]);
    assert_eq!(
        log.filters,
        vec![
            "author equals Alice | Negate: false",
            "merge equals .* | Negate: true",
        ]
    );
}

#[test]
fn date_filters_compare_instants_across_offsets() {
    let log = sample();
    let since = Predicate::date(DateOp::Since, "Fri May 6 14:00:00 2016 -0400").unwrap();
    let kept = log.filter("date", &since, false);
    // Bob's commit is dated May 7 locally but falls before the reference in UTC.
    assert_eq!(
        kept.keys().collect::<Vec<_>>(),
        vec!["fc3527c", "44b4c72", "7c4d2b9", "9a0e3f1"]
    );
}

#[test]
fn any_tag_filter_searches_every_tag() {
    let log = sample();
    let kept = log.filter_by(ANY_TAG, "has", "uwaterloo", false).unwrap();
    assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["51ba020"]);

    let by_file = log.filter_by(ANY_TAG, "has", "src/net.cc", false).unwrap();
    assert_eq!(by_file.keys().collect::<Vec<_>>(), vec!["7c4d2b9"]);
}

#[test]
fn numeric_comparison_on_fedits() {
    let log = sample().filter_by("fedits", ">=", 3_i64, false).unwrap();
    assert_eq!(log.keys().collect::<Vec<_>>(), vec!["44b4c72", "51ba020"]);
}

#[test]
fn ignore_uses_regex_search() {
    let log = sample().ignore(r"\.txt", IgnoreMode::Match).unwrap();
    let files: Vec<String> = log.vector("files").iter().map(ToString::to_string).collect();
    assert!(!files.iter().any(|f| f.contains(".txt")));
    assert_eq!(
        log.generate_edges("author", "files", EdgeHelper::Changes, &[]).len(),
        7
    );
}

// ── Annotation and summary ───────────────────────────────────────

#[test]
fn annotate_normalizes_to_utc() {
    let log = sample().annotate();
    let bob = log.get("51ba020").unwrap();
    assert_eq!(bob.get("utc_date"), Some(AttrValue::from("2016-05-06")));
    assert_eq!(bob.get("utc_datetime"), Some(AttrValue::from("2016-05-06 17:50:22")));
    assert_eq!(bob.get("domain"), Some(AttrValue::from("cs.uwaterloo")));

    let utc_days = log.filter_by("utc_date", "equals", "2016-05-06", false).unwrap();
    assert_eq!(utc_days.len(), 3);
}

#[test]
fn describe_sample() {
    let summary = sample().describe();
    assert_eq!(summary.records, 5);
    assert_eq!(summary.authors, 3);
    assert_eq!(summary.files, 6);
    assert_eq!(summary.email_domains, vec![(2, "gmail".to_string())]);
    assert_eq!(summary.first_date.as_deref(), Some("2016-05-06 17:50:22"));
    assert_eq!(summary.last_date.as_deref(), Some("2016-05-10 07:15:00"));
    assert_eq!(summary.merges, 1);
}

// ── Author consolidation ─────────────────────────────────────────

#[test]
fn duplicate_emails_merge_into_one_author() {
    let mut log = sample();
    let mut alias = sample_records()[0].clone();
    alias.hash = Some("d00d001".into());
    alias.author = Some("alice".into());
    alias.date = Some("Wed May 11 10:00:00 2016 -0400".into());
    log.insert("d00d001", alias);

    let dups = log.detect_dup_emails();
    assert_eq!(dups.get("alice@gmail.com"), Some(&strings(&["Alice", "alice"])));

    let merged = log.replace_val("author", "alice", "Alice");
    assert!(merged.detect_dup_emails().is_empty());
    assert_eq!(merged.author_email_list().len(), 3);

    let edges = merged.generate_edges("author", "files", EdgeHelper::Changes, &[]);
    let collapsed = collapse_edges(&edges, true);
    assert_eq!(collapsed.len(), edges.len() - 1);
    let readme = collapsed
        .iter()
        .find(|e| e.source == "Alice" && e.target == "README.md")
        .unwrap();
    assert_eq!(readme.weight(), Some(12));

    let cu = merged.generate_cu_auth_changes();
    assert_eq!(
        cu.get("d00d001").unwrap().get("cu_auth_changes"),
        Some(AttrValue::from(vec!["README.md:12"]))
    );
}

// ── Network generation ───────────────────────────────────────────

#[test]
fn weighted_preset_network() {
    let preset = NetworkPreset::named("author/file/weighted").unwrap();
    let network = sample().generate_network(&preset);

    assert_eq!(network.edges.len(), 9);
    let alice_net_py = network
        .edges
        .iter()
        .find(|e| e.source == "Alice" && e.target == "src/net.py")
        .unwrap();
    assert_eq!(alice_net_py.weight(), Some(40));
    assert_eq!(
        alice_net_py.attrs.get("hash"),
        Some(&AttrValue::from("44b4c72"))
    );

    let binary = network
        .edges
        .iter()
        .find(|e| e.target == "data/miles.txt.gz")
        .unwrap();
    assert_eq!(binary.weight(), Some(1));

    let ids: Vec<&str> = network.nodes.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "Alice",
            "README.md",
            "raw_logs.txt",
            "src/net.h",
            "src/net.py",
            "Bob",
            "data/miles.txt.gz",
            "Carol",
            "src/net.cc",
        ]
    );
}

#[test]
fn nodes_accumulate_vector_attributes() {
    let preset = NetworkPreset::named("author/file").unwrap();
    let log = sample();
    let nodes = log.generate_nodes(&preset.mode1, &preset.mode2, &preset.nodes);

    let (_, readme) = nodes.iter().find(|(id, _)| id == "README.md").unwrap();
    assert_eq!(readme.get("hash"), Some(AttrValue::from(vec!["fc3527c", "51ba020"])));
    assert_eq!(readme.records, vec!["fc3527c", "51ba020"]);

    let (_, alice) = nodes.iter().find(|(id, _)| id == "Alice").unwrap();
    assert_eq!(alice.get("email"), Some(AttrValue::from("alice@gmail.com")));
    assert_eq!(alice.get("fedits"), Some(AttrValue::from(vec![1_i64, 3])));
}

#[test]
fn colours_follow_node_type_and_extension() {
    let preset = NetworkPreset::named("author/file/simple").unwrap();
    let mut nodes = sample().generate_nodes(&preset.mode1, &preset.mode2, &preset.nodes);
    node_attribute(&mut nodes, "colour", node_colours);

    let colour = |id: &str| {
        nodes
            .iter()
            .find(|(n, _)| n == id)
            .and_then(|(_, attrs)| attrs.get("colour"))
    };
    assert_eq!(colour("Carol"), Some(NodeColour::DodgerBlue.into()));
    assert_eq!(colour("src/net.py"), Some(NodeColour::Tomato.into()));
    assert_eq!(colour("src/net.cc"), Some(NodeColour::Gold.into()));
    assert_eq!(colour("src/net.h"), Some(NodeColour::Goldenrod.into()));
    assert_eq!(colour("README.md"), Some(NodeColour::LightGrey.into()));
}

// ── Export ───────────────────────────────────────────────────────

#[test]
fn edge_list_csv() {
    let log = sample().filter_by("author", "equals", "Bob", false).unwrap();
    let edges = log.generate_edges("author", "files", EdgeHelper::Changes, &strings(&["date"]));
    let mut buf = Vec::new();
    write_edges(&mut buf, &edges, &strings(&["weight", "date", "hash"])).unwrap();
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "id1,id2,weight,date,hash\n\
         Bob,README.md,1,5-7-2016,NA\n\
         Bob,data/miles.txt.gz,1,5-7-2016,NA\n\
         Bob,src/net.py,7,5-7-2016,NA\n"
    );
}

#[test]
fn node_list_csv() {
    let log = sample().filter_by("author", "equals", "Carol", false).unwrap();
    let preset = NetworkPreset::named("author/file").unwrap();
    let nodes = log.generate_nodes(&preset.mode1, &preset.mode2, &preset.nodes);
    let mut buf = Vec::new();
    write_nodes(&mut buf, &nodes, &strings(&["email", "hash"])).unwrap();
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "id,type,email,hash\n\
         Carol,author,carol@gmail.com,7c4d2b9\n\
         src/net.cc,files,NA,7c4d2b9\n\
         src/net.h,files,NA,7c4d2b9\n"
    );
}

#[test]
fn tsv_skips_ignored_tags() {
    let log = sample().filter_by("author", "equals", "Carol", false).unwrap();
    let mut buf = Vec::new();
    write_tsv(&mut buf, &log, &strings(&["changes", "summary"])).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("hash\tauthor\temail\tdate\tfedits\tfiles"));
    assert_eq!(
        lines.next(),
        Some("7c4d2b9\tCarol\tcarol@gmail.com\tMon May 9 11:00:00 2016 -0400\t2\tsrc/net.cc;src/net.h")
    );
    assert_eq!(lines.next(), None);
}

// ── Properties ───────────────────────────────────────────────────

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn filter_and_negation_partition_the_log(
            tag in prop::sample::select(vec!["author", "email", "files", "date", "merge"]),
            pattern in prop::sample::select(vec!["Alice", ".*", "src/.*", ".*gmail.*", "B.b", "nothing"]),
        ) {
            let log = sample();
            let predicate = Predicate::new("equals", AttrValue::from(pattern)).unwrap();
            let kept = log.filter(tag, &predicate, false);
            let dropped = log.filter(tag, &predicate, true);
            prop_assert_eq!(kept.len() + dropped.len(), log.len());
            for key in kept.keys() {
                prop_assert!(dropped.get(key).is_none());
            }
        }
    }
}
