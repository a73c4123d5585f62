//! Integration tests for the ingest pipeline: parse raw documents,
//! diff against a snapshot baseline, persist, and diff again on the
//! next "run".

use pretty_assertions::assert_eq;

use feedping::diff::diff;
use feedping::feed::parse_into;
use feedping::model::{Feed, Snapshot};
use feedping::storage::snapshot;

fn rss_doc(entries: &[(&str, &str, &str)]) -> String {
    let mut doc = String::from(
        r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
<title>Example Blog</title>
<link>https://example.com/</link>"#,
    );
    for (guid, title, date) in entries {
        doc.push_str(&format!(
            "<item><guid>{guid}</guid><title>{title}</title><pubDate>{date}</pubDate></item>"
        ));
    }
    doc.push_str("</channel></rss>");
    doc
}

fn parse(doc: &str, cap: usize) -> Feed {
    let mut feed = Feed::new("https://example.com/feed.xml", cap);
    parse_into(&mut feed, doc.as_bytes()).expect("document should parse");
    feed
}

fn temp_cache(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join("feedping_ingest_tests").join(name)
}

// ============================================================================
// First run: everything is new
// ============================================================================

#[test]
fn test_first_run_reports_whole_feed() {
    let doc = rss_doc(&[
        ("p3", "Third", "Tue, 03 Jan 2006 12:00:00 GMT"),
        ("p2", "Second", "Mon, 02 Jan 2006 12:00:00 GMT"),
        ("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT"),
    ]);
    let current = vec![parse(&doc, 10)];

    let report = diff(&Snapshot::default(), &current);
    assert_eq!(report.updates.len(), 1);
    assert_eq!(report.updates[0].entries.len(), 3);
    assert_eq!(report.new_posts, 3);
    assert_eq!(report.updates[0].title, "Example Blog");
}

// ============================================================================
// Steady state and change detection across runs
// ============================================================================

#[test]
fn test_unchanged_feed_across_runs_is_quiet() {
    let doc = rss_doc(&[
        ("p2", "Second", "Mon, 02 Jan 2006 12:00:00 GMT"),
        ("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT"),
    ]);

    let first = vec![parse(&doc, 10)];
    let baseline = Snapshot {
        fetched: 100,
        feeds: first,
    };

    let second = vec![parse(&doc, 10)];
    let report = diff(&baseline, &second);
    assert!(report.is_empty());
    assert_eq!(report.new_posts, 0);
}

#[test]
fn test_new_post_detected_on_next_run() {
    let old_doc = rss_doc(&[("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT")]);
    let baseline = Snapshot {
        fetched: 100,
        feeds: vec![parse(&old_doc, 10)],
    };

    let new_doc = rss_doc(&[
        ("p2", "Second", "Mon, 02 Jan 2006 12:00:00 GMT"),
        ("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT"),
    ]);
    let report = diff(&baseline, &[parse(&new_doc, 10)]);

    assert_eq!(report.updates.len(), 1);
    assert_eq!(report.updates[0].entries.len(), 1);
    assert_eq!(report.updates[0].entries[0].id, "p2");
    // Known feed with changes counts once, not per entry.
    assert_eq!(report.new_posts, 1);
}

#[test]
fn test_republished_entry_with_newer_timestamp_is_new() {
    let old_doc = rss_doc(&[("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT")]);
    let baseline = Snapshot {
        fetched: 100,
        feeds: vec![parse(&old_doc, 10)],
    };

    let bumped = rss_doc(&[("p1", "First (edited)", "Mon, 02 Jan 2006 12:00:00 GMT")]);
    let report = diff(&baseline, &[parse(&bumped, 10)]);
    assert_eq!(report.updates.len(), 1);
    assert_eq!(report.updates[0].entries[0].id, "p1");
}

#[test]
fn test_entry_aged_out_of_bounded_window_is_not_reported() {
    // Baseline retains the 2 newest of a 2-capacity window.
    let old_doc = rss_doc(&[
        ("p3", "Third", "Tue, 03 Jan 2006 12:00:00 GMT"),
        ("p2", "Second", "Mon, 02 Jan 2006 12:00:00 GMT"),
        ("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT"),
    ]);
    let baseline = Snapshot {
        fetched: 100,
        feeds: vec![parse(&old_doc, 2)],
    };

    // Next fetch: p1 has aged out of both windows; only p4 is new.
    let new_doc = rss_doc(&[
        ("p4", "Fourth", "Wed, 04 Jan 2006 12:00:00 GMT"),
        ("p3", "Third", "Tue, 03 Jan 2006 12:00:00 GMT"),
        ("p2", "Second", "Mon, 02 Jan 2006 12:00:00 GMT"),
    ]);
    let report = diff(&baseline, &[parse(&new_doc, 2)]);

    assert_eq!(report.updates.len(), 1);
    let ids: Vec<&str> = report.updates[0]
        .entries
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, ["p4"]);
}

// ============================================================================
// Snapshot persistence in the loop
// ============================================================================

#[tokio::test]
async fn test_diff_after_snapshot_round_trip() {
    let path = temp_cache("lifecycle.json");

    let doc = rss_doc(&[
        ("p2", "Second", "Mon, 02 Jan 2006 12:00:00 GMT"),
        ("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT"),
    ]);
    let first_run = Snapshot {
        fetched: 1700000000,
        feeds: vec![parse(&doc, 10)],
    };
    snapshot::store(&path, &first_run).unwrap();

    // Second run reloads the baseline from disk.
    let baseline = snapshot::load(&path).await;
    assert_eq!(baseline.fetched, 1700000000);

    let new_doc = rss_doc(&[
        ("p3", "Third", "Tue, 03 Jan 2006 12:00:00 GMT"),
        ("p2", "Second", "Mon, 02 Jan 2006 12:00:00 GMT"),
        ("p1", "First", "Sun, 01 Jan 2006 12:00:00 GMT"),
    ]);
    let report = diff(&baseline, &[parse(&new_doc, 10)]);

    assert_eq!(report.updates.len(), 1);
    assert_eq!(report.updates[0].entries.len(), 1);
    assert_eq!(report.updates[0].entries[0].title, "Third");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_mixed_dialects_diff_by_feed_identity() {
    let rss = rss_doc(&[("p1", "RSS post", "Sun, 01 Jan 2006 12:00:00 GMT")]);
    let atom = r#"<feed>
        <title>Atom Blog</title>
        <id>urn:atom-blog</id>
        <entry><id>a1</id><title>Atom post</title>
          <updated>2006-01-01T12:00:00Z</updated></entry>
    </feed>"#;

    let mut atom_feed = Feed::new("https://atom.example/feed.xml", 10);
    parse_into(&mut atom_feed, atom.as_bytes()).unwrap();
    let current = vec![parse(&rss, 10), atom_feed];

    let baseline = Snapshot {
        fetched: 100,
        feeds: current.clone(),
    };
    assert!(diff(&baseline, &current).is_empty());

    // Dropping one feed from the baseline makes exactly that feed new.
    let partial = Snapshot {
        fetched: 100,
        feeds: vec![current[0].clone()],
    };
    let report = diff(&partial, &current);
    assert_eq!(report.updates.len(), 1);
    assert_eq!(report.updates[0].title, "Atom Blog");
}

#[test]
fn test_notification_body_for_multi_feed_report() {
    let a = rss_doc(&[("p1", "Hello world", "Sun, 01 Jan 2006 12:00:00 GMT")]);
    let atom = r#"<feed>
        <title>Atom Blog</title><id>urn:atom-blog</id>
        <entry><id>a1</id><title>Shipping v1.0</title>
          <updated>2006-01-01T12:00:00Z</updated></entry>
    </feed>"#;

    let mut atom_feed = Feed::new("https://atom.example/feed.xml", 10);
    parse_into(&mut atom_feed, atom.as_bytes()).unwrap();
    let current = vec![parse(&a, 10), atom_feed];

    let report = diff(&Snapshot::default(), &current);
    assert_eq!(report.new_posts, 2);
    assert_eq!(
        report.body(),
        "[Example Blog]\nHello world\n\n[Atom Blog]\nShipping v1.0"
    );
    assert_eq!(report.summary(), "2 new posts");
}
