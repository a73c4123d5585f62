//! Streaming RSS/Atom parser.
//!
//! One forward pass over the document's XML events, tracking open
//! elements on an explicit stack instead of building a tree. A small
//! context state machine, recomputed from the innermost recognized
//! ancestor on every tag boundary, routes text into feed or entry
//! fields; unrecognized nested markup cannot corrupt it. Completed
//! entries go straight into the feed's bounded set, and parsing stops
//! as soon as that set is full — feeds are assumed reverse-
//! chronological, so anything past the retention cap would be evicted
//! anyway. Non-chronological feeds therefore yield incomplete results;
//! known limitation.

use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::model::{Entry, Feed, FeedKind};

/// Maximum allowed element nesting depth. Feeds are shallow documents;
/// anything deeper is hostile or broken.
const MAX_DEPTH: usize = 50;

/// Feed-scoped parse failures. The feed keeps whatever entries were
/// accumulated before the error; callers log and move on to the next
/// feed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed XML partway through the document.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// Element nesting exceeds [`MAX_DEPTH`].
    #[error("element nesting exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// Non-fatal incidents from a completed parse.
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Timestamp strings that failed to parse. Each leaves the entry's
    /// `updated` unchanged.
    pub bad_dates: usize,
}

/// Innermost recognized ancestor of the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    AtomRoot,
    RssRoot,
    Channel,
    Entry,
    None,
}

/// Recompute the context from the open-element stack. Scanning from the
/// innermost element out means stray nesting between recognized tags is
/// simply skipped over.
fn context_of(stack: &[String]) -> Context {
    for name in stack.iter().rev() {
        match name.as_str() {
            "item" | "entry" => return Context::Entry,
            "channel" => return Context::Channel,
            "feed" => return Context::AtomRoot,
            "rss" => return Context::RssRoot,
            _ => {}
        }
    }
    Context::None
}

/// Parse a raw feed document into `feed`, retaining at most the
/// capacity of its entry set.
///
/// Accepts either dialect without validation; the root tag decides
/// `feed.kind` and the timestamp format. Malformed input is
/// best-effort: entries accumulated before the error stay in the feed
/// and the error is returned for feed-scoped reporting. Unparsable
/// timestamps are logged, counted in the [`ParseReport`], and never
/// fatal.
pub fn parse_into(feed: &mut Feed, raw: &[u8]) -> Result<ParseReport, ParseError> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut context = Context::None;
    let mut post: Option<Entry> = None;
    let mut report = ParseReport::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "rss" => feed.kind = FeedKind::Rss,
                    "feed" => feed.kind = FeedKind::Atom,
                    "item" | "entry" => {
                        if post.is_none() {
                            post = Some(Entry::new("", "", 0));
                        }
                    }
                    _ => {}
                }
                stack.push(name);
                if stack.len() > MAX_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_DEPTH));
                }
                context = context_of(&stack);
            }
            Ok(Event::End(e)) => {
                let closes_entry = matches!(e.local_name().as_ref(), b"item" | b"entry");
                stack.pop();
                context = context_of(&stack);
                if closes_entry {
                    if let Some(done) = post.take() {
                        feed.entries.insert_or_refresh(finalize(done));
                    }
                    if feed.entries.is_full() {
                        break;
                    }
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ParseError::Xml(e.to_string()))?
                    .into_owned();
                handle_text(feed, &mut post, &mut report, context, &stack, text.trim());
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                handle_text(feed, &mut post, &mut report, context, &stack, text.trim());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // declarations, comments, PIs, self-closing tags
            Err(e) => return Err(ParseError::Xml(e.to_string())),
        }
        buf.clear();
    }

    if feed.id.is_empty() {
        feed.id = feed.url.clone();
    }

    Ok(report)
}

/// Route character data by enclosing tag and context.
fn handle_text(
    feed: &mut Feed,
    post: &mut Option<Entry>,
    report: &mut ParseReport,
    context: Context,
    stack: &[String],
    text: &str,
) {
    let Some(enclosing) = stack.last() else {
        return;
    };

    match enclosing.as_str() {
        "title" => match context {
            Context::Channel | Context::AtomRoot => feed.title = text.to_string(),
            Context::Entry => {
                if let Some(post) = post {
                    post.title = text.to_string();
                }
            }
            _ => {}
        },
        // RSS has no feed-level id element; the channel link stands in.
        "link" if context == Context::Channel => feed.id = text.to_string(),
        "guid" | "id" => {
            if context == Context::Entry {
                if let Some(post) = post {
                    post.id = text.to_string();
                }
            } else if context == Context::AtomRoot {
                feed.id = text.to_string();
            }
        }
        "pubDate" | "published" | "updated" if context == Context::Entry => {
            let Some(post) = post else { return };
            match parse_timestamp(feed.kind, text) {
                // A feed may emit several date fields for one entry;
                // a later field must not regress the timestamp.
                Ok(ts) => post.updated = post.updated.max(ts),
                Err(e) => {
                    report.bad_dates += 1;
                    tracing::warn!(
                        feed = %feed.id,
                        post = %post.title,
                        value = %text,
                        error = %e,
                        "Unparsable entry timestamp, leaving as-is"
                    );
                }
            }
        }
        _ => {}
    }
}

/// Timestamp format follows the dialect: RFC-1123-style dates for RSS
/// (a fixed subset of RFC 2822, obsolete zone names included) and
/// RFC 3339 for Atom.
fn parse_timestamp(kind: FeedKind, text: &str) -> Result<i64, chrono::ParseError> {
    let parsed = match kind {
        FeedKind::Rss => DateTime::parse_from_rfc2822(text)?,
        FeedKind::Atom => DateTime::parse_from_rfc3339(text)?,
    };
    Ok(parsed.timestamp())
}

/// Entries must never leave the parser without an identity. Documents
/// that omit guid/id get a stable hash of the fields we do have.
fn finalize(mut post: Entry) -> Entry {
    if post.id.trim().is_empty() {
        let hash = Sha256::digest(format!("{}|{}", post.title, post.updated).as_bytes());
        post.id = format!("{:x}", hash);
    }
    post
}
