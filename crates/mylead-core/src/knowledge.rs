//! Flat-file knowledge corpus: parsed once at startup, read-only afterward.
//!
//! The corpus format is `---`-delimited blocks, each carrying a `Topic:` line
//! and a `Details:` line. Retrieval is a lexical keyword match against both
//! fields; there is no ranking and no semantic search.

use std::path::Path;

const ENTRY_DELIMITER: &str = "---";
const TOPIC_PREFIX: &str = "Topic:";
const DETAILS_PREFIX: &str = "Details:";

/// Default number of context entries handed to the prompt assembler.
pub const DEFAULT_TOP_N: usize = 3;

/// One topic/details record from the corpus. Identity is positional;
/// duplicate records are retained as loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub topic: String,
    pub details: String,
}

/// Ordered, immutable sequence of knowledge entries. Safe for unsynchronized
/// concurrent reads once constructed.
pub struct KnowledgeStore {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeStore {
    /// Store with no entries (no corpus configured). Retrieval always yields
    /// no context.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Loads the corpus at `path`. A missing or unreadable file yields an
    /// empty store so the broker stays up with degraded helpfulness.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let store = Self::from_corpus(&text);
                tracing::info!(
                    target: "mylead::knowledge",
                    path = %path.display(),
                    entries = store.len(),
                    "knowledge corpus loaded"
                );
                store
            }
            Err(e) => {
                tracing::warn!(
                    target: "mylead::knowledge",
                    path = %path.display(),
                    error = %e,
                    "knowledge corpus unavailable; continuing with an empty store"
                );
                Self::empty()
            }
        }
    }

    /// Parses corpus text. Blocks are separated by a line containing only the
    /// `---` delimiter; a block missing either field is dropped without error.
    pub fn from_corpus(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        for line in text.lines().chain(std::iter::once(ENTRY_DELIMITER)) {
            if line.trim() == ENTRY_DELIMITER {
                if let Some(entry) = parse_block(&block) {
                    entries.push(entry);
                }
                block.clear();
            } else {
                block.push(line);
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extracts the first `Topic:` and `Details:` lines of a block (exact,
/// case-sensitive prefixes; values trimmed).
fn parse_block(lines: &[&str]) -> Option<KnowledgeEntry> {
    let field = |prefix: &str| {
        lines
            .iter()
            .find_map(|line| line.strip_prefix(prefix))
            .map(|value| value.trim().to_string())
    };
    let topic = field(TOPIC_PREFIX)?;
    let details = field(DETAILS_PREFIX)?;
    Some(KnowledgeEntry { topic, details })
}

/// Lexical keyword-overlap retrieval: returns up to `top_n` distinct
/// `details` strings in store order. An entry matches when any
/// whitespace-delimited query token is a substring of its lower-cased topic
/// or details. Empty query, empty store, and no match all yield an empty
/// result; retrieval never fails.
pub fn retrieve(query: &str, store: &KnowledgeStore, top_n: usize) -> Vec<String> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<String> = Vec::new();
    for entry in store.entries() {
        if out.len() == top_n {
            break;
        }
        let topic = entry.topic.to_lowercase();
        let details = entry.details.to_lowercase();
        let matched = tokens
            .iter()
            .any(|t| topic.contains(t.as_str()) || details.contains(t.as_str()));
        if matched && !out.iter().any(|seen| seen == &entry.details) {
            out.push(entry.details.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_store() -> KnowledgeStore {
        KnowledgeStore {
            entries: vec![
                KnowledgeEntry {
                    topic: "printer".into(),
                    details: "Printers are on floor 2".into(),
                },
                KnowledgeEntry {
                    topic: "wifi".into(),
                    details: "Use network LEAD-Internal".into(),
                },
            ],
        }
    }

    #[test]
    fn parses_delimited_corpus() {
        let text = "Topic: printer\nDetails: Printers are on floor 2\n---\nTopic: wifi\nDetails: Use network LEAD-Internal\n";
        let store = KnowledgeStore::from_corpus(text);
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].topic, "printer");
        assert_eq!(store.entries()[1].details, "Use network LEAD-Internal");
    }

    #[test]
    fn drops_blocks_missing_a_field() {
        let text = "Topic: orphan topic\n---\nDetails: orphan details\n---\nTopic: ok\nDetails: kept\n";
        let store = KnowledgeStore::from_corpus(text);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].topic, "ok");
    }

    #[test]
    fn delimiter_inside_details_line_does_not_split_blocks() {
        let text = "Topic: dashes\nDetails: use --- sparingly\n---\nTopic: next\nDetails: still parsed\n";
        let store = KnowledgeStore::from_corpus(text);
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].details, "use --- sparingly");
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        let text = "topic: lower\ndetails: lower\n---\nTopic: Upper\nDetails: kept\n";
        let store = KnowledgeStore::from_corpus(text);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].topic, "Upper");
    }

    #[test]
    fn missing_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = KnowledgeStore::load(dir.path().join("no_such_corpus.txt"));
        assert!(store.is_empty());
    }

    #[test]
    fn loads_corpus_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Topic: badges\nDetails: Badge requests go to the front office").unwrap();
        let store = KnowledgeStore::load(&path);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn retrieves_by_topic_keyword() {
        let store = sample_store();
        assert_eq!(
            retrieve("printer jam", &store, DEFAULT_TOP_N),
            vec!["Printers are on floor 2".to_string()]
        );
    }

    #[test]
    fn retrieves_by_details_keyword() {
        let store = sample_store();
        assert_eq!(
            retrieve("lead-internal password", &store, DEFAULT_TOP_N),
            vec!["Use network LEAD-Internal".to_string()]
        );
    }

    #[test]
    fn empty_query_and_empty_store_yield_nothing() {
        assert!(retrieve("", &sample_store(), DEFAULT_TOP_N).is_empty());
        assert!(retrieve("   ", &sample_store(), DEFAULT_TOP_N).is_empty());
        assert!(retrieve("printer", &KnowledgeStore::empty(), DEFAULT_TOP_N).is_empty());
    }

    #[test]
    fn deduplicates_and_truncates_in_store_order() {
        let store = KnowledgeStore {
            entries: vec![
                KnowledgeEntry {
                    topic: "vpn".into(),
                    details: "VPN guide".into(),
                },
                KnowledgeEntry {
                    topic: "vpn access".into(),
                    details: "VPN guide".into(),
                },
                KnowledgeEntry {
                    topic: "vpn troubleshooting".into(),
                    details: "Restart the VPN client".into(),
                },
                KnowledgeEntry {
                    topic: "vpn billing".into(),
                    details: "VPN licenses renew in July".into(),
                },
            ],
        };
        let hits = retrieve("vpn", &store, 2);
        assert_eq!(
            hits,
            vec!["VPN guide".to_string(), "Restart the VPN client".to_string()]
        );
    }
}
