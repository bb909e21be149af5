//! Citation Skill: turns ranked passages into a stable, numbered citation list and
//! strips any `[Source N]` marker a generated answer invents for a citation that doesn't exist.

use serde::{Deserialize, Serialize};

use crate::chunk::RetrievedPassage;

/// A single numbered reference rendered in an answer as `[Source N]` and listed alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based, dense within one answer.
    pub index: usize,
    pub source: String,
    pub title: String,
    pub section: Option<String>,
    pub relevance_score: f64,
}

/// Build a deduplicated, densely-numbered citation list from passages selected for one answer.
///
/// Passages sharing `(source, section)` collapse into a single citation that keeps the highest
/// score seen; numbering follows insertion order of first appearance, using the same
/// `HashMap`-fold pattern for deduplicating ragged context documents as `rig-core/src/rag.rs`.
pub fn build_citations(passages: &[RetrievedPassage]) -> Vec<Citation> {
    let mut index_of: std::collections::HashMap<(String, Option<String>), usize> =
        std::collections::HashMap::new();
    let mut out: Vec<Citation> = Vec::new();

    for passage in passages {
        let key = (passage.chunk.source.clone(), passage.chunk.section.clone());
        if let Some(&i) = index_of.get(&key) {
            if passage.score > out[i].relevance_score {
                out[i].relevance_score = passage.score;
            }
        } else {
            index_of.insert(key, out.len());
            out.push(Citation {
                index: out.len() + 1,
                source: passage.chunk.source.clone(),
                title: passage.chunk.title.clone(),
                section: passage.chunk.section.clone(),
                relevance_score: passage.score,
            });
        }
    }

    out
}

/// Merge citation lists from multiple agents in a multi-domain synthesis, deduplicating by
/// `(source, section)` across all of them and renumbering 1..N.
pub fn merge_citations(lists: impl IntoIterator<Item = Vec<Citation>>) -> Vec<Citation> {
    let flattened: Vec<Citation> = lists
        .into_iter()
        .flatten()
        .map(|c| crate::chunk::RetrievedPassage {
            chunk: crate::chunk::Chunk {
                chunk_id: String::new(),
                document_id: String::new(),
                text: String::new(),
                source: c.source,
                title: c.title,
                section: c.section,
                domain: None,
            },
            score: c.relevance_score,
            rank: 0,
        })
        .collect();
    build_citations(&flattened)
}

/// Strip any `[Source k]` marker whose `k` is out of range of `citations` — an illegal reference
/// that must never reach the client. Returns the cleaned text; the
/// citation list itself is never mutated by this step, only the in-line markers are.
pub fn drop_illegal_markers(text: &str, citation_count: usize) -> String {
    let (mut out, remainder) = split_clean_prefix(text, citation_count);
    out.push_str(&remainder);
    out
}

/// Incremental counterpart to [`drop_illegal_markers`] for a streaming answer. `buf` is the full
/// carry-over buffer (previous remainder plus the newly arrived delta); returns the text that is
/// now safe to emit and a remainder to hold back because it may still be an in-progress
/// `[Source ` marker that a later chunk completes. Call [`drop_illegal_markers`] on whatever
/// remainder is left once the underlying stream ends, since an unterminated marker at that point
/// gets no more chances to complete.
pub(crate) fn split_clean_prefix(buf: &str, citation_count: usize) -> (String, String) {
    const MARKER: &str = "[Source ";
    let mut out = String::with_capacity(buf.len());
    let mut rest = buf;

    loop {
        match rest.find(MARKER) {
            Some(start) => {
                out.push_str(&rest[..start]);
                let after = &rest[start + MARKER.len()..];
                match after.find(']') {
                    Some(end) => {
                        let digits = &after[..end];
                        let keep = digits
                            .trim()
                            .parse::<usize>()
                            .map(|n| n >= 1 && n <= citation_count)
                            .unwrap_or(false);
                        if keep {
                            out.push_str(MARKER);
                            out.push_str(digits);
                            out.push(']');
                        }
                        rest = &after[end + 1..];
                    }
                    None => {
                        // Marker not yet terminated by a later chunk; hold the whole thing back.
                        return (out, format!("{MARKER}{after}"));
                    }
                }
            }
            None => {
                let hold = partial_marker_suffix_len(rest, MARKER);
                let safe = rest.len() - hold;
                out.push_str(&rest[..safe]);
                return (out, rest[safe..].to_string());
            }
        }
    }
}

/// Longest suffix of `s` that is a strict prefix of `marker` — the part that must be held back
/// because the next chunk could complete it into a marker. ASCII-only pattern, so every candidate
/// length lands on a UTF-8 character boundary of `s`.
fn partial_marker_suffix_len(s: &str, marker: &str) -> usize {
    let max = marker.len().min(s.len());
    (1..=max).rev().find(|&len| s.ends_with(&marker[..len])).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, Domain};

    fn passage(source: &str, section: Option<&str>, score: f64) -> RetrievedPassage {
        RetrievedPassage {
            chunk: Chunk {
                chunk_id: format!("{source}-{score}"),
                document_id: "doc".into(),
                text: "text".into(),
                source: source.to_string(),
                title: "Title".to_string(),
                section: section.map(str::to_string),
                domain: Some(Domain::Hardware),
            },
            score,
            rank: 0,
        }
    }

    #[test]
    fn dedups_by_source_and_section_keeping_highest_score() {
        let passages = vec![
            passage("a.md", Some("intro"), 0.8),
            passage("a.md", Some("intro"), 0.95),
            passage("b.md", None, 0.5),
        ];
        let citations = build_citations(&passages);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].index, 1);
        assert_eq!(citations[0].relevance_score, 0.95);
        assert_eq!(citations[1].index, 2);
    }

    #[test]
    fn numbering_is_dense_and_one_based() {
        let passages = vec![
            passage("a.md", None, 0.9),
            passage("b.md", None, 0.8),
            passage("c.md", None, 0.7),
        ];
        let citations = build_citations(&passages);
        let indices: Vec<usize> = citations.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn merge_renumbers_after_dedup_across_agents() {
        let list_a = build_citations(&[passage("a.md", None, 0.9)]);
        let list_b = build_citations(&[passage("a.md", None, 0.4), passage("b.md", None, 0.6)]);
        let merged = merge_citations([list_a, list_b]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source, "a.md");
        assert_eq!(merged[0].relevance_score, 0.9);
        assert_eq!(merged[1].source, "b.md");
    }

    #[test]
    fn drops_out_of_range_markers() {
        let text = "Topics are named [Source 1]. This is invented [Source 9].";
        let cleaned = drop_illegal_markers(text, 1);
        assert!(cleaned.contains("[Source 1]"));
        assert!(!cleaned.contains("[Source 9]"));
    }

    #[test]
    fn leaves_valid_markers_untouched() {
        let text = "See [Source 1] and [Source 2].";
        let cleaned = drop_illegal_markers(text, 2);
        assert_eq!(cleaned, text);
    }

    #[test]
    fn split_clean_prefix_holds_back_a_marker_split_across_chunks() {
        let (ready, carry) = split_clean_prefix("A topic is a channel [Sou", 1);
        assert_eq!(ready, "A topic is a channel ");
        assert_eq!(carry, "[Sou");

        let (ready, carry) = split_clean_prefix(&format!("{carry}rce 1] indeed."), 1);
        assert_eq!(ready, "[Source 1] indeed.");
        assert_eq!(carry, "");
    }

    #[test]
    fn split_clean_prefix_drops_illegal_marker_once_complete() {
        let (ready, carry) = split_clean_prefix("See [Source 9] please", 1);
        assert_eq!(ready, "See  please");
        assert_eq!(carry, "");
    }

    #[test]
    fn split_clean_prefix_emits_plain_text_immediately() {
        let (ready, carry) = split_clean_prefix("plain text with no markers", 2);
        assert_eq!(ready, "plain text with no markers");
        assert_eq!(carry, "");
    }
}
