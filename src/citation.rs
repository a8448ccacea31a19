//! Context assembly, citations, and the confidence heuristic.
//!
//! Citation numbering is presentation logic entangled with retrieval, so
//! it lives here as pure functions over the final ranked sequence, kept
//! separate from both the pipeline and the LLM client.

use serde::{Deserialize, Serialize};

use crate::document::SearchResult;

/// Maximum preview length for a citation's text, in characters.
const PREVIEW_CHARS: usize = 200;

/// A numbered reference from an answer back to the chunk that grounds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CitedSource {
    /// 1-based citation id equal to the chunk's rank in the final ordering.
    pub id: usize,
    /// Preview of the chunk text (truncated to 200 characters).
    pub text: String,
    /// The chunk's final relevance score.
    pub score: f32,
    /// Source identifier from chunk metadata, `"Unknown"` when absent.
    pub source: String,
    /// The chunk's position within its source document.
    pub position: usize,
}

/// A coarse answer-confidence label derived from aggregate retrieval
/// scores. A documented heuristic, not a calibrated probability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Average final score at or above the high threshold.
    High,
    /// Average final score at or above the medium threshold.
    Medium,
    /// Everything else, including the no-match case.
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// Derive a confidence label from the final-ranked scores.
///
/// Averages the scores and compares against the configured cut points;
/// an empty slice is `Low`.
pub fn confidence_from_scores(scores: &[f32], high: f32, medium: f32) -> Confidence {
    if scores.is_empty() {
        return Confidence::Low;
    }
    let avg = scores.iter().sum::<f32>() / scores.len() as f32;
    if avg >= high {
        Confidence::High
    } else if avg >= medium {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Assemble the context text and the parallel citation list from the
/// final ranked candidates.
///
/// Each candidate's text is prefixed by a bracketed 1-based citation
/// marker in rank order: `[1] first chunk text`, `[2] ...`. The returned
/// citations carry the same ids, so an answer's inline `[n]` markers
/// resolve against them.
pub fn build_context(candidates: &[SearchResult]) -> (String, Vec<CitedSource>) {
    let mut context = String::new();
    let mut citations = Vec::with_capacity(candidates.len());

    for (idx, candidate) in candidates.iter().enumerate() {
        let id = idx + 1;
        context.push_str(&format!("\n[{id}] {}\n", candidate.chunk.text));

        citations.push(CitedSource {
            id,
            text: preview(&candidate.chunk.text),
            score: candidate.score,
            source: candidate
                .chunk
                .metadata
                .get("source")
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            position: candidate.chunk.position,
        });
    }

    (context, citations)
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn result(text: &str, score: f32, source: Option<&str>) -> SearchResult {
        let mut metadata = HashMap::new();
        if let Some(source) = source {
            metadata.insert("source".to_string(), source.to_string());
        }
        SearchResult {
            chunk: Chunk {
                id: "c".to_string(),
                text: text.to_string(),
                position: 0,
                embedding: vec![],
                metadata,
                document_id: "d".to_string(),
            },
            score,
        }
    }

    #[test]
    fn citations_are_one_based_in_rank_order() {
        let candidates =
            vec![result("first", 0.9, Some("a.txt")), result("second", 0.7, Some("b.txt"))];
        let (context, citations) = build_context(&candidates);

        assert!(context.contains("[1] first"));
        assert!(context.contains("[2] second"));
        assert_eq!(citations[0].id, 1);
        assert_eq!(citations[1].id, 2);
        assert_eq!(citations[0].source, "a.txt");
    }

    #[test]
    fn missing_source_becomes_unknown() {
        let (_, citations) = build_context(&[result("text", 0.5, None)]);
        assert_eq!(citations[0].source, "Unknown");
    }

    #[test]
    fn long_text_is_previewed() {
        let long = "x".repeat(500);
        let (_, citations) = build_context(&[result(&long, 0.5, None)]);
        assert_eq!(citations[0].text.chars().count(), 203);
        assert!(citations[0].text.ends_with("..."));
    }

    #[test]
    fn empty_candidates_yield_empty_context() {
        let (context, citations) = build_context(&[]);
        assert!(context.is_empty());
        assert!(citations.is_empty());
    }

    #[test]
    fn confidence_buckets() {
        assert_eq!(confidence_from_scores(&[0.9, 0.8], 0.8, 0.6), Confidence::High);
        assert_eq!(confidence_from_scores(&[0.7, 0.6], 0.8, 0.6), Confidence::Medium);
        assert_eq!(confidence_from_scores(&[0.4], 0.8, 0.6), Confidence::Low);
        assert_eq!(confidence_from_scores(&[], 0.8, 0.6), Confidence::Low);
    }
}
