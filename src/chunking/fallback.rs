//! Paragraph-group and line-group fallback splitters.

use super::{DraftChunk, Importance};
use regex::Regex;
use std::sync::LazyLock;

/// Cue phrases that force a chunk boundary independent of size.
pub const TOPIC_SHIFT_CUES: [&str; 11] = [
    "however,",
    "on the other hand",
    "in contrast",
    "similarly",
    "furthermore",
    "moving on",
    "next",
    "additionally",
    "in summary",
    "to conclude",
    "finally",
];

/// Lines carried from the tail of one line-group chunk into the next as overlap context.
const LINE_OVERLAP: usize = 3;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));

/// Split text into trimmed, non-empty paragraphs.
pub(crate) fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Group paragraphs into size-bounded buffers, flushing early on topic-shift cues.
///
/// Returns raw group strings so callers can attach their own headers and metadata.
pub(crate) fn paragraph_groups(text: &str, max_size: usize) -> Vec<String> {
    let mut groups = Vec::new();
    let mut buffer = String::new();

    for paragraph in split_paragraphs(text) {
        let boundary = !buffer.is_empty()
            && (buffer.len() + paragraph.len() + 2 > max_size || has_topic_shift(paragraph));
        if boundary {
            groups.push(std::mem::take(&mut buffer));
        }
        if !buffer.is_empty() {
            buffer.push_str("\n\n");
        }
        buffer.push_str(paragraph);
    }
    if !buffer.trim().is_empty() {
        groups.push(buffer);
    }
    groups
}

/// Paragraph-group chunking used when no section structure is detectable.
pub fn chunk_paragraph_groups(text: &str, max_size: usize) -> Vec<DraftChunk> {
    paragraph_groups(text, max_size)
        .into_iter()
        .enumerate()
        .map(|(i, group)| DraftChunk {
            text: group,
            section: format!("Passage {}", i + 1),
            importance: Importance::Standard,
        })
        .collect()
}

fn has_topic_shift(paragraph: &str) -> bool {
    let lowered = paragraph.to_lowercase();
    TOPIC_SHIFT_CUES.iter().any(|cue| lowered.contains(cue))
}

/// Last-resort line-group splitter for JSON-shaped payloads that failed to parse.
///
/// Accumulates raw lines up to the budget; each flush carries its last few lines forward as
/// overlap so field context survives the cut.
pub fn chunk_line_groups(text: &str, max_size: usize) -> Vec<DraftChunk> {
    let mut chunks: Vec<DraftChunk> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut buffer_len = 0usize;
    let mut appended_since_flush = false;

    for line in text.lines() {
        if appended_since_flush && buffer_len + line.len() + 1 > max_size {
            push_line_chunk(&mut chunks, &buffer);
            buffer = buffer[buffer.len().saturating_sub(LINE_OVERLAP)..].to_vec();
            buffer_len = buffer.iter().map(|kept| kept.len() + 1).sum();
            appended_since_flush = false;
        }
        buffer_len += line.len() + 1;
        buffer.push(line);
        appended_since_flush = true;
    }
    if appended_since_flush && buffer.iter().any(|line| !line.trim().is_empty()) {
        push_line_chunk(&mut chunks, &buffer);
    }
    chunks
}

fn push_line_chunk(chunks: &mut Vec<DraftChunk>, lines: &[&str]) {
    chunks.push(DraftChunk {
        text: lines.join("\n"),
        section: format!("Fragment {}", chunks.len() + 1),
        importance: Importance::Standard,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_flush_when_the_budget_is_reached() {
        let paragraph = "word ".repeat(30);
        let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
        let chunks = chunk_paragraph_groups(&text, 200);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 200 + paragraph.len());
            assert_eq!(chunk.importance, Importance::Standard);
        }
    }

    #[test]
    fn topic_shift_cues_force_a_boundary_before_the_cue_paragraph() {
        let text = "The ingestion flow reads documents from storage.\n\n\
                    However, retrieval quality depends on chunk granularity.";
        let groups = paragraph_groups(text, 10_000);
        assert_eq!(groups.len(), 2);
        assert!(groups[1].starts_with("However,"));
    }

    #[test]
    fn single_paragraph_yields_a_single_group() {
        let groups = paragraph_groups("Just one paragraph here.", 1500);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn passage_sections_are_numbered_in_order() {
        let text = "First topic paragraph.\n\nIn contrast, a second topic arrives.";
        let chunks = chunk_paragraph_groups(text, 1500);
        let sections: Vec<&str> = chunks.iter().map(|c| c.section.as_str()).collect();
        assert_eq!(sections, vec!["Passage 1", "Passage 2"]);
    }

    #[test]
    fn line_groups_carry_three_lines_of_overlap() {
        let lines: Vec<String> = (0..12).map(|i| format!("\"field_{i}\": {i},")).collect();
        let text = lines.join("\n");
        let chunks = chunk_line_groups(&text, 80);
        assert!(chunks.len() >= 2);

        let first_lines: Vec<&str> = chunks[0].text.lines().collect();
        let overlap: Vec<&str> = first_lines[first_lines.len() - LINE_OVERLAP..].to_vec();
        let second_lines: Vec<&str> = chunks[1].text.lines().collect();
        assert_eq!(&second_lines[..LINE_OVERLAP], overlap.as_slice());
    }

    #[test]
    fn line_groups_do_not_emit_a_trailing_overlap_only_chunk() {
        let text = "a\nb\nc";
        let chunks = chunk_line_groups(text, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "a\nb\nc");
    }
}
