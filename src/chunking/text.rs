//! Structural chunking for free text.
//!
//! Section boundaries are detected by an ordered set of line-anchored detectors; each detected
//! section becomes one chunk when it fits the budget, or is split further with a repeated
//! `[Section Title]` context header so every sub-chunk stays self-describing. Fenced and
//! indented code blocks are never split across chunk boundaries.

use super::{DraftChunk, Importance, classify_importance, fallback};
use regex::Regex;
use std::sync::LazyLock;

/// Detected slices shorter than this are treated as header noise and discarded.
const NOISE_THRESHOLD: usize = 50;

static NUMBERED_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s{0,3}\d+(?:\.\d+)*[.)]?\s+\S.*$").expect("numbered header pattern")
});
static MARKDOWN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+\S.*$").expect("markdown header pattern"));
static UPPERCASE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:SECTION|CHAPTER|PART|APPENDIX)\s+\d+\s*[:.]?\s*\S.*$")
        .expect("uppercase marker pattern")
});
static COMMON_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^(?:introduction|background|methodology|requirements|conclusion|references|summary|overview|appendix)\b.*$",
    )
    .expect("common label pattern")
});

/// A detected section boundary: byte offset of the header line and its display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBoundary {
    /// Byte offset of the header line within the source text.
    pub position: usize,
    /// Title shown in the overview chunk and used for importance classification.
    pub title: String,
}

/// Run all boundary detectors and return the merged matches sorted by position.
///
/// When several detectors fire on the same line, the earliest-registered detector wins
/// (numbered, then markdown, then uppercase markers, then the common-label vocabulary).
pub fn detect_section_boundaries(text: &str) -> Vec<SectionBoundary> {
    let mut boundaries = Vec::new();
    for regex in [
        &*NUMBERED_HEADER,
        &*MARKDOWN_HEADER,
        &*UPPERCASE_MARKER,
        &*COMMON_LABEL,
    ] {
        for found in regex.find_iter(text) {
            boundaries.push(SectionBoundary {
                position: found.start(),
                title: title_from_line(found.as_str()),
            });
        }
    }
    boundaries.sort_by_key(|boundary| boundary.position);
    boundaries.dedup_by_key(|boundary| boundary.position);
    boundaries
}

fn title_from_line(line: &str) -> String {
    line.trim().trim_start_matches('#').trim().to_string()
}

/// Chunk free text along detected section boundaries.
///
/// Emits a high-importance document overview listing every detected title, then one or more
/// chunks per section. Text with no detectable structure falls back to paragraph grouping
/// with topic-shift detection.
pub fn chunk_sectioned_text(text: &str, max_size: usize) -> Vec<DraftChunk> {
    let boundaries = detect_section_boundaries(text);
    if boundaries.is_empty() {
        tracing::debug!("No section boundaries detected; using paragraph fallback");
        return fallback::chunk_paragraph_groups(text, max_size);
    }

    let mut chunks = vec![overview_chunk(&boundaries)];
    for (i, boundary) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(i + 1)
            .map_or(text.len(), |next| next.position);
        let slice = text[boundary.position..end].trim();
        if slice.len() < NOISE_THRESHOLD {
            continue;
        }
        if slice.len() <= max_size {
            chunks.push(DraftChunk {
                text: slice.to_string(),
                section: boundary.title.clone(),
                importance: classify_importance(&boundary.title),
            });
        } else {
            chunks.extend(split_oversized_section(slice, &boundary.title, max_size));
        }
    }
    chunks
}

fn overview_chunk(boundaries: &[SectionBoundary]) -> DraftChunk {
    let mut lines = Vec::with_capacity(boundaries.len() + 1);
    lines.push("Document sections:".to_string());
    lines.extend(
        boundaries
            .iter()
            .map(|boundary| format!("- {}", boundary.title)),
    );
    DraftChunk {
        text: lines.join("\n"),
        section: "Document Overview".into(),
        importance: Importance::High,
    }
}

/// Split a section that exceeds the budget, preserving code blocks whole.
fn split_oversized_section(slice: &str, title: &str, max_size: usize) -> Vec<DraftChunk> {
    if contains_code_blocks(slice) {
        return split_code_aware(slice, title, max_size);
    }

    let header = context_header(title);
    let body_budget = max_size.saturating_sub(header.len()).max(1);
    fallback::paragraph_groups(slice, body_budget)
        .into_iter()
        .map(|group| DraftChunk {
            text: format!("{header}{group}"),
            section: title.to_string(),
            importance: classify_importance(title),
        })
        .collect()
}

fn context_header(title: &str) -> String {
    format!("[{title}]\n\n")
}

fn contains_code_blocks(slice: &str) -> bool {
    slice.contains("```")
        || slice.contains("<code>")
        || slice
            .lines()
            .any(|line| line.starts_with("    ") && !line.trim().is_empty())
}

#[derive(Debug)]
enum Part {
    Prose(String),
    Code(String),
}

/// Walk a section as an alternating sequence of prose and code parts.
///
/// Fenced blocks keep their fences; an unterminated fence swallows the remainder of the
/// section so no chunk ever carries a dangling open fence.
fn split_parts(slice: &str) -> Vec<Part> {
    #[derive(PartialEq)]
    enum State {
        Prose,
        Fence,
        Indent,
    }

    let mut parts = Vec::new();
    let mut buffer = String::new();
    let mut state = State::Prose;

    let close = |buffer: &mut String, parts: &mut Vec<Part>, state: &State| {
        if !buffer.trim().is_empty() {
            let text = std::mem::take(buffer);
            parts.push(match state {
                State::Prose => Part::Prose(text),
                _ => Part::Code(text),
            });
        } else {
            buffer.clear();
        }
    };

    for line in slice.lines() {
        match state {
            State::Prose => {
                if line.trim_start().starts_with("```") {
                    close(&mut buffer, &mut parts, &state);
                    buffer.push_str(line);
                    buffer.push('\n');
                    state = State::Fence;
                } else if line.starts_with("    ") && !line.trim().is_empty() {
                    close(&mut buffer, &mut parts, &state);
                    buffer.push_str(line);
                    buffer.push('\n');
                    state = State::Indent;
                } else {
                    buffer.push_str(line);
                    buffer.push('\n');
                }
            }
            State::Fence => {
                buffer.push_str(line);
                buffer.push('\n');
                if line.trim_start().starts_with("```") {
                    close(&mut buffer, &mut parts, &state);
                    state = State::Prose;
                }
            }
            State::Indent => {
                if line.starts_with("    ") || line.trim().is_empty() {
                    buffer.push_str(line);
                    buffer.push('\n');
                } else {
                    close(&mut buffer, &mut parts, &state);
                    state = State::Prose;
                    buffer.push_str(line);
                    buffer.push('\n');
                }
            }
        }
    }
    close(&mut buffer, &mut parts, &state);
    parts
}

/// Accumulate prose and code parts into budgeted chunks with a repeated context header.
///
/// A code block that cannot fit alongside the current buffer is emitted as its own
/// high-importance chunk, even when it alone exceeds the budget.
fn split_code_aware(slice: &str, title: &str, max_size: usize) -> Vec<DraftChunk> {
    let header = context_header(title);
    let importance = classify_importance(title);
    let mut chunks = Vec::new();
    let mut body = String::new();

    for part in split_parts(slice) {
        match part {
            Part::Code(code) => {
                let code = code.trim_end().to_string();
                if !body.is_empty() && header.len() + body.len() + code.len() + 2 > max_size {
                    flush_body(&header, title, importance, &mut body, &mut chunks);
                }
                if header.len() + code.len() > max_size {
                    // Dedicated chunk: fences are never split, whatever the budget says.
                    chunks.push(DraftChunk {
                        text: format!("{header}{code}"),
                        section: title.to_string(),
                        importance: Importance::High,
                    });
                } else {
                    append_part(&mut body, &code);
                }
            }
            Part::Prose(prose) => {
                for paragraph in fallback::split_paragraphs(&prose) {
                    if !body.is_empty()
                        && header.len() + body.len() + paragraph.len() + 2 > max_size
                    {
                        flush_body(&header, title, importance, &mut body, &mut chunks);
                    }
                    append_part(&mut body, paragraph);
                }
            }
        }
    }
    flush_body(&header, title, importance, &mut body, &mut chunks);
    chunks
}

fn append_part(body: &mut String, part: &str) {
    if !body.is_empty() {
        body.push_str("\n\n");
    }
    body.push_str(part);
}

fn flush_body(
    header: &str,
    title: &str,
    importance: Importance,
    body: &mut String,
    chunks: &mut Vec<DraftChunk>,
) {
    if body.trim().is_empty() {
        body.clear();
        return;
    }
    chunks.push(DraftChunk {
        text: format!("{header}{}", body.trim_end()),
        section: title.to_string(),
        importance,
    });
    body.clear();
}
