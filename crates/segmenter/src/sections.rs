use tutorloom_catalog::SectionKind;

use crate::headings::{Heading, detect_headings};

/// One heading-delimited section of the document, still at paragraph
/// granularity (paragraphs are the input to similarity grouping).
#[derive(Debug, Clone)]
pub struct Section {
    pub heading: Option<Heading>,
    pub kind: SectionKind,
    pub paragraphs: Vec<String>,
}

const MIN_PARAGRAPH_LEN: usize = 20;

/// Partition `text` into headed sections, dropping paragraphs shorter than
/// [`MIN_PARAGRAPH_LEN`] chars after trimming (spec §4.A step 3). A document
/// with no headings yields a single `Body` section containing everything.
pub fn split_sections(text: &str) -> Vec<Section> {
    let headings = detect_headings(text);
    let lines: Vec<&str> = text.lines().collect();

    if headings.is_empty() {
        let paragraphs = extract_paragraphs(&lines, 0, lines.len());
        return vec![Section { heading: None, kind: SectionKind::Body, paragraphs }];
    }

    let mut sections = Vec::with_capacity(headings.len() + 1);

    // Preamble before the first heading, if any non-blank content exists.
    let preamble = extract_paragraphs(&lines, 0, headings[0].source_line);
    if !preamble.is_empty() {
        sections.push(Section { heading: None, kind: SectionKind::Body, paragraphs: preamble });
    }

    for (idx, heading) in headings.iter().enumerate() {
        let body_start = heading_body_start(heading, &lines);
        let body_end = headings.get(idx + 1).map(|h| h.source_line).unwrap_or(lines.len());
        let paragraphs = extract_paragraphs(&lines, body_start, body_end);
        let kind = SectionKind::classify_heading(&heading.text.to_lowercase());
        sections.push(Section { heading: Some(heading.clone()), kind, paragraphs });
    }

    sections
}

/// The first body line after a heading: one past the heading line, plus one
/// more if the heading was underlined (skip the rule line too).
fn heading_body_start(heading: &Heading, lines: &[&str]) -> usize {
    let next = heading.source_line + 1;
    let is_underlined = lines
        .get(next)
        .map(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && (trimmed.chars().all(|c| c == '=') || trimmed.chars().all(|c| c == '-'))
        })
        .unwrap_or(false);
    if is_underlined { next + 1 } else { next }
}

/// Split `lines[start..end]` into paragraphs on blank-line boundaries,
/// dropping any paragraph under [`MIN_PARAGRAPH_LEN`] chars after trimming.
fn extract_paragraphs(lines: &[&str], start: usize, end: usize) -> Vec<String> {
    let end = end.min(lines.len());
    if start >= end {
        return Vec::new();
    }

    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in &lines[start..end] {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| p.len() >= MIN_PARAGRAPH_LEN)
        .collect()
}
