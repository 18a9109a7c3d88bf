use once_cell_compat::numbered_heading_re;

/// A detected heading line.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub text: String,
    pub level: u8,
    /// Zero-based index into the document's lines.
    pub source_line: usize,
}

/// Detect all headings in `text` using the three documented patterns
/// (all-caps, numbered, underlined), in source order. A line matching more
/// than one pattern is reported once, preferring underlined > numbered >
/// all-caps (underlined headings are the most visually unambiguous).
pub fn detect_headings(text: &str) -> Vec<Heading> {
    let lines: Vec<&str> = text.lines().collect();
    let mut headings = Vec::new();
    let mut claimed = vec![false; lines.len()];

    // Underlined headings first: a heading line followed by a rule line.
    for idx in 0..lines.len() {
        if idx + 1 >= lines.len() {
            continue;
        }
        let candidate = lines[idx].trim();
        if candidate.is_empty() {
            continue;
        }
        let rule = lines[idx + 1].trim();
        if is_rule_line(rule, '=') && rule.len() >= 3 {
            headings.push(Heading { text: candidate.to_string(), level: 1, source_line: idx });
            claimed[idx] = true;
            claimed[idx + 1] = true;
        } else if is_rule_line(rule, '-') && rule.len() >= 3 {
            headings.push(Heading { text: candidate.to_string(), level: 2, source_line: idx });
            claimed[idx] = true;
            claimed[idx + 1] = true;
        }
    }

    let numbered_re = numbered_heading_re();
    for (idx, line) in lines.iter().enumerate() {
        if claimed[idx] {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(caps) = numbered_re.captures(trimmed) {
            let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let level = prefix.matches('.').count().max(1) as u8;
            headings.push(Heading { text: trimmed.to_string(), level, source_line: idx });
            claimed[idx] = true;
            continue;
        }

        if is_all_caps_heading(trimmed) {
            headings.push(Heading { text: trimmed.to_string(), level: 1, source_line: idx });
            claimed[idx] = true;
        }
    }

    headings.sort_by_key(|h| h.source_line);
    headings
}

fn is_rule_line(line: &str, ch: char) -> bool {
    !line.is_empty() && line.chars().all(|c| c == ch)
}

fn is_all_caps_heading(line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return false;
    }
    let alpha_chars: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if alpha_chars.is_empty() {
        return false;
    }
    alpha_chars.iter().all(|c| c.is_uppercase())
}

/// Tiny module boundary so the compiled regex is built once (via
/// `once_cell`) without polluting this file's top-level imports.
mod once_cell_compat {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static NUMBERED_HEADING: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^((?:\d+\.)+)\s+.+").expect("valid numbered-heading regex"));

    pub fn numbered_heading_re() -> &'static Regex {
        &NUMBERED_HEADING
    }
}
