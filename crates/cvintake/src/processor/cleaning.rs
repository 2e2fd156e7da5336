//! Whitespace normalization for extracted resume text.
//!
//! The cleaned text is fed verbatim into a completion-service prompt, so the
//! goal is to strip layout noise while keeping paragraph boundaries (a single
//! blank line) intact. `clean_text` is pure and idempotent.

/// Cleans extracted text: normalizes line endings, strips control characters
/// (except newlines and tabs), collapses space/tab runs, trims every line,
/// and caps consecutive blank lines at one.
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let stripped: String = normalized
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    let mut lines = Vec::new();
    let mut blank_run = 0usize;

    for raw_line in stripped.split('\n') {
        let line = collapse_spacing(raw_line);
        if line.is_empty() {
            blank_run += 1;
            // At most one blank line between paragraphs.
            if blank_run == 1 && !lines.is_empty() {
                lines.push(line);
            }
        } else {
            blank_run = 0;
            lines.push(line);
        }
    }

    // A trailing blank line may remain when the input ended with newlines.
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Collapses runs of spaces/tabs to a single space and trims the line.
fn collapse_spacing(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_gap = false;

    for c in line.chars() {
        if c == ' ' || c == '\t' {
            if !in_gap {
                out.push(' ');
                in_gap = true;
            }
        } else {
            out.push(c);
            in_gap = false;
        }
    }

    out.trim().to_string()
}
