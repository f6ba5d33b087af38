//! Inline markdown tokenizer: `***bold italic***`, `**bold**`, `*italic*`.
//!
//! Scans a single line (no `\n`) left to right. At every position the markers
//! are tried in order triple → double → single. A marker with no matching
//! closer is emitted as literal text and scanning resumes right after it, so
//! an unterminated `**` never swallows the rest of the line.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{FontStyle, FontVariant};

/// Highest header level the block parser recognises (`####`).
pub const MAX_HEADER_LEVEL: u8 = 4;

/// Size multipliers applied to the base font size for header levels 1–4.
pub const HEADER_SIZES: [(u8, f32); 4] = [(1, 2.0), (2, 1.6), (3, 1.3), (4, 1.1)];

/// Multiplier for a header level; body text (level 0) is 1.0.
pub fn header_multiplier(level: u8) -> f32 {
    HEADER_SIZES
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, m)| *m)
        .unwrap_or(1.0)
}

/// A maximal span of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// 0 = body text, 1 = most prominent header.
    pub header_level: u8,
}

impl StyledRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn styled(text: impl Into<String>, bold: bool, italic: bool) -> Self {
        Self {
            text: text.into(),
            bold,
            italic,
            header_level: 0,
        }
    }

    pub fn with_header_level(mut self, level: u8) -> Self {
        self.header_level = level.min(MAX_HEADER_LEVEL);
        self
    }

    pub fn is_header(&self) -> bool {
        self.header_level > 0
    }

    pub fn variant(&self) -> FontVariant {
        FontVariant::from_flags(self.bold, self.italic)
    }

    /// Face and effective size for this run at the caller's base size.
    pub fn font_style(&self, base_size: f32) -> FontStyle {
        FontStyle::new(self.variant(), base_size * header_multiplier(self.header_level))
    }

    fn is_plain(&self) -> bool {
        !self.bold && !self.italic
    }
}

/// Splits one line into styled runs.
pub fn tokenize(line: &str) -> Vec<StyledRun> {
    let bytes = line.as_bytes();
    let len = bytes.len();
    let mut runs: Vec<StyledRun> = Vec::new();
    let mut i = 0;

    while i < len {
        if bytes[i] == b'*' {
            if let Some((content, next, bold, italic)) = match_span(line, i) {
                if !content.is_empty() {
                    runs.push(StyledRun::styled(content, bold, italic));
                }
                i = next;
                continue;
            }
            // Unterminated marker: the whole asterisk run is literal text.
            let end = bytes[i..]
                .iter()
                .position(|&b| b != b'*')
                .map_or(len, |p| i + p);
            push_plain(&mut runs, &line[i..end]);
            i = end;
            continue;
        }

        let end = line[i..].find('*').map_or(len, |p| i + p);
        push_plain(&mut runs, &line[i..end]);
        i = end;
    }

    runs
}

/// Tries `***`, `**`, then `*` at byte offset `i`.
/// Returns `(content, index after closer, bold, italic)`.
fn match_span(line: &str, i: usize) -> Option<(&str, usize, bool, bool)> {
    let bytes = line.as_bytes();
    let rest = &line[i..];

    if rest.starts_with("***") {
        if let Some(close) = line[i + 3..].find("***").map(|p| i + 3 + p) {
            return Some((&line[i + 3..close], close + 3, true, true));
        }
    }

    if rest.starts_with("**") {
        if let Some(close) = line[i + 2..].find("**").map(|p| i + 2 + p) {
            return Some((&line[i + 2..close], close + 2, true, false));
        }
    }

    let touches_star = |idx: usize| {
        (idx > 0 && bytes[idx - 1] == b'*') || bytes.get(idx + 1) == Some(&b'*')
    };
    if !touches_star(i) {
        // Only the first following `*` may close; if it belongs to a `**`
        // the opener stays literal.
        if let Some(close) = line[i + 1..].find('*').map(|p| i + 1 + p) {
            if !touches_star(close) {
                return Some((&line[i + 1..close], close + 1, false, true));
            }
        }
    }

    None
}

/// Appends plain text, merging into a preceding plain run.
fn push_plain(runs: &mut Vec<StyledRun>, text: &str) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.is_plain() => last.text.push_str(text),
        _ => runs.push(StyledRun::plain(text)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(runs: &[StyledRun]) -> String {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    // ── plain text ──────────────────────────────────────────────────────────

    #[test]
    fn test_plain_text_is_single_run() {
        let runs = tokenize("Led a team of five engineers.");
        assert_eq!(runs, vec![StyledRun::plain("Led a team of five engineers.")]);
    }

    #[test]
    fn test_empty_line_yields_no_runs() {
        assert!(tokenize("").is_empty());
    }

    // ── spans ───────────────────────────────────────────────────────────────

    #[test]
    fn test_bold_italic_span() {
        let runs = tokenize("***Rust***");
        assert_eq!(runs, vec![StyledRun::styled("Rust", true, true)]);
    }

    #[test]
    fn test_bold_span() {
        let runs = tokenize("Uses **Rust** daily");
        assert_eq!(
            runs,
            vec![
                StyledRun::plain("Uses "),
                StyledRun::styled("Rust", true, false),
                StyledRun::plain(" daily"),
            ]
        );
    }

    #[test]
    fn test_italic_span() {
        let runs = tokenize("an *excellent* result");
        assert_eq!(runs[1], StyledRun::styled("excellent", false, true));
        assert_eq!(joined(&runs), "an excellent result");
    }

    #[test]
    fn test_senior_engineer_scenario() {
        let runs = tokenize("**Senior** *Engineer*");
        assert_eq!(
            runs,
            vec![
                StyledRun::styled("Senior", true, false),
                StyledRun::plain(" "),
                StyledRun::styled("Engineer", false, true),
            ]
        );
        assert_eq!(joined(&runs), "Senior Engineer");
    }

    #[test]
    fn test_spans_found_mid_line() {
        let runs = tokenize("a ***b*** c **d** e *f* g");
        let styled: Vec<(&str, bool, bool)> = runs
            .iter()
            .filter(|r| r.bold || r.italic)
            .map(|r| (r.text.as_str(), r.bold, r.italic))
            .collect();
        assert_eq!(
            styled,
            vec![("b", true, true), ("d", true, false), ("f", false, true)]
        );
        assert_eq!(joined(&runs), "a b c d e f g");
    }

    #[test]
    fn test_bold_edges_not_read_as_italic() {
        let runs = tokenize("**x** and **y**");
        assert!(runs.iter().all(|r| !r.italic), "no run should be italic: {runs:?}");
        assert_eq!(joined(&runs), "x and y");
    }

    #[test]
    fn test_empty_span_is_dropped() {
        let runs = tokenize("a****b");
        assert_eq!(joined(&runs), "ab");
        assert!(runs.iter().all(|r| !r.text.is_empty()));
    }

    // ── unterminated markers ────────────────────────────────────────────────

    #[test]
    fn test_unterminated_bold_is_literal() {
        let runs = tokenize("**unclosed bold");
        assert_eq!(runs, vec![StyledRun::plain("**unclosed bold")]);
    }

    #[test]
    fn test_unterminated_marker_does_not_swallow_later_spans() {
        let runs = tokenize("**open and *closed*");
        assert_eq!(
            runs,
            vec![
                StyledRun::plain("**open and "),
                StyledRun::styled("closed", false, true),
            ]
        );
    }

    #[test]
    fn test_lone_asterisk_is_literal() {
        let runs = tokenize("5 * 3");
        assert_eq!(joined(&runs), "5 * 3");
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn test_italic_closer_inside_bold_rejected() {
        // The first `*` after the opener belongs to `**b**`, so the opener is literal.
        let runs = tokenize("*a **b**");
        assert_eq!(
            runs,
            vec![StyledRun::plain("*a "), StyledRun::styled("b", true, false)]
        );
    }

    #[test]
    fn test_non_ascii_text_preserved() {
        let runs = tokenize("Ingénieur **Sénior** – Zürich");
        assert_eq!(joined(&runs), "Ingénieur Sénior – Zürich");
        assert_eq!(runs[1], StyledRun::styled("Sénior", true, false));
    }

    // ── header sizing ───────────────────────────────────────────────────────

    #[test]
    fn test_header_multipliers() {
        assert_eq!(header_multiplier(0), 1.0);
        assert_eq!(header_multiplier(1), 2.0);
        assert_eq!(header_multiplier(2), 1.6);
        assert_eq!(header_multiplier(3), 1.3);
        assert_eq!(header_multiplier(4), 1.1);
    }

    #[test]
    fn test_font_style_applies_header_size() {
        let run = StyledRun::styled("Title", true, false).with_header_level(1);
        let style = run.font_style(11.0);
        assert_eq!(style.variant, FontVariant::Bold);
        assert!((style.size - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_header_level_clamped() {
        let run = StyledRun::plain("x").with_header_level(9);
        assert_eq!(run.header_level, MAX_HEADER_LEVEL);
    }
}
