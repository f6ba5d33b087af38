//! Block-level markdown parsing: header lines and hard line breaks.
//!
//! Every `\n` in the source is a hard break. A line matching
//! `^(#{1,4})\s+(.+)$` is a header; its level is stamped on every inline run
//! produced from the trimmed remainder.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::layout::inline::{tokenize, StyledRun, MAX_HEADER_LEVEL};

/// One element of a parsed block: a styled run or an explicit line break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Token {
    Run(StyledRun),
    LineBreak,
}

impl Token {
    pub fn as_run(&self) -> Option<&StyledRun> {
        match self {
            Token::Run(run) => Some(run),
            Token::LineBreak => None,
        }
    }
}

/// Parses multi-line markdown into runs with line-break sentinels between lines.
///
/// Never returns an empty vector: degenerate input yields one empty run.
pub fn parse_block(text: &str) -> Vec<Token> {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    let mut tokens = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let runs: Vec<StyledRun> = match split_header(line) {
            Some((level, remainder)) => tokenize(remainder)
                .into_iter()
                .map(|run| run.with_header_level(level))
                .collect(),
            None => tokenize(line),
        };
        tokens.extend(runs.into_iter().map(Token::Run));

        if idx < last {
            tokens.push(Token::LineBreak);
        }
    }

    if tokens.is_empty() {
        tokens.push(Token::Run(StyledRun::plain("")));
    }
    tokens
}

/// `parse_block` for fields that may be absent.
pub fn parse_optional(text: Option<&str>) -> Vec<Token> {
    parse_block(text.unwrap_or_default())
}

/// Markdown with the subset's markers removed; line breaks become `\n`.
pub fn strip_markdown(text: &str) -> String {
    tokens_to_plain(&parse_block(text))
}

/// Concatenates run texts, writing `\n` for each line break.
pub fn tokens_to_plain(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Run(run) => out.push_str(&run.text),
            Token::LineBreak => out.push('\n'),
        }
    }
    out
}

/// Matches `^(#{1,4})\s+(.+)$`, returning the level and the trimmed remainder.
fn split_header(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > MAX_HEADER_LEVEL as usize {
        return None;
    }

    let rest = &line[hashes..];
    let mut chars = rest.chars();
    // `\s+` needs one whitespace char and `.+` at least one more char of any kind.
    match (chars.next(), chars.next()) {
        (Some(c), Some(_)) if c.is_whitespace() => Some((hashes as u8, rest.trim())),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
