//! Markdown-to-canvas layout engine.
//!
//! # Architecture
//! - `layout_text` is the public entry point. It never fails: any
//!   `LayoutError` from the core (or a cursor that is non-finite or does not
//!   advance) routes to [`render_plain`].
//! - `render` is the fallible core. It picks one of two modes:
//!   * unwrapped: no width, no headers. Runs are drawn side by side on one
//!     line and line-break sentinels are ignored.
//!   * wrapped: greedy word wrap against `width` (unbounded when absent).
//!     A word is everything between whitespace, even when it changes style
//!     mid-way, and it moves to the next line as a unit. Every line break is
//!     a hard break; header lines use their own height.
//! - `render_line` draws one flushed line. A failed word is retried in the
//!   regular face and otherwise skipped, so one bad segment never aborts the
//!   document.
//!
//! The engine holds no state between calls; `x` is always an input and the
//! returned `y` is the next block's starting cursor.
#![allow(dead_code)]

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::LayoutError;
use crate::layout::block::{parse_block, tokens_to_plain, Token};
use crate::layout::fallback::{plain_line_count, render_plain};
use crate::layout::font_metrics::FontStyle;
use crate::layout::inline::StyledRun;
use crate::layout::surface::Surface;

/// Line height as a multiple of the effective font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Base size used when a caller passes a zero, negative, or non-finite size.
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

// ────────────────────────────────────────────────────────────────────────────
// Options / input
// ────────────────────────────────────────────────────────────────────────────

/// Horizontal alignment. `Justify` is accepted but lays out exactly like `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Justify,
}

/// Per-call layout configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub font_size: f32,
    /// Wrap width in points. `None` renders on a single line.
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub align: Align,
}

impl LayoutOptions {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            width: None,
            align: Align::Left,
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// The base size actually used for layout.
    pub fn base_size(&self) -> f32 {
        if self.font_size.is_finite() && self.font_size > 0.0 {
            self.font_size
        } else {
            DEFAULT_FONT_SIZE
        }
    }

    /// Wrap width after normalisation. Zero and NaN mean "no width";
    /// negative or infinite widths are rejected.
    fn wrap_width(&self) -> Result<Option<f32>, LayoutError> {
        match self.width {
            None => Ok(None),
            Some(w) if w.is_nan() || w == 0.0 => Ok(None),
            Some(w) if w.is_finite() && w > 0.0 => Ok(Some(w)),
            Some(w) => Err(LayoutError::InvalidOptions(format!(
                "width must be positive and finite, got {w}"
            ))),
        }
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_SIZE)
    }
}

/// Raw markdown or an already-parsed token stream.
#[derive(Debug, Clone, Copy)]
pub enum LayoutInput<'a> {
    Markdown(&'a str),
    Tokens(&'a [Token]),
}

impl<'a> LayoutInput<'a> {
    /// True when there is nothing visible to lay out.
    pub fn is_blank(&self) -> bool {
        match self {
            LayoutInput::Markdown(text) => text.trim().is_empty(),
            LayoutInput::Tokens(tokens) => tokens
                .iter()
                .filter_map(Token::as_run)
                .all(|run| run.text.trim().is_empty()),
        }
    }

    fn tokens(&self) -> Cow<'a, [Token]> {
        match *self {
            LayoutInput::Markdown(text) => Cow::Owned(parse_block(text)),
            LayoutInput::Tokens(tokens) => Cow::Borrowed(tokens),
        }
    }

    /// Text handed to the fallback: the raw markdown, markers and all.
    fn raw_text(&self) -> Cow<'a, str> {
        match *self {
            LayoutInput::Markdown(text) => Cow::Borrowed(text),
            LayoutInput::Tokens(tokens) => Cow::Owned(tokens_to_plain(tokens)),
        }
    }
}

impl<'a> From<&'a str> for LayoutInput<'a> {
    fn from(text: &'a str) -> Self {
        LayoutInput::Markdown(text)
    }
}

impl<'a> From<&'a String> for LayoutInput<'a> {
    fn from(text: &'a String) -> Self {
        LayoutInput::Markdown(text.as_str())
    }
}

impl<'a> From<&'a [Token]> for LayoutInput<'a> {
    fn from(tokens: &'a [Token]) -> Self {
        LayoutInput::Tokens(tokens)
    }
}

impl<'a> From<&'a Vec<Token>> for LayoutInput<'a> {
    fn from(tokens: &'a Vec<Token>) -> Self {
        LayoutInput::Tokens(tokens.as_slice())
    }
}

/// Where a layout call ended and which path produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub end_y: f32,
    pub used_fallback: bool,
    /// Lines the cursor advanced over. Estimated when the fallback ran.
    pub lines: u32,
}

/// Cursor and flushed-line count from one pass of the layout core.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rendered {
    end_y: f32,
    lines: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry points
// ────────────────────────────────────────────────────────────────────────────

/// Lays out markdown at `(x, y)` and returns the cursor for the next block.
///
/// Never fails. For non-blank input the result is finite and greater than `y`;
/// blank input returns `y` unchanged.
pub fn layout_text<'a, S: Surface + ?Sized>(
    surface: &mut S,
    input: impl Into<LayoutInput<'a>>,
    x: f32,
    y: f32,
    options: &LayoutOptions,
) -> f32 {
    layout_text_report(surface, input, x, y, options).end_y
}

/// `layout_text`, also reporting whether the plain-text fallback ran.
pub fn layout_text_report<'a, S: Surface + ?Sized>(
    surface: &mut S,
    input: impl Into<LayoutInput<'a>>,
    x: f32,
    y: f32,
    options: &LayoutOptions,
) -> LayoutReport {
    let input = input.into();
    let y = if y.is_finite() {
        y
    } else {
        warn!(y, "non-finite start cursor; restarting at 0");
        0.0
    };

    if input.is_blank() {
        return LayoutReport {
            end_y: y,
            used_fallback: false,
            lines: 0,
        };
    }

    let err = match render_counted(surface, input, x, y, options) {
        Ok(rendered) if rendered.end_y > y => {
            return LayoutReport {
                end_y: rendered.end_y,
                used_fallback: false,
                lines: rendered.lines,
            }
        }
        Ok(rendered) => LayoutError::BadCursor(rendered.end_y),
        Err(err) => err,
    };

    warn!(error = %err, "markdown layout failed; rendering plain text");
    let raw = input.raw_text();
    let end_y = render_plain(
        surface,
        &raw,
        x,
        y,
        options.base_size(),
        options.width,
        options.align,
    );
    LayoutReport {
        end_y,
        used_fallback: true,
        lines: plain_line_count(&raw, options.base_size(), options.width),
    }
}

/// Fallible layout core. Returns the new cursor or the reason it gave up.
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    input: LayoutInput<'_>,
    x: f32,
    y: f32,
    options: &LayoutOptions,
) -> Result<f32, LayoutError> {
    render_counted(surface, input, x, y, options).map(|rendered| rendered.end_y)
}

fn render_counted<S: Surface + ?Sized>(
    surface: &mut S,
    input: LayoutInput<'_>,
    x: f32,
    y: f32,
    options: &LayoutOptions,
) -> Result<Rendered, LayoutError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(LayoutError::InvalidOptions(format!(
            "start position ({x}, {y}) is not finite"
        )));
    }
    let base = options.base_size();
    let width = options.wrap_width()?;
    let tokens = input.tokens();

    let has_headers = tokens
        .iter()
        .filter_map(Token::as_run)
        .any(StyledRun::is_header);

    let rendered = if width.is_none() && !has_headers {
        let runs: Vec<&StyledRun> = tokens.iter().filter_map(Token::as_run).collect();
        Rendered {
            end_y: render_unwrapped(surface, &runs, x, y, base, options.align)?,
            lines: 1,
        }
    } else {
        render_wrapped(surface, &tokens, x, y, base, width, options.align)?
    };

    if rendered.end_y.is_finite() {
        Ok(rendered)
    } else {
        Err(LayoutError::BadCursor(rendered.end_y))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Unwrapped mode
// ────────────────────────────────────────────────────────────────────────────

fn render_unwrapped<S: Surface + ?Sized>(
    surface: &mut S,
    runs: &[&StyledRun],
    x: f32,
    y: f32,
    base: f32,
    align: Align,
) -> Result<f32, LayoutError> {
    let mut measured = Vec::with_capacity(runs.len());
    let mut total_width = 0.0_f32;
    for run in runs {
        let style = run.font_style(base);
        let width = surface.measure_width(&run.text, style)?;
        total_width += width;
        measured.push((run.text.as_str(), style, width));
    }

    let mut pen_x = match align {
        Align::Center => x - total_width / 2.0,
        Align::Left | Align::Justify => x,
    };
    for (text, style, width) in measured {
        if !text.is_empty() {
            draw_contained(surface, text, pen_x, y, style);
        }
        pen_x += width;
    }

    Ok(y + base * LINE_HEIGHT_FACTOR)
}

// ────────────────────────────────────────────────────────────────────────────
// Wrapped mode
// ────────────────────────────────────────────────────────────────────────────

/// A word buffered on the current line, already measured.
#[derive(Debug, Clone, PartialEq)]
pub struct LineWord {
    pub text: String,
    pub style: FontStyle,
    pub width: f32,
    /// Space drawn before the word; 0.0 for the first word or a glued fragment.
    pub space_before: f32,
}

#[derive(Debug, Default)]
struct LineBuffer {
    words: Vec<LineWord>,
    width: f32,
}

impl LineBuffer {
    fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The tallest effective size on the line sets its height.
    fn height(&self, base_line_height: f32) -> f32 {
        self.words
            .iter()
            .map(|w| w.style.size * LINE_HEIGHT_FACTOR)
            .fold(base_line_height, f32::max)
    }

    fn push(&mut self, word: LineWord) {
        self.width += word.space_before + word.width;
        self.words.push(word);
    }

    fn take(&mut self) -> LineBuffer {
        std::mem::take(self)
    }
}

struct WrapState<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    x: f32,
    cursor: f32,
    width: Option<f32>,
    align: Align,
    base_line_height: f32,
    line: LineBuffer,
    lines: u32,
}

impl<S: Surface + ?Sized> WrapState<'_, S> {
    /// Draws the buffered line (if any) and advances by its height.
    fn flush(&mut self) {
        let line = self.line.take();
        let height = line.height(self.base_line_height);
        if !line.is_empty() {
            let line_x = match (self.align, self.width) {
                (Align::Center, Some(w)) => self.x + (w - line.width) / 2.0,
                _ => self.x,
            };
            debug!(words = line.words.len(), y = self.cursor, "flushing line");
            render_line(&mut *self.surface, &line.words, line_x, self.cursor);
        }
        self.cursor += height;
        self.lines += 1;
    }
}

/// A whitespace-delimited word as one or more styled pieces.
type WordPieces<'t> = Vec<(&'t str, FontStyle)>;

enum WrapItem<'t> {
    Word(WordPieces<'t>),
    Break,
}

/// Splits runs into words. Pieces with no whitespace between them stay in
/// one word across run boundaries (`**Rust**,` or `bb**bold**bb`).
fn split_words(tokens: &[Token], base: f32) -> Vec<WrapItem<'_>> {
    let mut items = Vec::new();
    let mut word: WordPieces<'_> = Vec::new();

    for token in tokens {
        let run = match token {
            Token::LineBreak => {
                if !word.is_empty() {
                    items.push(WrapItem::Word(std::mem::take(&mut word)));
                }
                items.push(WrapItem::Break);
                continue;
            }
            Token::Run(run) => run,
        };

        let style = run.font_style(base);
        let mut rest = run.text.as_str();
        loop {
            let trimmed = rest.trim_start();
            if trimmed.len() != rest.len() && !word.is_empty() {
                items.push(WrapItem::Word(std::mem::take(&mut word)));
            }
            if trimmed.is_empty() {
                break;
            }
            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            word.push((&trimmed[..end], style));
            rest = &trimmed[end..];
        }
    }

    if !word.is_empty() {
        items.push(WrapItem::Word(word));
    }
    items
}

fn render_wrapped<S: Surface + ?Sized>(
    surface: &mut S,
    tokens: &[Token],
    x: f32,
    y: f32,
    base: f32,
    width: Option<f32>,
    align: Align,
) -> Result<Rendered, LayoutError> {
    let limit = width.unwrap_or(f32::INFINITY);
    let mut state = WrapState {
        surface,
        x,
        cursor: y,
        width,
        align,
        base_line_height: base * LINE_HEIGHT_FACTOR,
        line: LineBuffer::default(),
        lines: 0,
    };

    for item in split_words(tokens, base) {
        let pieces = match item {
            WrapItem::Break => {
                state.flush();
                continue;
            }
            WrapItem::Word(pieces) => pieces,
        };

        let mut words = Vec::with_capacity(pieces.len());
        let mut word_width = 0.0_f32;
        for (text, style) in pieces {
            let piece_width = state.surface.measure_width(text, style)?;
            word_width += piece_width;
            words.push(LineWord {
                text: text.to_string(),
                style,
                width: piece_width,
                space_before: 0.0,
            });
        }
        let lead_style = match words.first() {
            Some(first) => first.style,
            None => continue,
        };

        // The space takes the style of the word it precedes.
        let space = if state.line.is_empty() {
            0.0
        } else {
            state.surface.measure_width(" ", lead_style)?
        };
        if !state.line.is_empty() && state.line.width + space + word_width > limit {
            state.flush();
        }
        if !state.line.is_empty() {
            words[0].space_before = space;
        }
        for word in words {
            state.line.push(word);
        }
    }

    if !state.line.is_empty() {
        state.flush();
    }
    Ok(Rendered {
        end_y: state.cursor,
        lines: state.lines,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Line-segment renderer
// ────────────────────────────────────────────────────────────────────────────

/// Draws one line of measured words left to right starting at `(x, y)`.
pub fn render_line<S: Surface + ?Sized>(surface: &mut S, words: &[LineWord], x: f32, y: f32) {
    let mut pen_x = x;
    for word in words {
        pen_x += word.space_before;
        if !word.text.is_empty() {
            draw_contained(surface, &word.text, pen_x, y, word.style);
        }
        pen_x += word.width;
    }
}

/// Draws one segment; on failure retries in the regular face, then skips it.
fn draw_contained<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    x: f32,
    y: f32,
    style: FontStyle,
) -> bool {
    let err = match surface.draw_text(text, x, y, style) {
        Ok(()) => return true,
        Err(err) => err,
    };
    warn!(error = %err, segment = text, "segment draw failed; retrying in regular face");
    match surface.draw_text(text, x, y, style.regular()) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, segment = text, "segment skipped");
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section chaining
// ────────────────────────────────────────────────────────────────────────────

/// One free-text field placed below the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBlock {
    pub text: String,
    pub x: f32,
    pub options: LayoutOptions,
    /// Extra gap added after this block's end cursor.
    #[serde(default)]
    pub spacing_after: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockOutcome {
    pub start_y: f32,
    pub end_y: f32,
    pub used_fallback: bool,
    pub lines: u32,
}

/// Lays out blocks top to bottom, each starting where the previous one ended.
pub fn layout_blocks<S: Surface + ?Sized>(
    surface: &mut S,
    blocks: &[LayoutBlock],
    start_y: f32,
) -> Vec<BlockOutcome> {
    let mut cursor = start_y;
    blocks
        .iter()
        .map(|block| {
            let report = layout_text_report(surface, &block.text, block.x, cursor, &block.options);
            let outcome = BlockOutcome {
                start_y: cursor,
                end_y: report.end_y,
                used_fallback: report.used_fallback,
                lines: report.lines,
            };
            let gap = if block.spacing_after.is_finite() {
                block.spacing_after.max(0.0)
            } else {
                0.0
            };
            cursor = report.end_y + gap;
            outcome
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
