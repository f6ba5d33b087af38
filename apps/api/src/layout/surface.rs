//! Drawing surface abstraction and a display-list implementation.
//!
//! A surface can only measure a string and draw it at an exact position.
//! Face and size travel with every call as a [`FontStyle`].
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::errors::SurfaceError;
use crate::layout::font_metrics::{metrics_for, FontStyle, FontVariant};

/// US Letter in PDF points.
pub const LETTER_WIDTH: f32 = 612.0;
pub const LETTER_HEIGHT: f32 = 792.0;

/// Target the layout engine draws into. One instance per document.
pub trait Surface {
    /// Width of `text` in points when set in `style`.
    fn measure_width(&self, text: &str, style: FontStyle) -> Result<f32, SurfaceError>;

    /// Draws `text` with its top-left corner at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: FontStyle)
        -> Result<(), SurfaceError>;

    fn page_width(&self) -> f32;

    fn page_height(&self) -> f32;
}

/// A single recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOp {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub variant: FontVariant,
    /// PostScript font name for `variant`.
    pub font: String,
    pub size: f32,
}

/// Surface that measures with the static Helvetica tables and records every
/// draw call. This is what the HTTP API renders into.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    page_width: f32,
    page_height: f32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(page_width: f32, page_height: f32) -> Self {
        Self {
            page_width,
            page_height,
            ops: Vec::new(),
        }
    }

    pub fn letter() -> Self {
        Self::new(LETTER_WIDTH, LETTER_HEIGHT)
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::letter()
    }
}

fn check_size(style: FontStyle) -> Result<(), SurfaceError> {
    if style.size.is_finite() && style.size > 0.0 {
        Ok(())
    } else {
        Err(SurfaceError::InvalidFontSize(style.size))
    }
}

impl Surface for RecordingSurface {
    fn measure_width(&self, text: &str, style: FontStyle) -> Result<f32, SurfaceError> {
        check_size(style)?;
        Ok(metrics_for(style.variant).measure_at(text, style.size))
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        style: FontStyle,
    ) -> Result<(), SurfaceError> {
        check_size(style)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(SurfaceError::Draw(format!(
                "non-finite position ({x}, {y}) for {text:?}"
            )));
        }
        self.ops.push(DrawOp {
            text: text.to_string(),
            x,
            y,
            variant: style.variant,
            font: style.variant.postscript_name().to_string(),
            size: style.size,
        });
        Ok(())
    }

    fn page_width(&self) -> f32 {
        self.page_width
    }

    fn page_height(&self) -> f32 {
        self.page_height
    }
}
