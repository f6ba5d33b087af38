//! Plain-text fallback used when the markdown layout path fails.
//!
//! Draws the raw string once (markers and all) and advances the cursor by a
//! closed-form estimate instead of a real word wrap. Nothing here can fail:
//! every error is swallowed and the worst case is one line height.

use tracing::{debug, warn};

use crate::layout::engine::{Align, LINE_HEIGHT_FACTOR};
use crate::layout::font_metrics::{FontStyle, FontVariant};
use crate::layout::surface::Surface;

/// Average glyph width as a fraction of the font size, for line estimates.
pub const FALLBACK_CHAR_WIDTH_FACTOR: f32 = 0.6;

/// Estimated number of wrapped lines for `text` at `font_size` within `width`.
///
/// Always at least 1. May be infinite when `width` is narrower than one glyph.
pub fn estimate_line_count(text: &str, font_size: f32, width: f32) -> f32 {
    let chars = text.chars().count() as f32;
    let per_line = (width / (font_size * FALLBACK_CHAR_WIDTH_FACTOR)).floor();
    (chars / per_line).ceil().max(1.0)
}

/// Estimated height of `text` wrapped to `width`; 0 for empty text.
pub fn estimate_text_height(text: &str, font_size: f32, width: f32) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    estimate_line_count(text, font_size, width) * font_size * LINE_HEIGHT_FACTOR
}

/// Lines `render_plain` advances over: 0 for empty text, 1 without a width
/// or when the estimate is not finite.
pub fn plain_line_count(text: &str, font_size: f32, width: Option<f32>) -> u32 {
    if text.is_empty() {
        return 0;
    }
    match width {
        Some(w) => {
            let lines = estimate_line_count(text, font_size, w);
            if lines.is_finite() {
                lines as u32
            } else {
                1
            }
        }
        None => 1,
    }
}

/// Draws `text` unformatted at `(x, y)` and returns the estimated next cursor.
pub fn render_plain<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    x: f32,
    y: f32,
    font_size: f32,
    width: Option<f32>,
    align: Align,
) -> f32 {
    if text.is_empty() {
        return y;
    }

    let style = FontStyle::new(FontVariant::Regular, font_size);
    if let Err(err) = surface.draw_text(text, x, y, style) {
        warn!(error = %err, "plain-text fallback could not draw");
    }

    let advance = match width {
        Some(w) => estimate_text_height(text, font_size, w),
        None => font_size * LINE_HEIGHT_FACTOR,
    };
    debug!(?align, advance, "plain-text fallback rendered");

    let end_y = y + advance;
    if end_y.is_finite() {
        return end_y;
    }

    let one_line = y + font_size * LINE_HEIGHT_FACTOR;
    if one_line.is_finite() {
        one_line
    } else if y.is_finite() {
        y
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SurfaceError;
    use crate::layout::surface::RecordingSurface;

    struct ThrowingSurface;

    impl Surface for ThrowingSurface {
        fn measure_width(&self, _: &str, _: FontStyle) -> Result<f32, SurfaceError> {
            Err(SurfaceError::Measure("boom".to_string()))
        }

        fn draw_text(&mut self, _: &str, _: f32, _: f32, _: FontStyle) -> Result<(), SurfaceError> {
            Err(SurfaceError::Draw("boom".to_string()))
        }

        fn page_width(&self) -> f32 {
            0.0
        }

        fn page_height(&self) -> f32 {
            0.0
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_empty_text_returns_input_cursor() {
        let mut surface = RecordingSurface::letter();
        assert_eq!(render_plain(&mut surface, "", 0.0, 30.0, 10.0, None, Align::Left), 30.0);
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_no_width_advances_one_line() {
        let mut surface = RecordingSurface::letter();
        let end = render_plain(&mut surface, "**raw** text", 50.0, 100.0, 10.0, None, Align::Left);
        assert!(approx(end, 112.0));
        assert_eq!(surface.ops().len(), 1);
        assert_eq!(surface.ops()[0].text, "**raw** text", "markers are not stripped");
    }

    #[test]
    fn test_width_uses_closed_form_estimate() {
        let mut surface = RecordingSurface::letter();
        // 10 chars per line; 25 chars → 3 lines.
        let text = "abcdefghijklmnopqrstuvwxy";
        let end = render_plain(&mut surface, text, 0.0, 0.0, 10.0, Some(60.0), Align::Left);
        assert!(approx(end, 36.0), "got {end}");
    }

    #[test]
    fn test_throwing_surface_still_returns_finite() {
        let mut surface = ThrowingSurface;
        let end = render_plain(&mut surface, "text", 0.0, 5.0, 10.0, Some(100.0), Align::Center);
        assert!(end.is_finite());
        assert!(approx(end, 17.0));
    }

    #[test]
    fn test_sub_glyph_width_collapses_to_one_line() {
        let mut surface = RecordingSurface::letter();
        // floor(1 / 6) = 0 chars per line → infinite estimate → one line.
        let end = render_plain(&mut surface, "text", 0.0, 0.0, 10.0, Some(1.0), Align::Left);
        assert!(approx(end, 12.0));
    }

    #[test]
    fn test_non_finite_font_size_keeps_cursor() {
        let mut surface = ThrowingSurface;
        let end = render_plain(&mut surface, "text", 0.0, 40.0, f32::INFINITY, None, Align::Left);
        assert_eq!(end, 40.0);
    }

    #[test]
    fn test_estimate_text_height() {
        assert_eq!(estimate_text_height("", 10.0, 100.0), 0.0);
        // floor(500 / 6) = 83 per line; 100 chars → 2 lines
        let text = "x".repeat(100);
        assert!(approx(estimate_text_height(&text, 10.0, 500.0), 24.0));
    }

    #[test]
    fn test_line_count_at_least_one() {
        assert_eq!(estimate_line_count("a", 10.0, 1000.0), 1.0);
        assert_eq!(estimate_line_count("abc", 10.0, -20.0), 1.0);
    }

    #[test]
    fn test_plain_line_count_matches_advance() {
        assert_eq!(plain_line_count("", 10.0, Some(60.0)), 0);
        assert_eq!(plain_line_count("text", 10.0, None), 1);
        assert_eq!(plain_line_count("abcdefghijklmnopqrstuvwxy", 10.0, Some(60.0)), 3);
        assert_eq!(plain_line_count("text", 10.0, Some(1.0)), 1);
    }
}
