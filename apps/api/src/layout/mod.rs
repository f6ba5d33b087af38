// Markdown-subset layout onto a fixed canvas: inline/block parsing, greedy
// word wrap against a point width, and a plain-text fallback that keeps the
// vertical cursor moving when the markdown path fails.
// Layout is CPU-bound; handlers run it inside tokio::task::spawn_blocking.

pub mod block;
pub mod engine;
pub mod fallback;
pub mod font_metrics;
pub mod handlers;
pub mod inline;
pub mod surface;

// Re-export the public API consumed by the handlers and section emitters.
pub use block::{parse_optional, strip_markdown, Token};
pub use engine::{layout_blocks, layout_text_report, Align, LayoutBlock, LayoutOptions};
pub use surface::{DrawOp, RecordingSurface};
