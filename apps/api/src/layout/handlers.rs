//! Axum route handlers for the Layout API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::layout::engine::{BlockOutcome, LayoutReport};
use crate::layout::{
    layout_blocks, layout_text_report, parse_optional, strip_markdown, Align, DrawOp, LayoutBlock,
    LayoutOptions, RecordingSurface, Token,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub text: String,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub font_size: Option<f32>,
    pub width: Option<f32>,
    #[serde(default)]
    pub align: Align,
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub end_y: f32,
    pub used_fallback: bool,
    pub lines: u32,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub text: String,
    pub x: Option<f32>,
    pub font_size: Option<f32>,
    pub width: Option<f32>,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub spacing_after: f32,
}

#[derive(Debug, Deserialize)]
pub struct BlocksRequest {
    pub start_y: Option<f32>,
    pub blocks: Vec<BlockRequest>,
}

#[derive(Debug, Serialize)]
pub struct BlocksResponse {
    pub end_y: f32,
    pub blocks: Vec<BlockOutcome>,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Deserialize)]
pub struct MarkdownRequest {
    /// Absent fields are treated as empty.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StripResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub tokens: Vec<Token>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/layout
///
/// Lays out one markdown field and returns the display list plus the end cursor.
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    let font_size = request.font_size.unwrap_or(state.config.default_font_size);
    validate_font_size(font_size)?;

    let options = LayoutOptions {
        font_size,
        width: request.width,
        align: request.align,
    };
    let x = request.x.unwrap_or(state.config.margin);
    let y = request.y.unwrap_or(state.config.margin);
    let (page_width, page_height) = (state.config.page_width, state.config.page_height);
    let text = request.text;

    // CPU-bound layout: spawn_blocking keeps the async executor free.
    let (report, ops): (LayoutReport, Vec<DrawOp>) = tokio::task::spawn_blocking(move || {
        let mut surface = RecordingSurface::new(page_width, page_height);
        let report = layout_text_report(&mut surface, &text, x, y, &options);
        (report, surface.into_ops())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))?;

    info!(
        end_y = report.end_y,
        used_fallback = report.used_fallback,
        lines = report.lines,
        ops = ops.len(),
        "Layout rendered"
    );

    Ok(Json(LayoutResponse {
        end_y: report.end_y,
        used_fallback: report.used_fallback,
        lines: report.lines,
        ops,
    }))
}

/// POST /api/v1/layout/blocks
///
/// Lays out several fields top to bottom, chaining each block's end cursor
/// into the next block's start.
pub async fn handle_layout_blocks(
    State(state): State<AppState>,
    Json(request): Json<BlocksRequest>,
) -> Result<Json<BlocksResponse>, AppError> {
    if request.blocks.is_empty() {
        return Err(AppError::Validation("blocks cannot be empty".to_string()));
    }

    let mut blocks = Vec::with_capacity(request.blocks.len());
    for (i, block) in request.blocks.into_iter().enumerate() {
        let font_size = block.font_size.unwrap_or(state.config.default_font_size);
        validate_font_size(font_size).map_err(|_| {
            AppError::Validation(format!("blocks[{i}].font_size must be a positive number"))
        })?;
        blocks.push(LayoutBlock {
            text: block.text,
            x: block.x.unwrap_or(state.config.margin),
            options: LayoutOptions {
                font_size,
                width: block.width,
                align: block.align,
            },
            spacing_after: block.spacing_after,
        });
    }

    let start_y = request.start_y.unwrap_or(state.config.margin);
    let (page_width, page_height) = (state.config.page_width, state.config.page_height);

    let (outcomes, ops) = tokio::task::spawn_blocking(move || {
        let mut surface = RecordingSurface::new(page_width, page_height);
        let outcomes = layout_blocks(&mut surface, &blocks, start_y);
        (outcomes, surface.into_ops())
    })
    .await
    .map_err(|e| {
        AppError::Internal(anyhow::anyhow!("spawn_blocking failed in block layout: {e}"))
    })?;

    let end_y = outcomes.last().map_or(start_y, |o| o.end_y);
    let fallbacks = outcomes.iter().filter(|o| o.used_fallback).count();
    info!(blocks = outcomes.len(), fallbacks, end_y, "Block layout rendered");

    Ok(Json(BlocksResponse {
        end_y,
        blocks: outcomes,
        ops,
    }))
}

/// POST /api/v1/markdown/strip
///
/// Plain text for generators that cannot render the markdown subset.
pub async fn handle_strip(Json(request): Json<MarkdownRequest>) -> Json<StripResponse> {
    Json(StripResponse {
        text: strip_markdown(request.text.as_deref().unwrap_or_default()),
    })
}

/// POST /api/v1/markdown/parse
///
/// The token stream the layout engine sees for a field.
pub async fn handle_parse(Json(request): Json<MarkdownRequest>) -> Json<ParseResponse> {
    Json(ParseResponse {
        tokens: parse_optional(request.text.as_deref()),
    })
}

fn validate_font_size(font_size: f32) -> Result<(), AppError> {
    if font_size.is_finite() && font_size > 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "font_size must be a positive number".to_string(),
        ))
    }
}
