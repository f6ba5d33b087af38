pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::layout::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Layout API
        .route("/api/v1/layout", post(handlers::handle_layout))
        .route("/api/v1/layout/blocks", post(handlers::handle_layout_blocks))
        // Markdown helpers
        .route("/api/v1/markdown/strip", post(handlers::handle_strip))
        .route("/api/v1/markdown/parse", post(handlers::handle_parse))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;

    fn app() -> Router {
        build_router(AppState {
            config: Config::default(),
        })
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    // ── health ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_health_ok() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // ── layout ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_layout_header_scenario() {
        let (status, body) = post_json(
            "/api/v1/layout",
            json!({ "text": "# Lead\nBuilt systems.", "x": 0, "y": 0, "font_size": 10, "width": 200 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["used_fallback"], false);
        let end_y = body["end_y"].as_f64().unwrap();
        assert!((end_y - 36.0).abs() < 1e-3, "got {end_y}");
        assert_eq!(body["lines"], 2);
        let ops = body["ops"].as_array().unwrap();
        assert_eq!(ops[0]["text"], "Lead");
        assert_eq!(ops[0]["size"], 20.0);
        assert_eq!(ops[0]["font"], "Helvetica");
    }

    #[tokio::test]
    async fn test_layout_uses_config_defaults() {
        let (status, body) = post_json("/api/v1/layout", json!({ "text": "**Senior** *Engineer*" })).await;
        assert_eq!(status, StatusCode::OK);
        let end_y = body["end_y"].as_f64().unwrap();
        // margin 50 + 10 * 1.2
        assert!((end_y - 62.0).abs() < 1e-3, "got {end_y}");
        let ops = body["ops"].as_array().unwrap();
        assert_eq!(ops[0]["variant"], "bold");
        assert_eq!(ops[2]["variant"], "italic");
    }

    #[tokio::test]
    async fn test_layout_rejects_non_positive_font_size() {
        let (status, body) = post_json("/api/v1/layout", json!({ "text": "x", "font_size": 0 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_layout_blank_text_is_noop() {
        let (status, body) = post_json("/api/v1/layout", json!({ "text": "   ", "y": 120 })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["end_y"], 120.0);
        assert!(body["ops"].as_array().unwrap().is_empty());
    }

    // ── blocks ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_blocks_chain_cursor() {
        let (status, body) = post_json(
            "/api/v1/layout/blocks",
            json!({
                "start_y": 100,
                "blocks": [
                    { "text": "## Experience", "width": 500, "spacing_after": 4 },
                    { "text": "Led the *platform* team", "width": 500 }
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let blocks = body["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        let first_end = blocks[0]["end_y"].as_f64().unwrap();
        let second_start = blocks[1]["start_y"].as_f64().unwrap();
        assert!((first_end - (100.0 + 19.2)).abs() < 1e-3);
        assert!((second_start - (first_end + 4.0)).abs() < 1e-3);
        assert_eq!(body["end_y"], blocks[1]["end_y"]);
    }

    #[tokio::test]
    async fn test_blocks_empty_rejected() {
        let (status, _) = post_json("/api/v1/layout/blocks", json!({ "blocks": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blocks_bad_font_size_names_index() {
        let (status, body) = post_json(
            "/api/v1/layout/blocks",
            json!({ "blocks": [ { "text": "a" }, { "text": "b", "font_size": -3 } ] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("blocks[1]"));
    }

    // ── markdown helpers ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_strip_markdown_route() {
        let (status, body) =
            post_json("/api/v1/markdown/strip", json!({ "text": "# Title\n**bold** text" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Title\nbold text");
    }

    #[tokio::test]
    async fn test_parse_markdown_route() {
        let (status, body) = post_json("/api/v1/markdown/parse", json!({ "text": "a\nb" })).await;
        assert_eq!(status, StatusCode::OK);
        let tokens = body["tokens"].as_array().unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1]["kind"], "line_break");
    }

    #[tokio::test]
    async fn test_parse_markdown_route_absent_text() {
        let (status, body) = post_json("/api/v1/markdown/parse", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let tokens = body["tokens"].as_array().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0]["kind"], "run");
        assert_eq!(tokens[0]["text"], "");
    }

    #[tokio::test]
    async fn test_layout_multi_line_without_width_stays_on_one_line() {
        let (status, body) = post_json(
            "/api/v1/layout",
            json!({ "text": "Line one\nLine two", "x": 0, "y": 0, "font_size": 10 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let end_y = body["end_y"].as_f64().unwrap();
        assert!((end_y - 12.0).abs() < 1e-3, "got {end_y}");
        assert_eq!(body["lines"], 1);
    }
}
