use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Layout itself is stateless; each request renders into its own surface.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}
