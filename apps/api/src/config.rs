use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base font size for layout requests that omit one.
    pub default_font_size: f32,
    /// Default x and y for requests that omit a position.
    pub margin: f32,
    pub page_width: f32,
    pub page_height: f32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            default_font_size: env_or("LAYOUT_DEFAULT_FONT_SIZE", 10.0)?,
            margin: env_or("LAYOUT_MARGIN", 50.0)?,
            page_width: env_or("LAYOUT_PAGE_WIDTH", 612.0)?,
            page_height: env_or("LAYOUT_PAGE_HEIGHT", 792.0)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            default_font_size: 10.0,
            margin: 50.0,
            page_width: 612.0,
            page_height: 792.0,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
