pub mod api;
pub mod config;
pub mod cycle;
pub mod feed;
pub mod formatter;
pub mod notifier;
pub mod reporter;
pub mod state;
pub mod tracker;
pub mod types;

/// MLB Stats API base URL (public, no auth required)
pub const MLB_API_BASE: &str = "https://statsapi.mlb.com";

/// X API v2 base URL
pub const X_API_BASE: &str = "https://api.x.com";
