//! SmartLink Pages - static, crawler-friendly pages for SmartLinks.
//!
//! A SmartLink is a shareable landing page for one music release. Social
//! crawlers do not run JavaScript, so each published SmartLink is rendered
//! once to a static HTML file carrying Open Graph / Twitter Card metadata and
//! a short redirect into the single-page app for human visitors.
//!
//! # Architecture
//!
//! - **Render**: Builds the page with maud (compile-time templates)
//! - **Store**: One `{shortId}.html` per SmartLink, written atomically
//! - **Regen**: Rebuilds every published page from the record source
//! - **Routes**: Serves cached pages, falling back to the app shell
//!
//! # URL Pattern
//!
//! ```text
//! GET /sl/{shortId}.html
//! GET /s/{shortId}
//! ```
//!
//! # Security
//!
//! - All dynamic content is HTML-escaped, including single quotes
//! - URLs are validated (HTTPS/HTTP only) before use in attributes
//! - Short ids are restricted to `[A-Za-z0-9_-]`, so they are always plain filenames
//! - Content-Security-Policy only allows the page's own inline redirect script

pub mod auth;
pub mod config;
pub mod error;
pub mod record;
pub mod regen;
pub mod render;
pub mod routes;
pub mod shell;
pub mod source;
pub mod state;
pub mod store;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
