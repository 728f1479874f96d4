//! Tracking pixels
//!
//! A 1px-high SVG line whose color tells the embedding page what happened.
//! The hit route always answers with one of these and status 200, so a
//! failing counter never shows up as a broken image.

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";
pub const NO_CACHE: &str = "max-age=0, no-cache, no-store, must-revalidate";

const SUCCESS_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" height="1" width="100%"><line x1="0" y1="0" x2="100%" y2="0" stroke="#6E6E6E" stroke-width="1" /></svg>"##;
const WARNING_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" height="1" width="100%"><line x1="0" y1="0" x2="100%" y2="0" stroke="#FFE629" stroke-width="1" /></svg>"##;
const FAILURE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" height="1" width="100%"><line x1="0" y1="0" x2="100%" y2="0" stroke="#E5484D" stroke-width="1" /></svg>"##;

/// Which pixel a hit request receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    /// Hit counted (grey)
    Success,
    /// Request rejected before counting: bad key or user agent (yellow)
    Warning,
    /// Store read or write failed (red)
    Failure,
}

impl Pixel {
    pub fn svg(self) -> &'static str {
        match self {
            Pixel::Success => SUCCESS_SVG,
            Pixel::Warning => WARNING_SVG,
            Pixel::Failure => FAILURE_SVG,
        }
    }
}

impl IntoResponse for Pixel {
    fn into_response(self) -> Response {
        (
            [(CONTENT_TYPE, SVG_CONTENT_TYPE), (CACHE_CONTROL, NO_CACHE)],
            self.svg(),
        )
            .into_response()
    }
}
