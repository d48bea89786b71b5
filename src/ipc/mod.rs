mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::handle_request;
pub use types::{AppState, Request};

/// Reply for a line that is not a valid request. There is no id to echo.
pub fn bad_json(message: String) -> serde_json::Value {
    error::err("", "bad_json", message, None)
}
