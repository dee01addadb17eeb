//! HTTP server wiring: shared state, router and middleware.

mod app;
mod middleware;
mod state;

pub use app::create_app;
pub use middleware::track_http_requests;
pub use state::{AppState, StateError};
