//! HTTP API.
//!
//! Exposes the simplifier as JSON endpoints under `/api/`. The router is
//! composable: `api_router()` returns a `Router` that can be mounted on any
//! axum server, and `start_server_on()` runs it in a background task.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server_on, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
