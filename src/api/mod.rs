//! HTTP API.
//!
//! `GET /` symptom page, `POST /login` and `POST /logout` demo sessions,
//! `POST /chat` predictions and `GET /health`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::app_router;
pub use server::serve;
pub use types::{AppState, ServerConfig};
