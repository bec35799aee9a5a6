//! HTTP gateway: document upload and question answering over axum.

pub mod error;
pub mod params;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;
pub mod upload;

pub use {
    error::GatewayError,
    server::{build_router, serve},
    session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION, SESSION_HEADER, SessionKey, SessionStore},
    state::AppState,
};
