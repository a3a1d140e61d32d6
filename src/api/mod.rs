//! REST API module.
//!
//! Exposes the employee, task and dashboard endpoints over axum.

mod response;
mod server;

pub use response::ApiResponse;
pub use server::{AppState, ServerHandle, build_router, start_server};
