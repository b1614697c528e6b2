//! HTTP API module.
//!
//! This module provides the HTTP server, shared state, payload types, page
//! rendering and the log broadcaster used across the pipeline.

pub mod html;
pub mod logs;
pub mod server;
pub mod state;
pub mod types;

pub use logs::*;
pub use server::{build_router, start_server};
pub use state::AppState;
pub use types::*;
