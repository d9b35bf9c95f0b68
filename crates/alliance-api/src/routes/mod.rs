//! Route groups. Each module exposes a `routes()` router over [`AppState`].
//!
//! [`AppState`]: crate::state::AppState

pub mod admin;
pub mod auth;
pub mod debug;
pub mod health;
pub mod student;
