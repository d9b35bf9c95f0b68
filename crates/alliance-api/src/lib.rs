//! # alliance-api
//!
//! HTTP server for the ALLIANCE OSTEO 2026 anamnesis simulator:
//! - [`Settings`]: environment-driven configuration
//! - [`SimulationService`]: chat, session end, feedback, questionnaire
//! - [`Server`]: the axum router with CORS, tracing and bearer auth
//! - [`ApiError`]: status mapping with `{"detail": ...}` bodies

pub mod config;
pub mod error;
pub mod extract;
pub mod prompts;
pub mod routes;
pub mod server;
pub mod simulation;
pub mod state;

pub use config::{ConfigError, MemoryUser, Settings, StoreBackend};
pub use error::{ApiError, Result};
pub use server::Server;
pub use simulation::{ChatReply, SimulationError, SimulationService};
pub use state::AppState;
