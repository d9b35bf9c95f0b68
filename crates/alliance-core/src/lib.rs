//! Core library for the ALLIANCE OSTEO anamnesis simulator.
//!
//! This crate holds everything that does not depend on a transport:
//!
//! - [`types`]: profiles, sessions, messages, feedback and badges
//! - [`program`]: the 16-session program and its progression rules
//! - [`badges`]: milestone and skill badge awards
//! - [`analytics`]: score averages for administrators
//! - [`store`]: the [`Store`] persistence trait and an in-memory backend

pub mod accounts;
pub mod analytics;
pub mod badges;
pub mod error;
pub mod program;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::{MemoryStore, Store};
pub use types::*;
