//! Supabase backend for ALLIANCE OSTEO.
//!
//! - [`PostgrestClient`]: a small PostgREST query builder over `reqwest`
//! - [`PostgrestStore`]: the [`alliance_core::Store`] implementation
//! - [`SupabasePasswordAuth`]: GoTrue email/password sign-in

mod auth;
pub mod error;
mod rest;
mod store;

pub use auth::SupabasePasswordAuth;
pub use error::{Result, SupabaseError};
pub use rest::{parse_content_range_total, PostgrestClient, Query};
pub use store::PostgrestStore;
