//! Shared handler state.

use std::sync::Arc;

use alliance_auth::PasswordAuthenticator;
use alliance_core::Store;

use crate::simulation::SimulationService;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Simulator storage
    pub store: Arc<dyn Store>,
    /// Email/password sign-in
    pub authenticator: Arc<dyn PasswordAuthenticator>,
    /// Chat and evaluation flows
    pub simulation: Arc<SimulationService>,
}

impl AppState {
    /// Bundles the services behind the routes.
    pub fn new(
        store: Arc<dyn Store>,
        authenticator: Arc<dyn PasswordAuthenticator>,
        simulation: SimulationService,
    ) -> Self {
        Self {
            store,
            authenticator,
            simulation: Arc::new(simulation),
        }
    }
}
