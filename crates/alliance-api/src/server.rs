//! Router assembly and the HTTP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use alliance_auth::{AuthConfig, AuthLayer, TokenValidator};

use crate::config::ConfigError;
use crate::routes;
use crate::state::AppState;

/// ALLIANCE OSTEO HTTP server.
pub struct Server {
    state: AppState,
    validator: Arc<dyn TokenValidator>,
    origin: HeaderValue,
    debug_routes: bool,
}

impl Server {
    /// Create a server answering CORS requests from `origin`.
    pub fn new(
        state: AppState,
        validator: Arc<dyn TokenValidator>,
        origin: &str,
    ) -> Result<Self, ConfigError> {
        let origin = HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
            name: "APP_ORIGIN",
            reason: e.to_string(),
        })?;
        Ok(Self {
            state,
            validator,
            origin,
            debug_routes: false,
        })
    }

    /// Mount `/debug/auth` and `/debug/db`.
    pub fn with_debug_routes(mut self, enabled: bool) -> Self {
        self.debug_routes = enabled;
        self
    }

    /// Build the full router.
    ///
    /// Student and admin routes sit behind the bearer-token layer; health,
    /// login and debug routes do not. Unknown paths answer 404 without
    /// asking for a token.
    pub fn router(&self) -> Router {
        let protected = Router::new()
            .merge(routes::student::routes())
            .merge(routes::admin::routes())
            .route_layer(AuthLayer::new(self.validator.clone(), AuthConfig::default()));

        let mut public = Router::new()
            .merge(routes::health::routes())
            .merge(routes::auth::routes());
        if self.debug_routes {
            public = public.merge(routes::debug::routes());
        }

        // Credentialed CORS forbids wildcards, so methods and headers mirror the preflight.
        let cors = CorsLayer::new()
            .allow_origin(self.origin.clone())
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request());

        public
            .merge(protected)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Listen on `addr` until Ctrl-C or SIGTERM.
    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, debug_routes = self.debug_routes, "Listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutting down");
}
