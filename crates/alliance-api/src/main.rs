//! ALLIANCE OSTEO server entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use uuid::Uuid;

use alliance_api::{AppState, MemoryUser, Server, Settings, SimulationService, StoreBackend};
use alliance_auth::{PasswordAuthenticator, StaticAuthenticator, SupabaseJwtValidator, TokenValidator};
use alliance_core::{MemoryStore, Profile, Role, Store};
use alliance_llm::{GeminiProvider, LlmProvider, RetryWrapper};
use alliance_supabase::{PostgrestStore, SupabasePasswordAuth};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,alliance=debug".into()),
        )
        .init();

    let settings = Settings::parse();
    settings.validate()?;
    let jwt_secret = settings
        .supabase_jwt_secret
        .clone()
        .context("SUPABASE_JWT_SECRET must be set")?;

    let (store, authenticator) = match settings.store_backend {
        StoreBackend::Supabase => supabase_backend(&settings)?,
        StoreBackend::Memory => memory_backend(&settings.memory_users, &jwt_secret).await?,
    };

    let simulation = SimulationService::new(
        store.clone(),
        gemini(&settings, &settings.gemini_model_chat),
        gemini(&settings, &settings.gemini_model_eval),
    )
    .with_history_turns(settings.history_turns);

    if settings.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; chat and feedback will answer 503");
    }

    let validator: Arc<dyn TokenValidator> = Arc::new(SupabaseJwtValidator::new(&jwt_secret));
    let state = AppState::new(store, authenticator, simulation);
    let server = Server::new(state, validator, &settings.app_origin)?
        .with_debug_routes(settings.is_dev());

    tracing::info!(
        env = %settings.app_env,
        backend = ?settings.store_backend,
        chat_model = %settings.gemini_model_chat,
        eval_model = %settings.gemini_model_eval,
        "Starting ALLIANCE OSTEO server"
    );
    server.serve(settings.bind_addr()).await?;
    Ok(())
}

type Backend = (Arc<dyn Store>, Arc<dyn PasswordAuthenticator>);

fn supabase_backend(settings: &Settings) -> anyhow::Result<Backend> {
    let url = settings
        .supabase_url
        .as_deref()
        .context("SUPABASE_URL must be set")?;
    let key = settings
        .supabase_service_role_key
        .as_deref()
        .context("SUPABASE_SERVICE_ROLE_KEY must be set")?;

    let store = PostgrestStore::connect(url, key)?;
    let auth = SupabasePasswordAuth::new(url, key)?;
    tracing::info!(url, "Using Supabase backend");
    Ok((Arc::new(store), Arc::new(auth)))
}

async fn memory_backend(users: &[MemoryUser], jwt_secret: &str) -> anyhow::Result<Backend> {
    let store = MemoryStore::new();
    let mut auth = StaticAuthenticator::new(jwt_secret);

    for user in users {
        let id = Uuid::new_v4();
        let mut profile = Profile::new_student(id, Some(user.email.clone()));
        if user.admin {
            profile.role = Role::Admin;
        }
        store.insert_profile(&profile).await?;
        auth = auth.with_user(id, &user.email, &user.password);
        tracing::info!(email = %user.email, admin = user.admin, "Registered memory user");
    }
    if users.is_empty() {
        tracing::warn!("MEMORY_USERS is empty; nobody can sign in");
    }

    tracing::info!("Using in-memory backend; data is lost on restart");
    Ok((Arc::new(store), Arc::new(auth)))
}

fn gemini(settings: &Settings, model: &str) -> Arc<dyn LlmProvider> {
    let provider = GeminiProvider::new(settings.gemini_api_key.clone(), model)
        .with_base_url(settings.gemini_base_url.clone());
    Arc::new(RetryWrapper::new(Arc::new(provider)))
}
