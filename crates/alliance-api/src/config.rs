//! Server configuration from flags and environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use clap::{Parser, ValueEnum};

use alliance_llm::DEFAULT_GEMINI_BASE_URL;

/// Where simulator data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Supabase PostgREST tables
    Supabase,
    /// In-process maps, lost on restart
    Memory,
}

/// A sign-in account for the `memory` backend: `email:password[:admin]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUser {
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
    /// Whether the account gets the admin role
    pub admin: bool,
}

impl FromStr for MemoryUser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let email = parts.next().unwrap_or_default().trim();
        let password = parts.next().unwrap_or_default();
        let admin = match parts.next() {
            None => false,
            Some("admin") => true,
            Some(other) => return Err(format!("unknown role suffix '{other}'")),
        };
        if email.is_empty() || password.is_empty() {
            return Err("expected email:password[:admin]".to_string());
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
            admin,
        })
    }
}

/// Configuration problems detected before the server starts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A setting has an unusable value.
    #[error("Invalid {name}: {reason}")]
    Invalid {
        /// Setting name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// ALLIANCE OSTEO server settings.
#[derive(Parser, Debug, Clone)]
#[command(name = "alliance-server", version)]
#[command(about = "ALLIANCE OSTEO 2026 simulator backend", long_about = None)]
pub struct Settings {
    /// TCP port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Deployment environment; `dev` enables the debug routes
    #[arg(long, env = "APP_ENV", default_value = "dev")]
    pub app_env: String,

    /// Frontend origin allowed by CORS
    #[arg(long, env = "APP_ORIGIN", default_value = "http://localhost:5173")]
    pub app_origin: String,

    /// Storage backend
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Supabase)]
    pub store_backend: StoreBackend,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase service-role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_role_key: Option<String>,

    /// HS256 secret that signs access tokens
    #[arg(long, env = "SUPABASE_JWT_SECRET", hide_env_values = true)]
    pub supabase_jwt_secret: Option<String>,

    /// Accounts for the memory backend, comma separated
    #[arg(long, env = "MEMORY_USERS", value_delimiter = ',', hide_env_values = true)]
    pub memory_users: Vec<MemoryUser>,

    /// Gemini API key; AI endpoints answer 503 without it
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini endpoint
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// Model playing the patient
    #[arg(long, env = "GEMINI_MODEL_CHAT", default_value = "gemini-2.0-flash")]
    pub gemini_model_chat: String,

    /// Model writing the evaluation
    #[arg(long, env = "GEMINI_MODEL_EVAL", default_value = "gemini-2.0-flash")]
    pub gemini_model_eval: String,

    /// Turns of history sent with each patient prompt
    #[arg(long, env = "HISTORY_TURNS", default_value_t = 30)]
    pub history_turns: usize,
}

impl Settings {
    /// Checks settings that depend on each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_blank(&self.supabase_jwt_secret) {
            return Err(ConfigError::Missing("SUPABASE_JWT_SECRET"));
        }
        if self.store_backend == StoreBackend::Supabase {
            if is_blank(&self.supabase_url) {
                return Err(ConfigError::Missing("SUPABASE_URL"));
            }
            if is_blank(&self.supabase_service_role_key) {
                return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"));
            }
        }
        if self.history_turns == 0 {
            return Err(ConfigError::Invalid {
                name: "HISTORY_TURNS",
                reason: "must be at least 1".to_string(),
            });
        }
        http::HeaderValue::from_str(&self.app_origin).map_err(|e| ConfigError::Invalid {
            name: "APP_ORIGIN",
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the debug routes are mounted.
    pub fn is_dev(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("dev")
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}
