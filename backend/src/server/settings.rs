//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `GARAGE_*` environment variables and an
//! optional configuration file, in increasing order of precedence.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use uuid::Uuid;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 720;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Settings that cannot be turned into a running server.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("GARAGE_JWT_SECRET must be set")]
    MissingJwtSecret,
    #[error("token TTL must be positive, got {0} minutes")]
    TokenTtl(i64),
}

/// Runtime configuration for the garage backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GARAGE")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; in-memory adapters are used when absent.
    pub database_url: Option<String>,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in minutes.
    pub token_ttl_minutes: Option<i64>,
    /// Directory holding work-order attachments.
    pub upload_dir: Option<PathBuf>,
    /// Shared secret for payment provider webhooks.
    pub webhook_secret: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Seed a demonstration shop when the store is empty.
    #[ortho_config(default = false)]
    pub seed_demo_data: bool,
    /// Seed name to load from the demo registry.
    pub demo_seed: Option<String>,
    /// Registry file overriding the bundled demo seeds.
    pub demo_registry_path: Option<PathBuf>,
}

impl AppSettings {
    /// Parsed listen address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] for unparsable addresses.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Signing secret for bearer tokens.
    ///
    /// When unset and `allow_ephemeral` is true a random secret is minted,
    /// so tokens stop validating across restarts.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingJwtSecret`] when no usable secret is
    /// configured and ephemeral secrets are not allowed.
    pub fn jwt_secret(&self, allow_ephemeral: bool) -> Result<Zeroizing<String>, SettingsError> {
        match self.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Ok(Zeroizing::new(secret.to_owned())),
            None if allow_ephemeral => Ok(Zeroizing::new(format!(
                "{}{}",
                Uuid::new_v4().simple(),
                Uuid::new_v4().simple()
            ))),
            None => Err(SettingsError::MissingJwtSecret),
        }
    }

    /// Whether [`Self::jwt_secret`] would mint an ephemeral secret.
    pub fn uses_ephemeral_secret(&self) -> bool {
        self.jwt_secret.as_deref().is_none_or(str::is_empty)
    }

    /// Bearer token lifetime, defaulting to 12 hours.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TokenTtl`] for zero or negative values.
    pub fn token_ttl(&self) -> Result<Duration, SettingsError> {
        let minutes = self.token_ttl_minutes.unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        if minutes <= 0 {
            return Err(SettingsError::TokenTtl(minutes));
        }
        Ok(Duration::minutes(minutes))
    }

    /// Attachment directory, defaulting to `./uploads`.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    /// Pool size, defaulting to 10.
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Demo seed name, defaulting to the bundled default seed.
    pub fn demo_seed(&self) -> &str {
        self.demo_seed
            .as_deref()
            .unwrap_or(demo_data::DEFAULT_SEED_NAME)
    }
}
