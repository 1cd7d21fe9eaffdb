//! Backend entry-point: loads settings, wires adapters and serves the REST API.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use garage_backend::demo::{DemoSeedOutcome, load_registry, seed_demo_shop};
use garage_backend::domain::WebhookVerifier;
use garage_backend::domain::ports::Repositories;
use garage_backend::inbound::http::health::HealthState;
use garage_backend::inbound::http::state::{HttpState, HttpStatePorts};
use garage_backend::outbound::files::LocalFileStore;
use garage_backend::outbound::memory::MemoryStore;
use garage_backend::outbound::persistence::{
    DbPool, PoolConfig, diesel_repositories, run_migrations,
};
use garage_backend::outbound::security::{BcryptPasswordHasher, JwtTokenService};
use server::{AppSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let repositories = build_repositories(&settings).await?;
    let http_state = build_http_state(&settings, repositories.clone())?;

    if settings.seed_demo_data {
        seed_demo(&settings, &repositories, &http_state).await?;
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(bind_addr, web::Data::new(http_state)),
    )?;
    health_state.mark_ready();
    info!(%bind_addr, "garage backend listening");
    server.await
}

async fn build_repositories(settings: &AppSettings) -> io::Result<Repositories> {
    let Some(url) = settings.database_url.as_deref() else {
        warn!("no database configured; data lives in memory and is lost on exit");
        return Ok(MemoryStore::new().repositories());
    };
    let applied = run_migrations(url).await.map_err(io::Error::other)?;
    info!(applied, "database migrations applied");
    let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_max_connections()))
        .await
        .map_err(io::Error::other)?;
    Ok(diesel_repositories(pool))
}

fn build_http_state(settings: &AppSettings, repositories: Repositories) -> io::Result<HttpState> {
    let allow_ephemeral = cfg!(debug_assertions);
    if allow_ephemeral && settings.uses_ephemeral_secret() {
        warn!("using an ephemeral JWT secret (dev only); tokens will not survive a restart");
    }
    let secret = settings
        .jwt_secret(allow_ephemeral)
        .map_err(io::Error::other)?;
    let ttl = settings.token_ttl().map_err(io::Error::other)?;
    if settings.webhook_secret.is_none() {
        warn!("no webhook secret configured; payment webhooks will be rejected");
    }

    Ok(HttpState::new(HttpStatePorts {
        repositories,
        hasher: Arc::new(BcryptPasswordHasher::default()),
        tokens: Arc::new(JwtTokenService::new(secret.as_bytes(), ttl)),
        files: Arc::new(LocalFileStore::new(settings.upload_dir())),
        webhooks: WebhookVerifier::new(settings.webhook_secret.as_deref()),
        clock: Arc::new(DefaultClock),
    }))
}

async fn seed_demo(
    settings: &AppSettings,
    repositories: &Repositories,
    http_state: &HttpState,
) -> io::Result<()> {
    let registry =
        load_registry(settings.demo_registry_path.as_deref()).map_err(io::Error::other)?;
    match seed_demo_shop(repositories, http_state, &registry, settings.demo_seed())
        .await
        .map_err(io::Error::other)?
    {
        DemoSeedOutcome::Applied { .. } => {}
        DemoSeedOutcome::Skipped => info!("existing data found; demo shop not seeded"),
    }
    Ok(())
}
