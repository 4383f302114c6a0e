//! # Rusty-Forum Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use rf_api::handlers::AppState;
use rf_api::{configure_routes, middleware};
use rf_config::Settings;

// Feature-gated imports: each port is compiled in from exactly one plugin
#[cfg(feature = "db-sqlite")]
use rf_db_sqlite::SqliteForumRepo;

#[cfg(feature = "auth-simple")]
use rf_auth_simple::SignedTokenResolver;

#[cfg(not(all(feature = "db-sqlite", feature = "auth-simple")))]
compile_error!("rusty-forum needs a storage plugin (db-sqlite) and a session plugin (auth-simple)");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    rf_config::load_dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().context("loading configuration")?;

    // 1. Initialize Database Implementation
    let repo = Arc::new(
        SqliteForumRepo::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("opening the SQLite store")?,
    );

    // 2. Initialize Session Implementation
    let sessions = SignedTokenResolver::new(&settings.auth.session_secret)?;

    // 3. Wrap in AppState (dynamic dispatch keeps the plugins swappable)
    let state = web::Data::new(AppState::new(repo, Box::new(sessions), settings.limits.clone()));

    let (host, port) = settings.bind_address();
    log::info!("🚀 Rusty-Forum starting on http://{host}:{port}");

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy())
            .wrap(middleware::security_headers())
            .wrap(middleware::standard_middleware())
            .configure(configure_routes)
    });
    if let Some(workers) = settings.server.workers {
        server = server.workers(workers);
    }

    server
        .bind((host.as_str(), port))
        .with_context(|| format!("binding {host}:{port}"))?
        .run()
        .await?;

    log::info!("Rusty-Forum stopped");
    Ok(())
}
