//! # Seeya Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod settings;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use sy_api::handlers::AppState;
use sy_api::{configure_routes, middleware};
use sy_core::planner::TripPlanner;

use crate::settings::Settings;

// Feature-gated imports: storage is chosen at compile time
#[cfg(feature = "db-sqlite")]
use sy_db_sqlite::SqliteTripStore;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("enable a storage backend feature (db-sqlite)");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(SqliteTripStore::new(&settings.database_url).await?);

    // 2. Wrap in AppState; the same store serves both ports
    let planner = TripPlanner::new(store.clone(), store);
    let pending_ttl = Duration::from_secs(settings.pending_ttl_secs);
    let state = web::Data::new(AppState::with_pending_ttl(planner, pending_ttl));

    log::info!("Seeya starting on http://{}:{}", settings.host, settings.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
