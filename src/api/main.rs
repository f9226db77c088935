//! Farm directory API server.
//!
//! Serves farm search plus CRUD over farms, produce, and farmer profiles.
//! Identity is delegated to an external provider; the document store is the
//! only shared mutable state.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use paddock::store::{EsStore, Index};

mod auth;
mod categories;
mod farms;
mod produce;
mod response;
mod users;

use auth::IdentityClient;

#[derive(Parser, Debug)]
#[command(name = "api")]
#[command(about = "Farm directory API server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Elasticsearch URL
    #[arg(long, default_value = "http://localhost:9200")]
    es_url: String,

    /// Index name prefix
    #[arg(long, default_value = "paddock")]
    index_prefix: String,

    /// Identity provider base URL
    #[arg(long, default_value = "http://localhost:8787")]
    auth_url: String,
}

/// Application state shared across handlers
pub struct AppState {
    pub store: EsStore,
    pub identity: IdentityClient,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Paddock API Server");
    info!("Connecting to Elasticsearch at {}", args.es_url);

    let store = EsStore::new(&args.es_url, &args.index_prefix)?;

    if !store.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }

    let farm_count = store.doc_count(Index::Farms).await?;
    info!("Connected with {} farms indexed", farm_count);

    let secret_key = std::env::var("AUTH_SECRET_KEY").unwrap_or_default();
    if secret_key.is_empty() {
        warn!("AUTH_SECRET_KEY is not set; the identity provider will reject verification calls");
    }
    let identity = IdentityClient::new(args.auth_url.clone(), secret_key)?;

    let state = Arc::new(AppState { store, identity });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/farms",
            get(farms::search_farms).post(farms::create_farm),
        )
        .route(
            "/farms/{farmId}",
            get(farms::get_farm)
                .put(farms::update_farm)
                .delete(farms::delete_farm),
        )
        .route(
            "/farms/{farmId}/produce",
            get(produce::get_farm_produce).post(produce::add_farm_produce),
        )
        .route("/farms/{farmId}/track-view", post(farms::track_view))
        .route("/farms/{farmId}/track-contact", post(farms::track_contact))
        .route(
            "/produce/{produceId}",
            get(produce::get_produce)
                .put(produce::update_produce)
                .delete(produce::delete_produce),
        )
        .route("/my_farms", get(farms::my_farms))
        .route("/categories", get(categories::list_categories))
        .route("/auth/register", post(users::register))
        .route("/auth/profile", get(users::profile))
        .route("/auth/update", post(users::update_profile))
        .route("/auth/delete", post(users::delete_profile))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let healthy = state.store.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        elasticsearch: healthy,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    elasticsearch: bool,
}
