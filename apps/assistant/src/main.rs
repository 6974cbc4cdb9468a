mod chat;
mod config;
mod errors;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::knowledge::KnowledgeBase;
use crate::chat::responder::{IndexPicker, RandomPicker, Responder};
use crate::chat::session::SessionRegistry;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Placement Assistant v{}", env!("CARGO_PKG_VERSION"));

    // Knowledge base is loaded and validated once; a missing bucket aborts startup
    let knowledge = Arc::new(KnowledgeBase::load(config.knowledge_base_path.as_deref())?);

    let picker: Arc<dyn IndexPicker> = match config.response_seed {
        Some(seed) => {
            info!(seed, "Response selection seeded");
            Arc::new(RandomPicker::seeded(seed))
        }
        None => Arc::new(RandomPicker::from_os_rng()),
    };

    info!("Typing delay: {}ms", config.typing_delay_ms);

    let sessions = SessionRegistry::new();
    match config.session_reaping() {
        Some((ttl, every)) => {
            info!("Idle sessions expire after {}s", ttl.as_secs());
            sessions.spawn_reaper(ttl, every);
        }
        None => info!("Idle session reaping disabled"),
    }

    let state = AppState {
        config: config.clone(),
        responder: Responder::new(knowledge, picker),
        sessions,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the portal frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
