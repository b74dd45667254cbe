use anyhow::Result;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use huematch::api::{self, AppState};
use huematch::cache::QueryCache;
use huematch::config::Config;
use huematch::leaderboard::Leaderboard;
use huematch::service::{HttpUpstream, MatchService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huematch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables if .env exists
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    let upstream = HttpUpstream::from_config(&config)?;
    let cache = QueryCache::new(config.query_cache_capacity, config.query_cache_ttl);
    let service = MatchService::new(upstream, cache, Leaderboard::new());

    let app = api::create_router(AppState::new(service, config.rate_limit_per_minute));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
