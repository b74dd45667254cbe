mod request;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::models::LeaderboardEntry;
use crate::service::{MatchService, Upstream};

pub use request::{MatchRequest, DEFAULT_LIMIT, DEFAULT_PERIOD};

pub const RATE_LIMITED_MESSAGE: &str = "too many requests";
pub const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub struct AppState<U> {
    pub service: MatchService<U>,
    pub limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl<U: Upstream> AppState<U> {
    /// GCRA limit: a burst of `requests_per_minute`, then one request every
    /// `60 / requests_per_minute` seconds per client address.
    pub fn new(service: MatchService<U>, requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self::with_quota(service, Quota::per_minute(per_minute))
    }

    pub fn with_quota(service: MatchService<U>, quota: Quota) -> Self {
        Self {
            service,
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Forget clients whose quota has fully replenished.
    pub fn prune_rate_limits(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

/// Periodically prune the limiter for as long as the state is alive.
fn spawn_limiter_cleanup<U: Upstream + 'static>(state: &Arc<AppState<U>>, every: Duration) {
    let state = Arc::downgrade(state);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(state) = state.upgrade() else {
                break;
            };
            state.prune_rate_limits();
            tracing::debug!("Rate limiter tracking {} clients", state.limiter.len());
        }
    });
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Builds the router and starts the limiter cleanup task, so it must be
/// called from within a tokio runtime.
pub fn create_router<U: Upstream + 'static>(state: AppState<U>) -> Router {
    let state = Arc::new(state);
    spawn_limiter_cleanup(&state, LIMITER_CLEANUP_INTERVAL);

    let match_routes = Router::new()
        .route("/api/fetch_and_match", post(fetch_and_match_handler::<U>))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit::<U>,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/leaderboard", get(leaderboard_handler::<U>))
        .merge(match_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Per-client-address limit on the match endpoint.
async fn rate_limit<U: Upstream + 'static>(
    State(state): State<Arc<AppState<U>>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if state.limiter.check_key(&addr.ip()).is_err() {
        tracing::warn!("Rate limit exceeded for {}", addr.ip());
        return error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE);
    }

    next.run(request).await
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn leaderboard_handler<U: Upstream + 'static>(
    State(state): State<Arc<AppState<U>>>,
) -> Json<Vec<LeaderboardEntry>> {
    Json(state.service.leaderboard().snapshot().await)
}

async fn fetch_and_match_handler<U: Upstream + 'static>(
    State(state): State<Arc<AppState<U>>>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("Rejected match request: {}", rejection.body_text());
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("invalid request: {}", rejection.body_text()),
            );
        }
    };

    match state.service.fetch_and_match(&request.into_query()).await {
        Ok(matched) => Json(matched).into_response(),
        // Pipeline failures are reported in the body, not the status
        Err(e) => {
            tracing::info!("Match failed: {}", e);
            error_response(StatusCode::OK, e.to_string())
        }
    }
}
