//! HTTP server implementation using axum.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use folio_telemetry::Metrics;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use serde::Serialize;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::state::DashboardState;
use crate::types::{DashboardMessage, DashboardSnapshot, ErrorBody, HistoryResponse, RefreshView};

/// Connection limiter to prevent too many concurrent WebSocket connections.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Reserve a slot. The guard releases it on drop and can be moved into
    /// the upgraded connection task.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard {
                    limiter: Arc::clone(self),
                });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    dashboard_state: DashboardState,
    broadcast_tx: broadcast::Sender<String>,
    connection_limiter: Arc<ConnectionLimiter>,
    config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(dashboard_state: DashboardState, broadcast_tx: broadcast::Sender<String>) -> Self {
        let config = Arc::new(dashboard_state.config().clone());
        Self {
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
            dashboard_state,
            broadcast_tx,
            config,
        }
    }

    /// Reject the request unless basic auth is disabled or satisfied.
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        if self.config.auth_enabled() && !check_basic_auth(headers, &self.config) {
            return Err(unauthorized_response());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CacheClearedBody {
    cleared: bool,
    timestamp_ms: i64,
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/refresh-gate", get(get_refresh_gate))
        .route("/api/history/{symbol}", get(get_history))
        .route("/api/cache/clear", post(clear_cache))
        .route("/metrics", get(get_metrics))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the index HTML page.
async fn serve_index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<&'static str>, Response> {
    state.authorize(&headers)?;
    Ok(Html(include_str!("../static/index.html")))
}

/// Get current state snapshot as JSON.
async fn get_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardSnapshot>, Response> {
    state.authorize(&headers)?;
    Ok(Json(state.dashboard_state.collect_snapshot().await))
}

async fn get_refresh_gate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshView>, Response> {
    state.authorize(&headers)?;
    Ok(Json(state.dashboard_state.refresh_view().await))
}

/// Historical prices for one symbol.
async fn get_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, Response> {
    state.authorize(&headers)?;
    state
        .dashboard_state
        .history(&symbol)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Drop cached upstream data and tell connected clients to reload.
async fn clear_cache(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CacheClearedBody>, Response> {
    state.authorize(&headers)?;
    state.dashboard_state.clear_caches("button");

    let timestamp_ms = Utc::now().timestamp_millis();
    crate::broadcast::send(
        &state.broadcast_tx,
        &DashboardMessage::CacheCleared { timestamp_ms },
    );
    Ok(Json(CacheClearedBody {
        cleared: true,
        timestamp_ms,
    }))
}

/// Prometheus text exposition.
async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }
    match Metrics::gather_text() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(resp) = state.authorize(&headers) {
        return resp;
    }

    // Check connection limit
    let guard = match state.connection_limiter.try_acquire() {
        Some(guard) => guard,
        None => {
            warn!(
                current = state.connection_limiter.current_count(),
                max = state.config.max_connections,
                "WebSocket connection limit reached"
            );
            return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
        }
    };

    info!(
        connections = state.connection_limiter.current_count(),
        "New WebSocket connection"
    );

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, guard))
}

/// Handle a WebSocket connection.
async fn handle_ws_connection(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    Metrics::ws_client_connected();
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the snapshot so nothing broadcast in between is lost
    let mut broadcast_rx = state.broadcast_tx.subscribe();

    let initial_msg = DashboardMessage::Snapshot(state.dashboard_state.collect_snapshot().await);
    if let Ok(json) = serde_json::to_string(&initial_msg) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            debug!("Failed to send initial snapshot, client disconnected");
            Metrics::ws_client_disconnected();
            return;
        }
    }

    // Pongs are answered by axum; only close and errors matter here
    let mut incoming_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            result = broadcast_rx.recv() => {
                match result {
                    Ok(msg) => {
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            debug!("Failed to send message, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "WebSocket client lagged, catching up");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }
            _ = &mut incoming_task => {
                debug!("Incoming task completed, closing connection");
                break;
            }
        }
    }

    incoming_task.abort();
    Metrics::ws_client_disconnected();
    info!(
        connections = state.connection_limiter.current_count().saturating_sub(1),
        "WebSocket connection closed"
    );
}

/// Check basic authentication.
fn check_basic_auth(headers: &HeaderMap, config: &DashboardConfig) -> bool {
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Basic "))
    else {
        return false;
    };

    let Some(decoded) = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    decoded == format!("{}:{}", config.username, config.password)
}

/// Create an unauthorized response.
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Portfolio\"")],
        "Unauthorized",
    )
        .into_response()
}

fn error_response(err: DashboardError) -> Response {
    let status = match &err {
        DashboardError::UnknownSymbol(_) => StatusCode::NOT_FOUND,
        DashboardError::MarketData(_) => StatusCode::BAD_GATEWAY,
        DashboardError::Config(_) | DashboardError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status != StatusCode::NOT_FOUND {
        warn!(error = %err, "Request failed");
    }
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Run the dashboard HTTP server until `shutdown` resolves.
pub async fn run_server<F>(dashboard_state: DashboardState, shutdown: F) -> DashboardResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = dashboard_state.config().bind_addr()?;

    // A few refresh intervals of slack for slow clients
    let (broadcast_tx, _) = broadcast::channel::<String>(32);

    let state = AppState::new(dashboard_state.clone(), broadcast_tx.clone());
    let app = create_router(state);

    let broadcaster = tokio::spawn(crate::broadcast::run_broadcaster(
        dashboard_state,
        broadcast_tx,
    ));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting dashboard server");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;
    broadcaster.abort();
    result?;

    info!("Dashboard server stopped");
    Ok(())
}
