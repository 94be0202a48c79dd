//! Mock upstream HTTP server for integration tests.
//!
//! Serves:
//! - `GET /status` - NGX market status (settable per test)
//! - `GET /chart/{ticker}` - NGX chart data for `NGMTNN000002`
//! - `GET /v4/spreadsheets/{id}/values/{worksheet}` - holdings grid
//!
//! Every request is counted per route so tests can assert cache behavior.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

pub const API_KEY: &str = "test-key";
pub const SPREADSHEET_ID: &str = "sheet123";
pub const WORKSHEET: &str = "LiveStockData";

#[derive(Default)]
struct Counters {
    status: AtomicUsize,
    chart: AtomicUsize,
    sheet: AtomicUsize,
}

#[derive(Clone)]
struct MockState {
    /// Status response body; `None` answers 500.
    status: Arc<Mutex<Option<Value>>>,
    counters: Arc<Counters>,
}

/// A mock NGX + spreadsheet API server.
pub struct MockApiServer {
    addr: SocketAddr,
    state: MockState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockApiServer {
    /// Start on an available port with market status `OPEN`.
    pub async fn start() -> Self {
        let state = MockState {
            status: Arc::new(Mutex::new(Some(json!([{"MktStatus1": "OPEN"}])))),
            counters: Arc::new(Counters::default()),
        };

        let app = Router::new()
            .route("/status", get(status))
            .route("/chart/{ticker}", get(chart))
            .route("/v4/spreadsheets/{id}/values/{worksheet}", get(values))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn status_url(&self) -> String {
        format!("{}/status", self.base_url())
    }

    pub fn chart_url(&self) -> String {
        format!("{}/chart/", self.base_url())
    }

    /// Replace the status body; `None` makes the endpoint fail.
    pub async fn set_status(&self, body: Option<Value>) {
        *self.state.status.lock().await = body;
    }

    pub fn status_requests(&self) -> usize {
        self.state.counters.status.load(Ordering::SeqCst)
    }

    pub fn chart_requests(&self) -> usize {
        self.state.counters.chart.load(Ordering::SeqCst)
    }

    pub fn sheet_requests(&self) -> usize {
        self.state.counters.sheet.load(Ordering::SeqCst)
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn status(State(state): State<MockState>) -> Response {
    state.counters.status.fetch_add(1, Ordering::SeqCst);
    match state.status.lock().await.clone() {
        Some(body) => Json(body).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
    }
}

async fn chart(State(state): State<MockState>, Path(ticker): Path<String>) -> Response {
    state.counters.chart.fetch_add(1, Ordering::SeqCst);
    if ticker != "NGMTNN000002" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no data").into_response();
    }
    // Deliberately out of order
    Json(json!([
        [1770681600000i64, 252.0],
        [1770595200000i64, 250.5],
        [1770768000000i64, "255.25"]
    ]))
    .into_response()
}

async fn values(
    State(state): State<MockState>,
    Path((id, worksheet)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.counters.sheet.fetch_add(1, Ordering::SeqCst);

    if query.get("key").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::FORBIDDEN, "bad key").into_response();
    }
    if id != SPREADSHEET_ID {
        return (StatusCode::NOT_FOUND, "Requested entity was not found.").into_response();
    }
    if worksheet != WORKSHEET {
        return (StatusCode::BAD_REQUEST, "Unable to parse range").into_response();
    }

    Json(json!({
        "range": "LiveStockData!A1:L4",
        "majorDimension": "ROWS",
        "values": [
            ["Symbol", "Quantity", "Current Value", "Avg. Purchase Price", "Total Cost",
             "Profit/Loss", "P/L %", "Percent Change", "Last Updated", "Ticker ID"],
            ["MTNN", "100", "₦250.00", "₦222.22", "₦22,222.00",
             "₦2,778.00", "0.125", "1.2%", "2026-02-09 10:15:00", "NGMTNN000002"],
            ["NB", "1,000", "₦30.00", "₦31.58", "₦31,580.00",
             "-₦1,580.00", "-0.05", "-0.5%", "2026-02-09 10:15:00", "NGNB00000005"],
            ["", "", "", "", "", "", "", "", "", ""]
        ]
    }))
    .into_response()
}
