//! Dashboard flow integration tests.
//!
//! Runs the application's dashboard router against the mock upstream:
//! - Snapshot assembly from sheet rows and market status
//! - Cache reuse and manual cache clearing
//! - Price history lookup
//! - Upstream failure handling

mod integration;
use integration::common::mock_api::{MockApiServer, API_KEY, SPREADSHEET_ID, WORKSHEET};

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use folio_app::{AppConfig, Application};
use folio_core::MarketStatus;
use folio_dashboard::{create_router, AppState};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower::ServiceExt;

fn config_for(server: &MockApiServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.ngx.market_status_url = server.status_url();
    config.ngx.historical_base_url = server.chart_url();
    config.sheet.api_base = server.base_url();
    config.sheet.spreadsheet_id = SPREADSHEET_ID.to_string();
    config.sheet.worksheet = WORKSHEET.to_string();
    config.sheet.api_key = API_KEY.to_string();
    config
}

fn router_for(app: &Application) -> Router {
    let (tx, _) = broadcast::channel(8);
    create_router(AppState::new(app.state().clone(), tx))
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(router: &Router, uri: &str) -> StatusCode {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(req).await.unwrap().status()
}

fn decimal(value: &Value) -> f64 {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_snapshot_from_mock_upstream() {
    let server = MockApiServer::start().await;
    let app = Application::new(config_for(&server)).unwrap();
    let router = router_for(&app);

    let (status, snapshot) = get_json(&router, "/api/snapshot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["market_status"], "OPEN");
    assert_eq!(snapshot["currency_symbol"], "₦");

    // Blank trailing row is skipped
    let holdings = snapshot["holdings"].as_array().unwrap();
    assert_eq!(holdings.len(), 2);

    // P/L % column was stored as fractions and is shown as percent
    assert_eq!(holdings[0]["P/L % Visual"], "⬆️ 12.50%");
    assert_eq!(holdings[1]["P/L % Visual"], "⬇️ -5.00%");
    assert_eq!(decimal(&holdings[1]["Total Value"]), 30000.0);

    let totals = &snapshot["totals"];
    assert_eq!(decimal(&totals["total_value"]), 55000.0);
    assert_eq!(decimal(&totals["amount_invested"]), 53802.0);
    assert_eq!(decimal(&totals["profit_loss"]), 1198.0);

    assert_eq!(snapshot["chart_symbols"], json!(["MTNN", "NB"]));
    let columns = snapshot["columns"].as_array().unwrap();
    assert_eq!(columns[0], "Symbol");
    assert!(columns.contains(&json!("P/L % Visual")));
    assert!(snapshot["warnings"].as_array().unwrap().is_empty());
    assert!(snapshot["data_fetched_at_ms"].is_i64());

    let refresh = &snapshot["refresh"];
    assert_eq!(refresh["interval_secs"], 120);
    assert_eq!(refresh["zone"], "GMT+1");
    assert!(refresh["status_line"]
        .as_str()
        .unwrap()
        .starts_with("Auto-refresh (GMT+1"));
}

#[tokio::test]
async fn test_caches_reused_until_cleared() {
    let server = MockApiServer::start().await;
    let app = Application::new(config_for(&server)).unwrap();
    let router = router_for(&app);

    get_json(&router, "/api/snapshot").await;
    get_json(&router, "/api/snapshot").await;
    get_json(&router, "/api/refresh-gate").await;
    assert_eq!(server.sheet_requests(), 1);
    assert_eq!(server.status_requests(), 1);

    assert_eq!(post(&router, "/api/cache/clear").await, StatusCode::OK);

    get_json(&router, "/api/snapshot").await;
    assert_eq!(server.sheet_requests(), 2);
    assert_eq!(server.status_requests(), 2);
}

#[tokio::test]
async fn test_history_sorted_and_cached() {
    let server = MockApiServer::start().await;
    let app = Application::new(config_for(&server)).unwrap();
    let router = router_for(&app);

    let (status, history) = get_json(&router, "/api/history/MTNN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["ticker_id"], "NGMTNN000002");

    let prices: Vec<f64> = history["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| decimal(&p["price"]))
        .collect();
    assert_eq!(prices, vec![250.5, 252.0, 255.25]);

    get_json(&router, "/api/history/MTNN").await;
    assert_eq!(server.chart_requests(), 1);
}

#[tokio::test]
async fn test_history_errors() {
    let server = MockApiServer::start().await;
    let app = Application::new(config_for(&server)).unwrap();
    let router = router_for(&app);

    // Not in the ticker mapping
    let (status, body) = get_json(&router, "/api/history/DANGCEM").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("DANGCEM"));

    // Mapped, but the upstream fails
    let (status, body) = get_json(&router, "/api/history/NB").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("NGNB00000005"));
}

#[tokio::test]
async fn test_closed_market_never_refreshes() {
    let server = MockApiServer::start().await;
    server
        .set_status(Some(json!([{"MktStatus1": "ENDOFDAY"}])))
        .await;
    let app = Application::new(config_for(&server)).unwrap();

    let (status, decision) = app.check_gate().await;
    assert_eq!(status, MarketStatus::reported("ENDOFDAY"));
    assert!(!decision.refresh);
}

#[tokio::test]
async fn test_status_failure_falls_back() {
    let server = MockApiServer::start().await;
    server.set_status(None).await;
    let app = Application::new(config_for(&server)).unwrap();
    let router = router_for(&app);

    let (status, snapshot) = get_json(&router, "/api/snapshot").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["market_status"], "Status API/Parse Error");
    // Holdings still load
    assert_eq!(snapshot["holdings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unexpected_status_shape_is_unknown() {
    let server = MockApiServer::start().await;
    server.set_status(Some(json!({"status": "OPEN"}))).await;
    let app = Application::new(config_for(&server)).unwrap();

    let (status, _) = app.check_gate().await;
    assert_eq!(status, MarketStatus::unknown());
}

#[tokio::test]
async fn test_missing_sheet_reported_as_warning() {
    let server = MockApiServer::start().await;

    let mut config = config_for(&server);
    config.sheet.worksheet = "Archive".to_string();
    let app = Application::new(config).unwrap();
    let (_, snapshot) = get_json(&router_for(&app), "/api/snapshot").await;
    assert!(snapshot["holdings"].as_array().unwrap().is_empty());
    let warning = snapshot["warnings"][0].as_str().unwrap();
    assert!(warning.contains("Worksheet 'Archive' not found"));

    let mut config = config_for(&server);
    config.sheet.spreadsheet_id = "nope".to_string();
    let app = Application::new(config).unwrap();
    let (_, snapshot) = get_json(&router_for(&app), "/api/snapshot").await;
    let warning = snapshot["warnings"][0].as_str().unwrap();
    assert!(warning.contains("Spreadsheet 'nope' not found"));

    // Failures are not cached
    let before = server.sheet_requests();
    get_json(&router_for(&app), "/api/snapshot").await;
    assert_eq!(server.sheet_requests(), before + 1);
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let server = MockApiServer::start().await;
    let mut config = config_for(&server);
    config.dashboard.host = "127.0.0.1".to_string();
    config.dashboard.port = 0;
    let app = Application::new(config).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(folio_dashboard::run_server(app.state().clone(), async move {
        let _ = rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
