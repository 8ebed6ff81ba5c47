/*
[INPUT]:  Mock server and task fixture needs of adapter tests
[OUTPUT]: setup_mock_server and task_json helpers
[POS]:    Test infrastructure - shared by http and stream tests
[UPDATE]: When task fixtures change shape
*/

//! Common test utilities for merco-adapter tests

use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Task record as the service serializes it
#[allow(dead_code)]
pub fn task_json(id: &str, status: &str) -> serde_json::Value {
    let mut value = serde_json::json!({
        "id": id,
        "status": status,
        "progress": 0.0,
        "name": "my-strategy",
        "exchange": "binance",
        "symbol": "BTC/USDT",
        "timeframe": "1h",
        "precision": { "price_precision": "0.01", "amount_precision": "0.001" },
        "created_at": 1700000000000i64,
        "updated_at": 1700000000000i64
    });

    match status {
        "completed" => {
            value["progress"] = serde_json::json!(100.0);
            value["statistic"] = serde_json::json!({ "trades": [], "net_profit": "0" });
        }
        "failed" => {
            value["error_message"] = serde_json::json!("No candles available for backtest");
        }
        _ => {}
    }

    value
}
