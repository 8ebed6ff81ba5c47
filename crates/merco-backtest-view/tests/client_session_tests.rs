/*
[INPUT]:  Mock backtest service (SSE task stream + REST endpoints)
[OUTPUT]: Session behaviour over the real HTTP client
[POS]:    Integration test layer - session wired to MercoClient
[UPDATE]: When endpoints or session wiring change
*/

mod common;

use std::time::Duration;

use common::{task_json, wait_for};
use merco_adapter::{MercoClient, TaskStreamConfig};
use merco_backtest_view::Session;
use tokio::time::timeout;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(frames: &[serde_json::Value]) -> String {
    frames
        .iter()
        .map(|frame| format!("data: {frame}\n\n"))
        .collect()
}

#[tokio::test]
async fn test_session_charts_streamed_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/backtest/tasks/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            sse_body(&[task_json("r1", "running"), task_json("c1", "completed")]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/candles"))
        .and(query_param("exchange", "binance"))
        .and(query_param("symbol", "BTC/USDT"))
        .and(query_param("timeframe", "1h"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "timestamp": 1700000000000i64, "open": "100", "high": "101", "low": "99", "close": "100.5" },
            { "timestamp": 1700003600000i64, "open": "100.5", "high": "102", "low": "100", "close": "101" }
        ])))
        .mount(&server)
        .await;

    let client = MercoClient::new(&server.uri()).expect("client init");
    let session = Session::connect(client, TaskStreamConfig::default());

    let mut chart = session.subscribe_chart();
    wait_for(&mut chart, |chart| chart.loaded_task_id.as_deref() == Some("c1")).await;

    let state = session.chart_state();
    assert_eq!(state.points.len(), 2);
    assert_eq!(state.points[1].time, 1_700_003_600);
    assert_eq!(state.markers.len(), 2);
    assert_eq!(session.tasks().len(), 2);

    timeout(Duration::from_secs(5), session.shutdown())
        .await
        .expect("shutdown completes");
}

#[tokio::test]
async fn test_session_submits_through_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/backtest/tasks/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(String::new(), "text/event-stream"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/backtest/tasks"))
        .and(body_json(serde_json::json!({
            "name": "sma-cross",
            "exchange": "binance",
            "symbol": "BTC/USDT",
            "timeframe": "1h"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "task_id": "t-42" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = MercoClient::new(&server.uri()).expect("client init");
    let session = Session::connect(client, TaskStreamConfig::default());

    assert!(session.submit(common::request()).await.expect("session alive"));
    let mut last_created = session.subscribe_last_created();
    wait_for(&mut last_created, |id| id.as_deref() == Some("t-42")).await;
    assert!(!session.is_submitting());

    timeout(Duration::from_secs(5), session.shutdown())
        .await
        .expect("shutdown completes");
}
