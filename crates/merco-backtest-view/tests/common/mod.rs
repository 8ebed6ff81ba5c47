/*
[INPUT]:  Session test scenarios needing a controllable backtest service
[OUTPUT]: FakeApi with caller-driven completions, task fixtures, wait helpers
[POS]:    Test infrastructure - shared across session test modules
[UPDATE]: When BacktestApi gains methods or fixtures change shape
*/

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use merco_adapter::{
    BacktestTask, Candle, CandlesQuery, CreateBacktestTaskRequest, CreateBacktestTaskResponse,
    MarketDataEntry, MercoError, Result, StreamEvent,
};
use merco_backtest_view::{BacktestApi, Session};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(100);

/// One outstanding call into the fake service; the test decides how and when it completes
#[derive(Debug)]
pub enum ApiCall {
    Create {
        request: CreateBacktestTaskRequest,
        reply: oneshot::Sender<Result<CreateBacktestTaskResponse>>,
    },
    Candles {
        query: CandlesQuery,
        reply: oneshot::Sender<Result<Vec<Candle>>>,
    },
}

#[derive(Debug)]
pub struct FakeApi {
    calls: mpsc::UnboundedSender<ApiCall>,
}

#[async_trait]
impl BacktestApi for FakeApi {
    async fn create_task(
        &self,
        request: &CreateBacktestTaskRequest,
    ) -> Result<CreateBacktestTaskResponse> {
        let (reply, rx) = oneshot::channel();
        self.calls
            .send(ApiCall::Create {
                request: request.clone(),
                reply,
            })
            .map_err(|_| MercoError::Stream("fake api closed".to_string()))?;
        rx.await
            .map_err(|_| MercoError::Stream("reply dropped".to_string()))?
    }

    async fn fetch_candles(&self, query: &CandlesQuery) -> Result<Vec<Candle>> {
        let (reply, rx) = oneshot::channel();
        self.calls
            .send(ApiCall::Candles {
                query: query.clone(),
                reply,
            })
            .map_err(|_| MercoError::Stream("fake api closed".to_string()))?;
        rx.await
            .map_err(|_| MercoError::Stream("reply dropped".to_string()))?
    }

    async fn list_strategies(&self) -> Result<Vec<String>> {
        Ok(vec!["sma-cross".to_string(), "grid".to_string()])
    }

    async fn list_market_data(&self) -> Result<Vec<MarketDataEntry>> {
        Ok(vec![
            MarketDataEntry {
                exchange: "binance".to_string(),
                symbol: "BTC/USDT".to_string(),
                timeframe: "1h".to_string(),
            },
            MarketDataEntry {
                exchange: "binance".to_string(),
                symbol: "ETH/USDT".to_string(),
                timeframe: "4h".to_string(),
            },
        ])
    }
}

pub struct Harness {
    pub session: Session,
    pub stream_tx: mpsc::Sender<StreamEvent>,
    pub calls: mpsc::UnboundedReceiver<ApiCall>,
}

impl Harness {
    pub fn start() -> Self {
        let (calls_tx, calls) = mpsc::unbounded_channel();
        let (stream_tx, stream_rx) = mpsc::channel(64);
        let api = Arc::new(FakeApi { calls: calls_tx });
        Self {
            session: Session::start(api, stream_rx),
            stream_tx,
            calls,
        }
    }

    pub async fn push(&self, event: StreamEvent) {
        self.stream_tx.send(event).await.expect("session consumes stream");
    }

    pub async fn push_task(&self, task: BacktestTask) {
        let id = task.id.clone();
        self.push(StreamEvent::Task(Box::new(task))).await;
        let mut tasks = self.session.subscribe_tasks();
        wait_for(&mut tasks, |tasks| tasks.iter().any(|t| t.id == id)).await;
    }

    pub async fn next_call(&mut self) -> ApiCall {
        timeout(WAIT, self.calls.recv())
            .await
            .expect("api call within timeout")
            .expect("fake api alive")
    }

    pub async fn expect_candles(
        &mut self,
    ) -> (CandlesQuery, oneshot::Sender<Result<Vec<Candle>>>) {
        match self.next_call().await {
            ApiCall::Candles { query, reply } => (query, reply),
            other => panic!("expected candles call, got {other:?}"),
        }
    }

    pub async fn expect_create(
        &mut self,
    ) -> (
        CreateBacktestTaskRequest,
        oneshot::Sender<Result<CreateBacktestTaskResponse>>,
    ) {
        match self.next_call().await {
            ApiCall::Create { request, reply } => (request, reply),
            other => panic!("expected create call, got {other:?}"),
        }
    }

    pub async fn assert_no_call(&mut self) {
        if let Ok(Some(call)) = timeout(QUIET, self.calls.recv()).await {
            panic!("unexpected api call: {call:?}");
        }
    }
}

pub async fn wait_for<T>(rx: &mut watch::Receiver<T>, predicate: impl FnMut(&T) -> bool) {
    timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("condition within timeout")
        .expect("session alive");
}

pub fn task_json(id: &str, status: &str) -> serde_json::Value {
    let mut value = serde_json::json!({
        "id": id,
        "status": status,
        "progress": 0.0,
        "name": "sma-cross",
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
            value["statistic"] = serde_json::json!({
                "trades": [
                    {
                        "timestamp": 1700000000000i64,
                        "trade_type": "limit_buy",
                        "price": "100",
                        "amount": "2",
                        "fee": "0.1",
                        "profit": null
                    },
                    {
                        "timestamp": 1700003600000i64,
                        "trade_type": "market_sell",
                        "price": "110",
                        "amount": "2",
                        "fee": "0.1",
                        "profit": "19.8"
                    }
                ],
                "net_profit": "19.8",
                "return_percent": 0.198,
                "profit_factor": null,
                "total_trades": 2
            });
        }
        "failed" => {
            value["error_message"] = serde_json::json!("No candles available for backtest");
        }
        _ => {}
    }

    value
}

pub fn task(id: &str, status: &str) -> BacktestTask {
    serde_json::from_value(task_json(id, status)).expect("valid task fixture")
}

/// Candles whose timestamps encode `seed`, so each task's chart is distinguishable
pub fn candles(seed: i64) -> Vec<Candle> {
    (0..3)
        .map(|i| {
            serde_json::from_value(serde_json::json!({
                "timestamp": (seed * 1_000_000 + i * 3_600) * 1000,
                "open": "100",
                "high": "110",
                "low": "95",
                "close": "105",
                "volume": "12.5"
            }))
            .expect("valid candle fixture")
        })
        .collect()
}

pub fn request() -> CreateBacktestTaskRequest {
    CreateBacktestTaskRequest::new("sma-cross", "binance", "BTC/USDT", "1h")
}
