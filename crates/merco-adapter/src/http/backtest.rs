/*
[INPUT]:  Backtest task requests and task identifiers
[OUTPUT]: Created task ids and task snapshots
[POS]:    HTTP layer - backtest task endpoints
[UPDATE]: When adding new task endpoints or changing response format
*/

use crate::http::{MercoClient, Result};
use crate::http::MercoError;
use crate::types::{BacktestTask, CreateBacktestTaskRequest, CreateBacktestTaskResponse};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

pub(crate) const TASKS_ENDPOINT: &str = "/api/backtest/tasks";
pub(crate) const TASK_STREAM_ENDPOINT: &str = "/api/backtest/tasks/stream";

impl MercoClient {
    /// Create a backtest job
    ///
    /// POST /api/backtest/tasks
    pub async fn create_backtest_task(
        &self,
        req: &CreateBacktestTaskRequest,
    ) -> Result<CreateBacktestTaskResponse> {
        let builder = self.request(Method::POST, TASKS_ENDPOINT)?.json(req);
        self.send_json(builder).await
    }

    /// Snapshot of every known task
    ///
    /// GET /api/backtest/tasks
    pub async fn list_backtest_tasks(&self) -> Result<Vec<BacktestTask>> {
        let builder = self.request(Method::GET, TASKS_ENDPOINT)?;
        self.send_json(builder).await
    }

    /// Single task by id
    ///
    /// GET /api/backtest/tasks/{id}
    pub async fn get_backtest_task(&self, task_id: &str) -> Result<BacktestTask> {
        let endpoint = format!("{}/{}", TASKS_ENDPOINT, task_id);
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }

    /// Open the Server-Sent-Events task stream; the body is consumed by `TaskStream`
    ///
    /// GET /api/backtest/tasks/stream
    pub async fn open_task_stream(&self) -> Result<reqwest::Response> {
        let builder = self
            .stream_request(TASK_STREAM_ENDPOINT)?
            .header(ACCEPT, "text/event-stream");
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MercoError::api_error(status, &body));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("text/event-stream") {
            return Err(MercoError::InvalidResponse(format!(
                "task stream answered with content type {content_type:?}"
            )));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{MercoClient, MercoError};
    use crate::types::{CreateBacktestTaskRequest, TaskStatus};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_backtest_task() {
        let server = MockServer::start().await;
        let req = CreateBacktestTaskRequest::new("my-strategy", "binance", "BTC/USDT", "1h");

        let _mock = Mock::given(method("POST"))
            .and(path("/api/backtest/tasks"))
            .and(body_json(serde_json::json!({
                "name": "my-strategy",
                "exchange": "binance",
                "symbol": "BTC/USDT",
                "timeframe": "1h"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"task_id":"t-42"}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = MercoClient::new(&server.uri()).expect("client init");
        let response = client
            .create_backtest_task(&req)
            .await
            .expect("create_backtest_task failed");

        assert_eq!(response.task_id, "t-42");
    }

    #[tokio::test]
    async fn test_create_backtest_task_maps_api_error() {
        let server = MockServer::start().await;

        let _mock = Mock::given(method("POST"))
            .and(path("/api/backtest/tasks"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_raw(r#"{"error":"Package 'nope' not found"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = MercoClient::new(&server.uri()).expect("client init");
        let err = client
            .create_backtest_task(&CreateBacktestTaskRequest::new(
                "nope", "binance", "BTC/USDT", "1h",
            ))
            .await
            .expect_err("should fail");

        match err {
            MercoError::Api { code, message } => {
                assert_eq!(code, 404);
                assert_eq!(message, "Package 'nope' not found");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_and_get_backtest_tasks() {
        let server = MockServer::start().await;
        let task = serde_json::json!({
            "id": "t-1",
            "status": "running",
            "progress": 42.5,
            "name": "my-strategy",
            "exchange": "binance",
            "symbol": "BTC/USDT",
            "timeframe": "1h",
            "precision": { "price_precision": "0.01", "amount_precision": "0.001" },
            "created_at": 1,
            "started_at": 2,
            "updated_at": 3
        });

        let _list = Mock::given(method("GET"))
            .and(path("/api/backtest/tasks"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([task.clone()])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let _get = Mock::given(method("GET"))
            .and(path("/api/backtest/tasks/t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task))
            .expect(1)
            .mount(&server)
            .await;

        let client = MercoClient::new(&server.uri()).expect("client init");

        let tasks = client.list_backtest_tasks().await.expect("list failed");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Running);

        let single = client.get_backtest_task("t-1").await.expect("get failed");
        assert_eq!(single, tasks[0]);
        assert_eq!(single.progress, 42.5);
    }
}
