/*
[INPUT]:  Create-task response body of the backtest service
[OUTPUT]: CreateBacktestTaskResponse carrying the new task id
[POS]:    Data layer - response wire types
[UPDATE]: When the service changes a response body
*/

use serde::{Deserialize, Serialize};

/// Response of `POST /api/backtest/tasks`. The task itself arrives through the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBacktestTaskResponse {
    pub task_id: String,
}
