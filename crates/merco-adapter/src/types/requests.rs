/*
[INPUT]:  Submission fields and candle lookup keys
[OUTPUT]: CreateBacktestTaskRequest and CandlesQuery wire types
[POS]:    Data layer - request wire types
[UPDATE]: When the service changes a request body or query
*/

use serde::{Deserialize, Serialize};

/// Body of `POST /api/backtest/tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBacktestTaskRequest {
    pub name: String,
    pub exchange: String,
    pub symbol: String,
    pub timeframe: String,
}

impl CreateBacktestTaskRequest {
    pub fn new(
        name: impl Into<String>,
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            exchange: exchange.into(),
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }

    /// All four fields carry a non-blank value
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.exchange, &self.symbol, &self.timeframe]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Query of `GET /api/candles`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandlesQuery {
    pub exchange: String,
    pub symbol: String,
    pub timeframe: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_completeness() {
        assert!(CreateBacktestTaskRequest::new("s", "binance", "BTC/USDT", "1h").is_complete());
        assert!(!CreateBacktestTaskRequest::new("s", "", "BTC/USDT", "1h").is_complete());
        assert!(!CreateBacktestTaskRequest::new("s", "binance", "  ", "1h").is_complete());
    }

    #[test]
    fn test_request_field_names() {
        let req = CreateBacktestTaskRequest::new("s", "binance", "BTC/USDT", "1h");
        let value = serde_json::to_value(&req).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "name": "s",
                "exchange": "binance",
                "symbol": "BTC/USDT",
                "timeframe": "1h"
            })
        );
    }
}
