/*
[INPUT]:  Task status and trade type strings of the backtest service
[OUTPUT]: TaskStatus / TradeType with side, order-kind and label helpers
[POS]:    Data layer - wire enums
[UPDATE]: When the service adds a status or trade type
*/

use serde::{Deserialize, Serialize};

/// Lifecycle status of a backtest task as reported by the service.
///
/// Transitions (service side only):
/// - Pending -> Running (execution started, progress updates follow)
/// - Running -> Completed (statistic attached)
/// - Running -> Failed (error_message attached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    MarketBuy,
    MarketSell,
    LimitBuy,
    LimitSell,
}

impl TradeType {
    pub fn is_buy(self) -> bool {
        matches!(self, TradeType::MarketBuy | TradeType::LimitBuy)
    }

    pub fn is_limit(self) -> bool {
        matches!(self, TradeType::LimitBuy | TradeType::LimitSell)
    }

    /// Upper-case label such as `LIMIT BUY`
    pub fn label(self) -> &'static str {
        match (self.is_limit(), self.is_buy()) {
            (false, true) => "MARKET BUY",
            (false, false) => "MARKET SELL",
            (true, true) => "LIMIT BUY",
            (true, false) => "LIMIT SELL",
        }
    }
}
