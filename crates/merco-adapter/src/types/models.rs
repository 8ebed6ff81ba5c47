/*
[INPUT]:  Task, statistic, trade, candle and market-data JSON of the backtest service
[OUTPUT]: Typed records with lenient numeric decoding and invariant helpers
[POS]:    Data layer - wire records
[UPDATE]: When the service changes a record shape or numeric encoding
*/

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::enums::{TaskStatus, TradeType};

/// Largest scale a `Decimal` can carry
const MAX_DISPLAY_DIGITS: u32 = 28;

/// Market tick sizes; a tick of `0.01` means two decimal digits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPrecision {
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub price_precision: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub amount_precision: Option<Decimal>,
}

impl MarketPrecision {
    pub fn new(price_precision: Decimal, amount_precision: Decimal) -> Self {
        Self {
            price_precision: Some(price_precision),
            amount_precision: Some(amount_precision),
        }
    }

    /// Decimal digits used to display prices, `None` when the tick is unusable
    pub fn price_digits(&self) -> Option<u32> {
        tick_digits(self.price_precision)
    }

    /// Decimal digits used to display amounts, `None` when the tick is unusable
    pub fn amount_digits(&self) -> Option<u32> {
        tick_digits(self.amount_precision)
    }
}

/// `|log10(tick)|`, rounded so ticks such as 0.001 do not lose a digit to float error.
fn tick_digits(tick: Option<Decimal>) -> Option<u32> {
    let tick = tick?;
    if tick <= Decimal::ZERO {
        return None;
    }

    let digits = tick.to_f64()?.log10().abs().round();
    if !digits.is_finite() {
        return None;
    }

    Some((digits as u32).min(MAX_DISPLAY_DIGITS))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution time in epoch milliseconds
    pub timestamp: i64,
    pub trade_type: TradeType,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub price: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub amount: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub fee: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub profit: Option<Decimal>,
}

/// Aggregate result of a completed backtest. Computed by the service; read-only here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestStatistic {
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub initial_capital: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub total_cost: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub net_profit: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_lenient_f64")]
    pub return_percent: Option<f64>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub max_equity: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub max_drawdown: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_lenient_f64")]
    pub max_drawdown_percent: Option<f64>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub gross_profit: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub gross_loss: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_lenient_f64")]
    pub profit_factor: Option<f64>,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_lenient_f64")]
    pub sharpe_ratio: Option<f64>,
    #[serde(default)]
    pub total_trades: u64,
    #[serde(default)]
    pub buy_trades: u64,
    #[serde(default)]
    pub sell_trades: u64,
    #[serde(default)]
    pub winning_trades: u64,
    #[serde(default)]
    pub losing_trades: u64,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_lenient_f64")]
    pub win_rate: Option<f64>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub avg_win: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub avg_loss: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub largest_win: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub largest_loss: Option<Decimal>,
}

/// One backtest job as published by the service. Stream updates always carry the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTask {
    pub id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: f64,
    pub name: String,
    pub exchange: String,
    pub symbol: String,
    pub timeframe: String,
    #[serde(default)]
    pub precision: Option<MarketPrecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistic: Option<BacktestStatistic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub updated_at: i64,
}

impl BacktestTask {
    /// `statistic` is present iff completed, `error_message` iff failed
    pub fn is_consistent(&self) -> bool {
        let statistic_ok = self.statistic.is_some() == (self.status == TaskStatus::Completed);
        let error_ok = self.error_message.is_some() == (self.status == TaskStatus::Failed);
        statistic_ok && error_ok
    }

    /// Only completed tasks with a statistic can be selected for charting
    pub fn is_selectable(&self) -> bool {
        self.status == TaskStatus::Completed && self.statistic.is_some()
    }

    /// Trades of the attached statistic, empty when none is attached
    pub fn trades(&self) -> &[Trade] {
        self.statistic
            .as_ref()
            .map(|statistic| statistic.trades.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in epoch milliseconds
    pub timestamp: i64,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub open: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub high: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub low: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub close: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_lenient_decimal",
        serialize_with = "serde_helpers::serialize_optional_decimal"
    )]
    pub volume: Option<Decimal>,
}

/// One (exchange, symbol, timeframe) combination with stored candles
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketDataEntry {
    pub exchange: String,
    pub symbol: String,
    pub timeframe: String,
}

mod serde_helpers {
    use super::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    /// Strict decimal: accepts a decimal string or a JSON number
    pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(raw) => Decimal::from_str(raw.trim()).map_err(serde::de::Error::custom),
            Value::Number(number) => {
                Decimal::from_str(&number.to_string()).map_err(serde::de::Error::custom)
            }
            _ => Err(serde::de::Error::custom("invalid decimal value")),
        }
    }

    pub fn serialize_decimal<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    /// Lenient decimal: null, empty or unparseable values become `None`
    pub fn deserialize_lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = match &value {
            Value::String(raw) => Decimal::from_str(raw.trim())
                .or_else(|_| Decimal::from_scientific(raw.trim()))
                .ok(),
            Value::Number(number) => Decimal::from_str(&number.to_string())
                .or_else(|_| Decimal::from_scientific(&number.to_string()))
                .ok(),
            _ => None,
        };
        Ok(parsed)
    }

    pub fn serialize_optional_decimal<S>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Lenient float: null, `"NaN"`, `"Infinity"` and garbage become `None`
    pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = match &value {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => raw.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(parsed.filter(|value| value.is_finite()))
    }
}
