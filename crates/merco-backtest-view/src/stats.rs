/*
[INPUT]:  Selected task (statistic + precision) and paginator position
[OUTPUT]: StatisticsView - formatted summary rows and current trade page
[POS]:    Presentation layer - statistics panel model
[UPDATE]: When summary metrics or trade columns change
*/

use chrono::{DateTime, Utc};
use merco_adapter::{BacktestStatistic, BacktestTask, MarketPrecision, Trade};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::format::{
    DEFAULT_DIGITS, NOT_AVAILABLE, format_amount, format_number, format_percent, format_price,
};
use crate::pagination::Paginator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRow {
    pub time: String,
    pub trade_type: &'static str,
    pub price: String,
    pub amount: String,
    pub fee: String,
    pub profit: String,
}

impl TradeRow {
    pub fn from_trade(trade: &Trade, precision: Option<&MarketPrecision>) -> Self {
        Self {
            time: format_timestamp(trade.timestamp),
            trade_type: trade.trade_type.label(),
            price: format_price(trade.price, precision),
            amount: format_amount(trade.amount, precision),
            fee: format_number(trade.fee, DEFAULT_DIGITS),
            profit: format_number(trade.profit, DEFAULT_DIGITS),
        }
    }
}

/// Statistics panel for one completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsView {
    pub task_id: String,
    pub summary: Vec<SummaryRow>,
    pub trades: Vec<TradeRow>,
    pub page: usize,
    pub page_count: usize,
    pub total_trades: usize,
}

impl StatisticsView {
    /// `None` for tasks without a statistic
    pub fn build(task: &BacktestTask, paginator: &Paginator) -> Option<Self> {
        let statistic = task.statistic.as_ref()?;
        let precision = task.precision.as_ref();

        let trades = paginator
            .slice(&statistic.trades)
            .iter()
            .map(|trade| TradeRow::from_trade(trade, precision))
            .collect();

        Some(Self {
            task_id: task.id.clone(),
            summary: summary_rows(statistic),
            trades,
            page: paginator.page(),
            page_count: paginator.page_count(statistic.trades.len()),
            total_trades: statistic.trades.len(),
        })
    }

    pub fn summary_value(&self, label: &str) -> Option<&str> {
        self.summary
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }
}

fn summary_rows(statistic: &BacktestStatistic) -> Vec<SummaryRow> {
    let money = |value: Option<Decimal>| format_number(value, DEFAULT_DIGITS);
    let ratio = |value: Option<f64>| format_number(value, DEFAULT_DIGITS);
    let count = |value: u64| value.to_string();

    let rows = [
        ("Net Profit", money(statistic.net_profit)),
        ("Return", format_percent(statistic.return_percent)),
        ("Initial Capital", money(statistic.initial_capital)),
        ("Max Equity", money(statistic.max_equity)),
        ("Max Drawdown", money(statistic.max_drawdown)),
        ("Max Drawdown %", format_percent(statistic.max_drawdown_percent)),
        ("Profit Factor", ratio(statistic.profit_factor)),
        ("Sharpe Ratio", ratio(statistic.sharpe_ratio)),
        ("Win Rate", win_rate(statistic.win_rate)),
        ("Total Trades", count(statistic.total_trades)),
        ("Buy Trades", count(statistic.buy_trades)),
        ("Sell Trades", count(statistic.sell_trades)),
        ("Winning Trades", count(statistic.winning_trades)),
        ("Losing Trades", count(statistic.losing_trades)),
        ("Gross Profit", money(statistic.gross_profit)),
        ("Gross Loss", money(statistic.gross_loss)),
        ("Avg Win", money(statistic.avg_win)),
        ("Avg Loss", money(statistic.avg_loss)),
        ("Largest Win", money(statistic.largest_win)),
        ("Largest Loss", money(statistic.largest_loss)),
        ("Total Cost", money(statistic.total_cost)),
    ];

    rows.into_iter()
        .map(|(label, value)| SummaryRow { label, value })
        .collect()
}

fn win_rate(value: Option<f64>) -> String {
    let formatted = format_number(value, DEFAULT_DIGITS);
    if formatted == NOT_AVAILABLE {
        formatted
    } else {
        format!("{formatted}%")
    }
}

/// UTC wall-clock time of an epoch-millisecond timestamp
pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
