/*
[INPUT]:  Available market data tuples and user field edits
[OUTPUT]: Dependent option lists + a submission form that stays consistent
[POS]:    Presentation layer - submission form model
[UPDATE]: When the submission form gains fields or filter rules change
*/

use merco_adapter::{CreateBacktestTaskRequest, MarketDataEntry};

/// Distinct market-data options, each list in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketDataCatalog {
    entries: Vec<MarketDataEntry>,
}

impl MarketDataCatalog {
    pub fn new(entries: Vec<MarketDataEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn exchanges(&self) -> Vec<&str> {
        distinct(self.entries.iter().map(|entry| entry.exchange.as_str()))
    }

    pub fn symbols(&self, exchange: &str) -> Vec<&str> {
        distinct(
            self.entries
                .iter()
                .filter(|entry| entry.exchange == exchange)
                .map(|entry| entry.symbol.as_str()),
        )
    }

    pub fn timeframes(&self, exchange: &str, symbol: &str) -> Vec<&str> {
        distinct(
            self.entries
                .iter()
                .filter(|entry| entry.exchange == exchange && entry.symbol == symbol)
                .map(|entry| entry.timeframe.as_str()),
        )
    }

    pub fn contains(&self, exchange: &str, symbol: &str, timeframe: &str) -> bool {
        self.entries.iter().any(|entry| {
            entry.exchange == exchange && entry.symbol == symbol && entry.timeframe == timeframe
        })
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// The four submit fields. Changing a parent field clears children it no longer offers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub strategy: String,
    pub exchange: String,
    pub symbol: String,
    pub timeframe: String,
}

impl SubmissionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_strategy(&mut self, strategy: impl Into<String>) {
        self.strategy = strategy.into();
    }

    pub fn set_exchange(&mut self, catalog: &MarketDataCatalog, exchange: impl Into<String>) {
        self.exchange = exchange.into();
        if !catalog.symbols(&self.exchange).contains(&self.symbol.as_str()) {
            self.symbol.clear();
            self.timeframe.clear();
            return;
        }
        self.retain_timeframe(catalog);
    }

    pub fn set_symbol(&mut self, catalog: &MarketDataCatalog, symbol: impl Into<String>) {
        self.symbol = symbol.into();
        self.retain_timeframe(catalog);
    }

    fn retain_timeframe(&mut self, catalog: &MarketDataCatalog) {
        if !catalog
            .timeframes(&self.exchange, &self.symbol)
            .contains(&self.timeframe.as_str())
        {
            self.timeframe.clear();
        }
    }

    pub fn set_timeframe(&mut self, timeframe: impl Into<String>) {
        self.timeframe = timeframe.into();
    }

    pub fn to_request(&self) -> CreateBacktestTaskRequest {
        CreateBacktestTaskRequest::new(
            self.strategy.clone(),
            self.exchange.clone(),
            self.symbol.clone(),
            self.timeframe.clone(),
        )
    }
}
