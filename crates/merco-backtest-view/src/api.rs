/*
[INPUT]:  Backtest service operations needed by the session
[OUTPUT]: BacktestApi trait + MercoClient implementation
[POS]:    Integration seam - the only path from the core to the network
[UPDATE]: When the session needs another service call
*/

use async_trait::async_trait;
use merco_adapter::{
    Candle, CandlesQuery, CreateBacktestTaskRequest, CreateBacktestTaskResponse, MarketDataEntry,
    MercoClient, Result,
};

#[async_trait]
pub trait BacktestApi: Send + Sync {
    async fn create_task(
        &self,
        request: &CreateBacktestTaskRequest,
    ) -> Result<CreateBacktestTaskResponse>;

    async fn fetch_candles(&self, query: &CandlesQuery) -> Result<Vec<Candle>>;

    async fn list_strategies(&self) -> Result<Vec<String>>;

    async fn list_market_data(&self) -> Result<Vec<MarketDataEntry>>;
}

#[async_trait]
impl BacktestApi for MercoClient {
    async fn create_task(
        &self,
        request: &CreateBacktestTaskRequest,
    ) -> Result<CreateBacktestTaskResponse> {
        self.create_backtest_task(request).await
    }

    async fn fetch_candles(&self, query: &CandlesQuery) -> Result<Vec<Candle>> {
        self.get_candles(query).await
    }

    async fn list_strategies(&self) -> Result<Vec<String>> {
        MercoClient::list_strategies(self).await
    }

    async fn list_market_data(&self) -> Result<Vec<MarketDataEntry>> {
        MercoClient::list_market_data(self).await
    }
}
