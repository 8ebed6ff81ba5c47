/*
[INPUT]:  Exchange / symbol / timeframe selections
[OUTPUT]: Strategy names, available market data, candle series
[POS]:    HTTP layer - lookup endpoints feeding selection filters and charts
[UPDATE]: When adding new lookup endpoints or changing response format
*/

use crate::http::{MercoClient, Result};
use crate::types::{Candle, CandlesQuery, MarketDataEntry};
use reqwest::Method;

impl MercoClient {
    /// Strategy names known to the service, in service order
    ///
    /// GET /api/strategies
    pub async fn list_strategies(&self) -> Result<Vec<String>> {
        let builder = self.request(Method::GET, "/api/strategies")?;
        self.send_json(builder).await
    }

    /// Every (exchange, symbol, timeframe) with stored candles
    ///
    /// GET /api/market-data
    pub async fn list_market_data(&self) -> Result<Vec<MarketDataEntry>> {
        let builder = self.request(Method::GET, "/api/market-data")?;
        self.send_json(builder).await
    }

    /// Candle series ordered by timestamp
    ///
    /// GET /api/candles?exchange={exchange}&symbol={symbol}&timeframe={timeframe}
    pub async fn get_candles(&self, query: &CandlesQuery) -> Result<Vec<Candle>> {
        let builder = self.request(Method::GET, "/api/candles")?.query(query);
        self.send_json(builder).await
    }
}
