/*
[INPUT]:  Candle series and marker projection of one task
[OUTPUT]: ChartState snapshot (points + markers + loaded task id)
[POS]:    Presentation layer - chart data shapes consumed by the render layer
[UPDATE]: When chart point shape or candle conversion changes
*/

use merco_adapter::Candle;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::markers::Marker;

/// One OHLC point in chart units (epoch seconds, floating prices)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl ChartPoint {
    pub fn from_candle(candle: &Candle) -> Self {
        Self {
            time: candle.timestamp.div_euclid(1000),
            open: candle.open.to_f64().unwrap_or(f64::NAN),
            high: candle.high.to_f64().unwrap_or(f64::NAN),
            low: candle.low.to_f64().unwrap_or(f64::NAN),
            close: candle.close.to_f64().unwrap_or(f64::NAN),
        }
    }
}

pub fn candles_to_points(candles: &[Candle]) -> Vec<ChartPoint> {
    candles.iter().map(ChartPoint::from_candle).collect()
}

/// What the chart currently renders. Points and markers always belong to `loaded_task_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartState {
    pub loaded_task_id: Option<String>,
    pub markers: Vec<Marker>,
    pub points: Vec<ChartPoint>,
}

impl ChartState {
    pub fn loaded(
        task_id: impl Into<String>,
        markers: Vec<Marker>,
        points: Vec<ChartPoint>,
    ) -> Self {
        Self {
            loaded_task_id: Some(task_id.into()),
            markers,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.loaded_task_id.is_none()
    }
}
