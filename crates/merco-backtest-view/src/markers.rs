/*
[INPUT]:  Trade sequence of a completed task's statistic
[OUTPUT]: Chart overlay markers, one per trade, in trade order
[POS]:    Presentation layer - pure trade -> marker projection
[UPDATE]: When marker styling or label format changes
*/

use merco_adapter::Trade;
use serde::Serialize;

pub const BUY_COLOR: &str = "#26a69a";
pub const SELL_COLOR: &str = "#ef5350";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerPosition {
    #[serde(rename = "belowBar")]
    BelowBar,
    #[serde(rename = "aboveBar")]
    AboveBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerShape {
    #[serde(rename = "arrowUp")]
    ArrowUp,
    #[serde(rename = "arrowDown")]
    ArrowDown,
}

/// Chart overlay for one trade. Never stored apart from the statistic it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    /// Epoch seconds
    pub time: i64,
    pub position: MarkerPosition,
    pub color: &'static str,
    pub shape: MarkerShape,
    pub text: String,
}

impl Marker {
    pub fn from_trade(trade: &Trade) -> Self {
        let is_buy = trade.trade_type.is_buy();

        Self {
            time: trade.timestamp.div_euclid(1000),
            position: if is_buy {
                MarkerPosition::BelowBar
            } else {
                MarkerPosition::AboveBar
            },
            color: if is_buy { BUY_COLOR } else { SELL_COLOR },
            shape: if is_buy {
                MarkerShape::ArrowUp
            } else {
                MarkerShape::ArrowDown
            },
            text: format!(
                "{} {} @ {}",
                trade.trade_type.label(),
                trade.amount,
                trade.price
            ),
        }
    }
}

pub fn project_markers(trades: &[Trade]) -> Vec<Marker> {
    trades.iter().map(Marker::from_trade).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use merco_adapter::TradeType;
    use rstest::rstest;
    use rust_decimal::Decimal;

    use MarkerPosition::{AboveBar, BelowBar};
    use MarkerShape::{ArrowDown, ArrowUp};

    fn trade(trade_type: TradeType, timestamp: i64, price: i64, amount: i64) -> Trade {
        Trade {
            timestamp,
            trade_type,
            price: Decimal::new(price, 0),
            amount: Decimal::new(amount, 0),
            fee: Decimal::ZERO,
            profit: None,
        }
    }

    #[test]
    fn test_limit_buy_marker() {
        let marker = Marker::from_trade(&trade(TradeType::LimitBuy, 1000, 100, 2));
        assert_eq!(
            marker,
            Marker {
                time: 1,
                position: MarkerPosition::BelowBar,
                color: BUY_COLOR,
                shape: MarkerShape::ArrowUp,
                text: "LIMIT BUY 2 @ 100".to_string(),
            }
        );
    }

    #[rstest]
    #[case(TradeType::MarketBuy, BelowBar, ArrowUp, "MARKET BUY 1 @ 50")]
    #[case(TradeType::MarketSell, AboveBar, ArrowDown, "MARKET SELL 1 @ 50")]
    #[case(TradeType::LimitSell, AboveBar, ArrowDown, "LIMIT SELL 1 @ 50")]
    fn test_marker_classification(
        #[case] trade_type: TradeType,
        #[case] position: MarkerPosition,
        #[case] shape: MarkerShape,
        #[case] text: &str,
    ) {
        let marker = Marker::from_trade(&trade(trade_type, 1_999, 50, 1));
        assert_eq!(marker.time, 1);
        assert_eq!(marker.position, position);
        assert_eq!(marker.shape, shape);
        assert_eq!(marker.text, text);
    }

    #[test]
    fn test_projection_preserves_source_order() {
        let trades = vec![
            trade(TradeType::MarketSell, 5_000, 10, 1),
            trade(TradeType::MarketBuy, 2_000, 11, 1),
            trade(TradeType::LimitBuy, 9_000, 12, 1),
        ];

        let times: Vec<i64> = project_markers(&trades).iter().map(|m| m.time).collect();
        assert_eq!(times, vec![5, 2, 9]);
        assert!(project_markers(&[]).is_empty());
    }

    #[test]
    fn test_marker_wire_names() {
        let marker = Marker::from_trade(&trade(TradeType::MarketSell, 0, 1, 1));
        let value = serde_json::to_value(&marker).expect("serialize");
        assert_eq!(value["position"], "aboveBar");
        assert_eq!(value["shape"], "arrowDown");
    }
}
