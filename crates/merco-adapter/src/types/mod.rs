/*
[INPUT]:  Backtest service JSON schema (tasks, statistics, candles, market data)
[OUTPUT]: Wire types re-exported flat for `merco_adapter::*` users
[POS]:    Data layer - module wiring for wire types
[UPDATE]: When a wire type module is added or split
*/

pub mod enums;
pub mod models;
pub mod requests;
pub mod responses;

pub use enums::*;
pub use models::*;
pub use requests::*;
pub use responses::*;
