/*
[INPUT]:  Backtest service base URL and client timeouts
[OUTPUT]: MercoClient endpoint groups (tasks, market data) and error types
[POS]:    HTTP layer - module wiring for REST access
[UPDATE]: When adding an endpoint group
*/

pub mod backtest;
pub mod client;
pub mod error;
pub mod market;

pub use error::{MercoError, Result};

pub use client::{ClientConfig, DEFAULT_BASE_URL, MercoClient};
