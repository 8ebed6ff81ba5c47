/*
[INPUT]:  Stream configuration and an HTTP client pointed at the backtest service
[OUTPUT]: Ordered task records and connectivity transitions
[POS]:    Stream layer - real-time task updates
[UPDATE]: When changing framing, reconnection, or event shapes
*/

pub mod client;
pub mod sse;

pub use client::{StreamEvent, TaskStream, TaskStreamConfig};
pub use sse::{SseDecoder, SseFrame};
