/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Merco backtest adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod stream;
pub mod types;

// Re-export commonly used types from http
pub use http::{ClientConfig, MercoClient, MercoError, Result};

// Re-export all types
pub use types::*;

// Re-export commonly used types from stream
pub use stream::{SseDecoder, SseFrame, StreamEvent, TaskStream, TaskStreamConfig};
