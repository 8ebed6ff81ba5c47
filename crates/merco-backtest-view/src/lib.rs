/*
[INPUT]:  Public API exports for merco-backtest-view crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod api;
pub mod chart;
pub mod config;
pub mod filters;
pub mod format;
pub mod markers;
pub mod pagination;
pub mod permit;
pub mod registry;
pub mod session;
pub mod stats;
pub mod submission;
pub mod synchronizer;

// Re-export main types for convenience
pub use api::BacktestApi;
pub use chart::{ChartPoint, ChartState};
pub use config::ViewConfig;
pub use filters::{MarketDataCatalog, SubmissionForm};
pub use markers::{Marker, project_markers};
pub use pagination::Paginator;
pub use permit::{Permit, PermitError};
pub use registry::TaskRegistry;
pub use session::{Session, SessionError};
pub use stats::StatisticsView;
pub use submission::SubmissionController;
pub use synchronizer::{ChartSynchronizer, LoadRequest};
