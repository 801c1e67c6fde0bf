pub mod cache;
pub mod engine;
pub mod explorer;

pub use cache::{ReconciledStatus, StatusCache};
pub use engine::{ReconcileConfig, ReconciliationEngine};
pub use explorer::{ExplorerRegistry, ExplorerTemplate};
