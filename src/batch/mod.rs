// Batch intake, guarding and execution
pub mod assembler;
pub mod draft;
pub mod entry;
pub mod executor;
pub mod guard;
pub mod normalizer;
pub mod service;

pub use entry::{EntryField, TransferEntry};
pub use executor::{BatchEvent, BatchExecutor, ExecutorConfig};
pub use service::{DisbursementService, DraftSummary, SubmitOptions};
