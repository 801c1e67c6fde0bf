pub mod log;
pub mod models;

pub use log::{ExpiringOrderLog, OrderLog};
pub use models::{newest_first, Order, OutcomeStatus, TransferOutcome, NO_ORDER_ID};
