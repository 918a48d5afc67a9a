pub mod aggregation;
pub mod batch_fetch;
pub mod data_sync;
pub mod scheduler;
pub mod single_flight;
pub mod year_discovery;

pub use data_sync::{CycleOutcome, RainfallSyncService};
pub use scheduler::RefreshSchedule;
