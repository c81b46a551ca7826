pub mod broadcast;
pub mod config;
pub mod jobs;
pub mod lease;
pub mod runner;
pub mod sweep;

pub use broadcast::{BroadcastHub, Subscription};
pub use config::WorkerConfig;
pub use jobs::{Job, JobHandler, JobKind, StoreJobHandler};
pub use lease::LeaseTable;
pub use runner::{EnqueueOutcome, JobOutcome, JobRunner, JobTicket};
pub use sweep::{SweepReport, Sweeper};
