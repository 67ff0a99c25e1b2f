//! Per-developer ingestion: the fan-out/fan-in coordinator, the staged task
//! pipeline behind it, the worker pool that drains the queue, and the
//! administrative repairs for runs that got stuck half way.

pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod profile;
pub mod queue;
pub mod repair;
pub mod tasks;
pub mod worker;

pub use config::IngestionConfig;
pub use coordinator::{Coordinator, LockTable, StartOutcome, UnitOutcome};
pub use error::{TaskError, TaskOutcome};
pub use profile::{ProfileLookup, ProfileService, ProfileView};
pub use queue::{Envelope, LocalQueue, TaskQueue};
pub use repair::{RepairReport, Repairer};
pub use tasks::Pipeline;
pub use worker::Worker;
