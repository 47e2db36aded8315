//! Pipeline entry points.
//!
//! - `Retriever`: dispatch to a fetch strategy and parse the result
//! - `TrendJob`: one retrieve-and-persist cycle
//! - `Scheduler`: startup run plus fixed-interval recurrence

pub mod job;
pub mod retrieve;
pub mod scheduler;

pub use job::{CycleReport, Job, TrendJob};
pub use retrieve::{RetrievalFailure, RetrievalOutcome, Retriever};
pub use scheduler::{Scheduler, SchedulerState, StopReason, shutdown_signal};
