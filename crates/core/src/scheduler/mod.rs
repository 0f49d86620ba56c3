//! Job queue and scheduler.
//!
//! Raw inputs (URLs or batch files) are expanded into jobs, output
//! directories are created, and the jobs are spread over a fixed-size pool
//! of worker tasks.

mod dispatcher;
mod error;
mod expand;
mod pool;
mod types;

pub use dispatcher::Scheduler;
pub use error::QueueError;
pub use expand::{sanitize_title, QueueExpander, PLAYLIST_FALLBACK_TITLE};
pub use pool::WorkerPool;
pub use types::{default_workers, RunReport, RunStatus, SchedulerConfig, DEFAULT_WORKER_CAP, MAX_WORKERS};
