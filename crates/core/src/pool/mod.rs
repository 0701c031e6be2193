//! Bounded, self-expanding work pool.
//!
//! The pool runs a small number of worker loops against a fixed-capacity
//! task queue. It starts with one worker per CPU (capped by its limit) and
//! only grows, four workers at a time, while the queue is completely full.
//! Producers block in [`WorkPool::add`] when there is no queue space, which
//! gives natural backpressure.
//!
//! # Lifecycle
//!
//! - [`WorkPool::start`] spawns the initial workers.
//! - [`WorkPool::wait`] drains every queued task, then resets the pool into
//!   a fresh running state. Tasks may be added again without `start`.
//! - [`WorkPool::stop`] cancels the workers, lets in-flight tasks finish and
//!   discards whatever is still queued. `start` must be called before reuse.
//!
//! # Example
//!
//! ```ignore
//! use audiotree_core::pool::WorkPool;
//! use tokio_util::sync::CancellationToken;
//!
//! let pool = WorkPool::new(CancellationToken::new(), 0, 0);
//! pool.start().await?;
//! pool.add(Box::pin(async { println!("hello from a worker") })).await?;
//! pool.wait().await?;
//! ```

mod error;
mod work_pool;

pub use error::PoolError;
pub use work_pool::{Task, WorkPool};
