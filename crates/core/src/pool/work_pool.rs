//! Work pool implementation.

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::error::PoolError;

/// A unit of work executed by the pool.
///
/// Tasks have no return value. Failures are reported by the task itself.
pub type Task = BoxFuture<'static, ()>;

/// Smallest queue capacity used when none is configured.
const MIN_DEFAULT_BUFFER: usize = 100;

/// Most workers spawned by a single growth step.
const MAX_GROWTH: usize = 4;

type SharedReceiver = Arc<Mutex<mpsc::Receiver<Task>>>;

/// State guarded by the pool mutex.
struct PoolState {
    queue: Option<mpsc::Sender<Task>>,
    receiver: Option<SharedReceiver>,
    cancel: CancellationToken,
    workers: JoinSet<()>,
    next_worker_id: usize,
}

/// A bounded pool of worker loops draining a fixed-capacity queue.
pub struct WorkPool {
    parent: CancellationToken,
    limit: usize,
    buffer: usize,
    /// Live worker loops. Only written while holding `state`.
    size: AtomicUsize,
    /// Only written while holding `state`.
    running: AtomicBool,
    /// Weak handle on the current queue, used for lock-free queue stats.
    gauge: StdMutex<Option<mpsc::WeakSender<Task>>>,
    state: Mutex<PoolState>,
}

impl WorkPool {
    /// Creates a stopped pool. Call [`start`](Self::start) before adding tasks.
    ///
    /// A `limit` of 0 uses the host CPU count. A `buffer` of 0 uses
    /// `max(limit, 100)`. Cancelling `parent` halts every worker.
    pub fn new(parent: CancellationToken, limit: usize, buffer: usize) -> Self {
        let limit = if limit == 0 { num_cpus::get() } else { limit };
        let buffer = if buffer == 0 {
            limit.max(MIN_DEFAULT_BUFFER)
        } else {
            buffer
        };

        Self {
            state: Mutex::new(PoolState {
                queue: None,
                receiver: None,
                cancel: parent.child_token(),
                workers: JoinSet::new(),
                next_worker_id: 0,
            }),
            parent,
            limit,
            buffer,
            size: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            gauge: StdMutex::new(None),
        }
    }

    /// Spawns the initial workers: one per CPU, capped by the limit.
    pub async fn start(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;
        if self.is_running() {
            return Err(PoolError::AlreadyRunning);
        }
        state.cancel = self.parent.child_token();
        self.init(&mut state);
        Ok(())
    }

    /// Queues a task, growing the pool first if the queue is full.
    ///
    /// Blocks while the queue has no free slot.
    pub async fn add(&self, task: Task) -> Result<(), PoolError> {
        let (queue, cancel) = {
            let mut state = self.state.lock().await;
            self.expand(&mut state)?;
            match state.queue.clone() {
                Some(queue) => (queue, state.cancel.clone()),
                None => return Err(PoolError::NotRunning),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PoolError::Cancelled),
            sent = queue.send(task) => sent.map_err(|_| PoolError::NotRunning),
        }
    }

    /// Cancels every worker and discards queued tasks.
    ///
    /// Tasks already executing run to completion before this returns.
    /// The pool must be started again before further use.
    pub async fn stop(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;
        if !self.is_running() {
            return Err(PoolError::NotRunning);
        }

        state.cancel.cancel();
        self.running.store(false, Ordering::SeqCst);
        state.queue = None;

        join_workers(&mut state.workers).await;
        self.size.store(0, Ordering::SeqCst);
        self.set_gauge(None);

        let discarded = state.receiver.take().map(discard_queued).unwrap_or(0);
        debug!(discarded, "Work pool stopped");
        Ok(())
    }

    /// Runs every queued task to completion, then resets the pool into a
    /// fresh running state with a new queue and initial workers.
    pub async fn wait(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;
        if !self.is_running() {
            return Err(PoolError::NotRunning);
        }

        // Workers exit once the queue is closed and empty.
        state.queue = None;
        join_workers(&mut state.workers).await;
        self.size.store(0, Ordering::SeqCst);
        state.receiver = None;

        // Reinitialize before releasing the lock so a concurrent `add` never
        // sees a half-reset pool.
        self.init(&mut state);
        Ok(())
    }

    /// Approximate number of free queue slots.
    pub fn remaining(&self) -> usize {
        match self.current_queue() {
            Some(queue) => queue.capacity(),
            None => self.buffer,
        }
    }

    /// Percentage of queue slots in use.
    pub fn percent_full(&self) -> f64 {
        let queued = self.buffer.saturating_sub(self.remaining());
        queued as f64 / self.buffer as f64 * 100.0
    }

    /// Current number of worker loops.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Maximum number of worker loops.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Capacity of the task queue.
    pub fn queue_bound(&self) -> usize {
        self.buffer
    }

    /// Whether the pool accepts tasks.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Creates a fresh queue and the initial workers. Caller holds the lock.
    fn init(&self, state: &mut PoolState) {
        let (queue, receiver) = mpsc::channel(self.buffer);
        self.set_gauge(Some(queue.downgrade()));
        state.queue = Some(queue);
        state.receiver = Some(Arc::new(Mutex::new(receiver)));

        let initial = num_cpus::get().min(self.limit);
        self.spawn_workers(state, initial);
        self.running.store(true, Ordering::SeqCst);
        debug!(
            workers = initial,
            limit = self.limit,
            buffer = self.buffer,
            "Work pool started"
        );
    }

    /// Grows the pool by up to four workers when the queue is full.
    fn expand(&self, state: &mut PoolState) -> Result<(), PoolError> {
        if !self.is_running() {
            return Err(PoolError::NotRunning);
        }

        let size = self.size();
        if size >= self.limit || self.remaining() > 0 {
            return Ok(());
        }

        let growth = MAX_GROWTH.min(self.limit - size);
        trace!(size, growth, limit = self.limit, "Queue full, growing work pool");
        self.spawn_workers(state, growth);
        Ok(())
    }

    fn spawn_workers(&self, state: &mut PoolState, count: usize) {
        let Some(receiver) = state.receiver.clone() else {
            return;
        };
        for _ in 0..count {
            let id = state.next_worker_id;
            state.next_worker_id += 1;
            state
                .workers
                .spawn(worker_loop(id, Arc::clone(&receiver), state.cancel.clone()));
        }
        self.size.fetch_add(count, Ordering::SeqCst);
    }

    fn current_queue(&self) -> Option<mpsc::Sender<Task>> {
        let gauge = self.gauge.lock().unwrap_or_else(|e| e.into_inner());
        gauge.as_ref().and_then(|weak| weak.upgrade())
    }

    fn set_gauge(&self, queue: Option<mpsc::WeakSender<Task>>) {
        *self.gauge.lock().unwrap_or_else(|e| e.into_inner()) = queue;
    }
}

/// Receives and executes tasks until cancelled or the queue is drained.
async fn worker_loop(id: usize, receiver: SharedReceiver, cancel: CancellationToken) {
    trace!(worker = id, "Worker started");
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                trace!(worker = id, "Worker cancelled");
                return;
            }
            next = next_task(&receiver) => next,
        };

        match next {
            Some(task) => task.await,
            None => {
                trace!(worker = id, "Queue drained, worker exiting");
                return;
            }
        }
    }
}

async fn next_task(receiver: &SharedReceiver) -> Option<Task> {
    receiver.lock().await.recv().await
}

async fn join_workers(workers: &mut JoinSet<()>) {
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                warn!("Work pool worker panicked: {}", e);
            }
        }
    }
}

/// Drops every task left in a queue whose workers have exited.
fn discard_queued(receiver: SharedReceiver) -> usize {
    let Ok(receiver) = Arc::try_unwrap(receiver) else {
        return 0;
    };
    let mut receiver = receiver.into_inner();
    receiver.close();

    let mut discarded = 0;
    while receiver.try_recv().is_ok() {
        discarded += 1;
    }
    discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Observes gated tasks: each one blocks until the gate hands it a permit.
    struct Probe {
        started: AtomicUsize,
        finished: AtomicUsize,
        gate: Semaphore,
    }

    impl Probe {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
                gate: Semaphore::new(0),
            })
        }

        fn started(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }

        fn finished(&self) -> usize {
            self.finished.load(Ordering::SeqCst)
        }

        fn task(self: &Arc<Self>) -> Task {
            let probe = Arc::clone(self);
            Box::pin(async move {
                probe.started.fetch_add(1, Ordering::SeqCst);
                if let Ok(permit) = probe.gate.acquire().await {
                    permit.forget();
                }
                probe.finished.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    fn counting_task(counter: &Arc<AtomicUsize>) -> Task {
        let counter = Arc::clone(counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[test]
    fn test_new_pool_attributes() {
        let pool = WorkPool::new(CancellationToken::new(), 1024, 10);
        assert_eq!(pool.limit(), 1024);
        assert_eq!(pool.queue_bound(), 10);
        assert_eq!(pool.remaining(), 10);
        assert!(pool.percent_full().abs() < 0.001);
        assert_eq!(pool.size(), 0);
        assert!(!pool.is_running());
    }

    #[test]
    fn test_new_pool_defaults() {
        let pool = WorkPool::new(CancellationToken::new(), 0, 0);
        let cpus = num_cpus::get();
        assert_eq!(pool.limit(), cpus);
        assert_eq!(pool.queue_bound(), cpus.max(100));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_start_spawns_initial_workers() {
        let pool = WorkPool::new(CancellationToken::new(), 1024, 0);
        pool.start().await.unwrap();

        let size = pool.size();
        assert!(size > 0);
        assert_eq!(size, num_cpus::get().min(1024));
        assert!(size <= pool.limit());

        let single = WorkPool::new(CancellationToken::new(), 1, 0);
        single.start().await.unwrap();
        assert_eq!(single.size(), 1);

        pool.stop().await.unwrap();
        single.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_lifecycle_preconditions() {
        let pool = WorkPool::new(CancellationToken::new(), 2, 4);
        let counter = Arc::new(AtomicUsize::new(0));

        assert_eq!(
            pool.add(counting_task(&counter)).await,
            Err(PoolError::NotRunning)
        );
        assert_eq!(pool.stop().await, Err(PoolError::NotRunning));
        assert_eq!(pool.wait().await, Err(PoolError::NotRunning));

        pool.start().await.unwrap();
        assert_eq!(pool.start().await, Err(PoolError::AlreadyRunning));

        pool.stop().await.unwrap();
        assert_eq!(pool.stop().await, Err(PoolError::NotRunning));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wait_runs_every_task_then_restarts() {
        let pool = WorkPool::new(CancellationToken::new(), 4, 0);
        pool.start().await.unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            pool.add(counting_task(&counter)).await.unwrap();
        }
        pool.wait().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 50);

        // Wait resets the pool rather than shutting it down.
        assert!(pool.is_running());
        assert!(pool.size() > 0);
        pool.add(counting_task(&counter)).await.unwrap();
        pool.wait().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 51);

        pool.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wait_executes_each_task_exactly_once() {
        let pool = WorkPool::new(CancellationToken::new(), 3, 2);
        pool.start().await.unwrap();

        let seen = Arc::new(StdMutex::new(Vec::new()));
        for i in 0..20usize {
            let seen = Arc::clone(&seen);
            pool.add(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                seen.lock().unwrap().push(i);
            }))
            .await
            .unwrap();
        }
        pool.wait().await.unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stop_discards_queued_tasks() {
        let pool = Arc::new(WorkPool::new(CancellationToken::new(), 2, 10));
        pool.start().await.unwrap();
        let probe = Probe::new();

        let in_flight = pool.size();
        for _ in 0..in_flight {
            pool.add(probe.task()).await.unwrap();
        }
        wait_until(|| probe.started() == in_flight).await;

        // Every worker is busy, so these stay queued.
        for _ in 0..3 {
            pool.add(probe.task()).await.unwrap();
        }

        let stopper = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.stop().await })
        };
        wait_until(|| !pool.is_running()).await;
        probe.gate.close();

        stopper.await.unwrap().unwrap();
        assert_eq!(probe.started(), in_flight);
        assert_eq!(probe.finished(), in_flight);
        assert_eq!(pool.size(), 0);
        assert_eq!(pool.add(probe.task()).await, Err(PoolError::NotRunning));

        // A stopped pool can be started again.
        let counter = Arc::new(AtomicUsize::new(0));
        pool.start().await.unwrap();
        pool.add(counting_task(&counter)).await.unwrap();
        pool.wait().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(probe.started(), in_flight);
        pool.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_add_blocks_while_queue_is_full() {
        let pool = Arc::new(WorkPool::new(CancellationToken::new(), 2, 2));
        pool.start().await.unwrap();
        let probe = Probe::new();

        for _ in 0..4 {
            pool.add(probe.task()).await.unwrap();
        }
        wait_until(|| probe.started() == 2 && pool.remaining() == 0).await;
        assert_eq!(pool.size(), 2);
        assert!((pool.percent_full() - 100.0).abs() < 0.001);

        let blocked = {
            let pool = Arc::clone(&pool);
            let task = probe.task();
            tokio::spawn(async move { pool.add(task).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!blocked.is_finished());

        // Finishing one task frees a slot for the fifth.
        probe.gate.add_permits(1);
        let added = tokio::time::timeout(Duration::from_secs(5), blocked)
            .await
            .expect("add did not unblock");
        assert_eq!(added.unwrap(), Ok(()));

        probe.gate.close();
        pool.wait().await.unwrap();
        assert_eq!(probe.started(), 5);
        assert_eq!(probe.finished(), 5);
        pool.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_grows_to_limit_under_backpressure() {
        let cpus = num_cpus::get();
        let limit = cpus + 4;
        let pool = Arc::new(WorkPool::new(CancellationToken::new(), limit, 1));
        pool.start().await.unwrap();
        assert_eq!(pool.size(), cpus);
        let probe = Probe::new();

        let producer = {
            let pool = Arc::clone(&pool);
            let probe = Arc::clone(&probe);
            tokio::spawn(async move {
                for _ in 0..=limit {
                    pool.add(probe.task()).await?;
                }
                Ok::<(), PoolError>(())
            })
        };

        wait_until(|| probe.started() == limit).await;
        assert_eq!(pool.size(), limit);

        probe.gate.close();
        producer.await.unwrap().unwrap();
        pool.wait().await.unwrap();
        assert_eq!(probe.finished(), limit + 1);
        pool.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parent_cancellation_halts_workers() {
        let parent = CancellationToken::new();
        let pool = WorkPool::new(parent.clone(), 1, 10);
        pool.start().await.unwrap();
        let probe = Probe::new();

        pool.add(probe.task()).await.unwrap();
        wait_until(|| probe.started() == 1).await;
        pool.add(probe.task()).await.unwrap();
        pool.add(probe.task()).await.unwrap();

        parent.cancel();
        probe.gate.close();

        assert_eq!(pool.add(probe.task()).await, Err(PoolError::Cancelled));
        pool.stop().await.unwrap();
        assert_eq!(probe.started(), 1);
        assert_eq!(probe.finished(), 1);
    }
}
