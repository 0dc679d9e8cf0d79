//! Dispatchers
//!
//! A dispatcher runs a processing task somewhere other than the caller's
//! stack. The cell only needs `dispatch` to return without waiting for the
//! task; where and when the task runs is up to the implementation.

use crate::error::DispatchError;
use actor_config::{DispatcherKind, DispatcherSettings};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::runtime::Handle;
use tracing::trace;

/// A unit of work handed to a dispatcher
pub type Runnable = Box<dyn FnOnce() + Send + 'static>;

/// Executes processing tasks without blocking the submitter
pub trait Dispatcher: Send + Sync + fmt::Debug {
    /// Submit a task for asynchronous execution
    ///
    /// A refused task must be dropped before this returns an error. A task
    /// accepted but later discarded without running must also be dropped,
    /// since dropping it is what releases the actor it belongs to.
    fn dispatch(&self, task: Runnable) -> Result<(), DispatchError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Build the dispatcher named by the runtime configuration
///
/// Tokio variants bind to the runtime of the calling context.
pub fn from_settings(settings: &DispatcherSettings) -> crate::Result<Arc<dyn Dispatcher>> {
    let dispatcher: Arc<dyn Dispatcher> = match settings.kind {
        DispatcherKind::Tokio => Arc::new(TokioDispatcher::current()?),
        DispatcherKind::TokioBlocking => Arc::new(TokioDispatcher::current()?.into_blocking()),
        DispatcherKind::Thread => Arc::new(ThreadDispatcher::new(&settings.thread_name_prefix)),
    };
    Ok(dispatcher)
}

/// Runs each task on a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioDispatcher {
    handle: Handle,
    blocking: bool,
}

impl TokioDispatcher {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            blocking: false,
        }
    }

    /// Bind to the runtime driving the current thread
    pub fn current() -> crate::Result<Self> {
        Handle::try_current().map(Self::new).map_err(|e| {
            crate::ActorError::configuration(
                format!("tokio dispatcher requires a running runtime: {}", e),
                Some("dispatcher.kind"),
            )
        })
    }

    /// Run tasks on the blocking pool instead of the async workers
    pub fn into_blocking(mut self) -> Self {
        self.blocking = true;
        self
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, task: Runnable) -> Result<(), DispatchError> {
        let dropped = Arc::new(AtomicBool::new(false));
        let task = Tracked {
            task: Some(task),
            dropped: Arc::clone(&dropped),
        };
        if self.blocking {
            drop(self.handle.spawn_blocking(move || task.run()));
        } else {
            drop(self.handle.spawn(async move { task.run() }));
        }

        // A shut down runtime drops the task inside spawn
        if dropped.load(Ordering::SeqCst) {
            return Err(DispatchError::Shutdown {
                name: self.name().to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        if self.blocking {
            "tokio-blocking"
        } else {
            "tokio"
        }
    }
}

/// Raises `dropped` if the wrapped task is discarded without running
struct Tracked {
    task: Option<Runnable>,
    dropped: Arc<AtomicBool>,
}

impl Tracked {
    fn run(mut self) {
        if let Some(task) = self.task.take() {
            task();
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }
}

/// Runs each task on its own short-lived OS thread
#[derive(Debug)]
pub struct ThreadDispatcher {
    name_prefix: String,
    spawned: AtomicU64,
}

impl ThreadDispatcher {
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            spawned: AtomicU64::new(0),
        }
    }

    /// Threads started so far
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }
}

impl Default for ThreadDispatcher {
    fn default() -> Self {
        Self::new(actor_config::defaults::dispatcher::THREAD_NAME_PREFIX)
    }
}

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&self, task: Runnable) -> Result<(), DispatchError> {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        thread::Builder::new()
            .name(format!("{}-{}", self.name_prefix, n))
            .spawn(task)
            .map(drop)
            .map_err(|source| DispatchError::Spawn { source })
    }

    fn name(&self) -> &str {
        "thread"
    }
}

/// Queues tasks until the owner runs them
///
/// Useful for driving cells from an external loop and for deterministic
/// tests: nothing runs until `run_next` or `run_until_idle` is called.
#[derive(Default)]
pub struct ManualDispatcher {
    queue: Mutex<VecDeque<Runnable>>,
    closed: AtomicBool,
}

impl ManualDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks submitted but not yet run
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the oldest queued task. Returns false if none was queued.
    pub fn run_next(&self) -> bool {
        // Release the lock before running: tasks may dispatch follow-ups
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                trace!("Running queued task");
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks, including ones they enqueue, until the queue is empty
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Refuse further tasks and drop the ones still queued. Returns how
    /// many queued tasks were dropped.
    pub fn close(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);
        // Collected first so the tasks drop after the lock is released
        let discarded: Vec<Runnable> = self.queue.lock().drain(..).collect();
        if !discarded.is_empty() {
            trace!(count = discarded.len(), "Dropping queued tasks");
        }
        discarded.len()
    }

    /// Accept tasks again after `close`
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for ManualDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualDispatcher")
            .field("pending", &self.pending())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl Dispatcher for ManualDispatcher {
    fn dispatch(&self, task: Runnable) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::Shutdown {
                name: self.name().to_string(),
            });
        }
        self.queue.lock().push_back(task);
        Ok(())
    }

    fn name(&self) -> &str {
        "manual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_manual_dispatcher_runs_in_order() {
        let dispatcher = Arc::new(ManualDispatcher::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = Arc::clone(&log);
            dispatcher
                .dispatch(Box::new(move || log.lock().push(i)))
                .unwrap();
        }

        assert_eq!(dispatcher.pending(), 3);
        assert!(log.lock().is_empty());
        assert_eq!(dispatcher.run_until_idle(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert!(!dispatcher.run_next());
    }

    #[test]
    fn test_manual_dispatcher_runs_follow_up_tasks() {
        let dispatcher = Arc::new(ManualDispatcher::new());
        let count = Arc::new(AtomicUsize::new(0));

        let inner = Arc::clone(&dispatcher);
        let counter = Arc::clone(&count);
        dispatcher
            .dispatch(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let counter = Arc::clone(&counter);
                inner
                    .dispatch(Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
            }))
            .unwrap();

        assert_eq!(dispatcher.run_until_idle(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_closed_manual_dispatcher_refuses_tasks() {
        let dispatcher = ManualDispatcher::new();
        dispatcher.close();
        let err = dispatcher.dispatch(Box::new(|| {})).unwrap_err();
        assert!(matches!(err, DispatchError::Shutdown { .. }));
        dispatcher.reopen();
        assert!(dispatcher.dispatch(Box::new(|| {})).is_ok());
    }

    #[test]
    fn test_close_drops_queued_tasks() {
        let dispatcher = ManualDispatcher::new();
        let witness = Arc::new(());
        let held = Arc::clone(&witness);
        dispatcher.dispatch(Box::new(move || drop(held))).unwrap();
        assert_eq!(Arc::strong_count(&witness), 2);

        assert_eq!(dispatcher.close(), 1);
        assert_eq!(Arc::strong_count(&witness), 1);
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(dispatcher.close(), 0);
    }

    #[test]
    fn test_tokio_dispatcher_reports_shut_down_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        for dispatcher in [
            TokioDispatcher::new(handle.clone()),
            TokioDispatcher::new(handle).into_blocking(),
        ] {
            let ran = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&ran);
            let err = dispatcher
                .dispatch(Box::new(move || flag.store(true, Ordering::SeqCst)))
                .unwrap_err();

            match err {
                DispatchError::Shutdown { name } => assert_eq!(name, dispatcher.name()),
                other => panic!("expected Shutdown, got {:?}", other),
            }
            assert!(!ran.load(Ordering::SeqCst));
        }
    }

    #[test]
    fn test_thread_dispatcher_names_threads() {
        let dispatcher = ThreadDispatcher::new("drain-test");
        let (tx, rx) = mpsc::channel();
        dispatcher
            .dispatch(Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send(name).unwrap();
            }))
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("drain-test-0"));
        assert_eq!(dispatcher.spawned(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tokio_dispatcher_runs_task() {
        let dispatcher = TokioDispatcher::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        dispatcher
            .dispatch(Box::new(move || {
                let _ = tx.send(42);
            }))
            .unwrap();
        assert_eq!(rx.await.unwrap(), 42);
        assert_eq!(dispatcher.name(), "tokio");
        assert_eq!(dispatcher.into_blocking().name(), "tokio-blocking");
    }

    #[test]
    fn test_tokio_dispatcher_needs_runtime() {
        let err = TokioDispatcher::current().unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
