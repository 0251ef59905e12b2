//! # Dispatcher
//!
//! A fixed pool of worker tasks pulling ready actors from a shared
//! [`SchedulingQueue`].
//!
//! ## Guarantees
//! - Per-actor serialization: an actor is only ever in the queue once, because
//!   getting there requires winning its mailbox's `scheduled` flag.
//! - Cross-actor parallelism: different actors run on different workers.
//! - Fairness: a run handles at most `throughput` user messages before the
//!   actor goes to the back of the queue.
//!
//! ## Worker Behavior
//! 1. Waits for a ready actor (or the shutdown signal)
//! 2. Runs one batch for it
//! 3. Catches panics that escape the actor so the worker survives

pub(crate) mod queue;

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use roost_api::{ActorPath, BoxedFuture};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::thread::scheduler::queue::SchedulingQueue;
use crate::{log_error, log_scheduler};

/// Something the dispatcher can run: in practice an actor cell with work
/// pending.
pub(crate) trait Runnable: Send + Sync {
    /// Process one batch of at most `throughput` user messages.
    fn run(self: Arc<Self>, throughput: usize) -> BoxedFuture<'static, ()>;

    fn path(&self) -> &ActorPath;
}

/// Fixed-size worker pool.
pub(crate) struct Dispatcher {
    worker_count: usize,
    throughput: usize,
    queue: Arc<SchedulingQueue>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    is_shutting_down: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("worker_count", &self.worker_count)
            .field("throughput", &self.throughput)
            .field("queued", &self.queue.len())
            .field("is_shutting_down", &self.is_shutting_down())
            .finish()
    }
}

impl Dispatcher {
    /// Spawn `worker_count` workers on `handle`.
    pub fn start(worker_count: usize, throughput: usize, handle: &Handle) -> Self {
        let queue = Arc::new(SchedulingQueue::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let workers = (0..worker_count)
            .map(|worker_id| {
                handle.spawn(worker_loop(
                    worker_id,
                    queue.clone(),
                    shutdown_rx.clone(),
                    throughput,
                ))
            })
            .collect();

        log_scheduler!("dispatcher", "started", workers = worker_count, throughput = throughput);

        Self {
            worker_count,
            throughput,
            queue,
            workers: Mutex::new(workers),
            is_shutting_down: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Queue a ready actor. Ignored once shutdown has begun.
    pub fn dispatch(&self, task: Arc<dyn Runnable>) {
        if self.is_shutting_down() {
            log_scheduler!("dispatcher", "dispatch_after_shutdown", actor = %task.path());
            return;
        }
        self.queue.push(task);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stop every worker.
    ///
    /// Workers finish the batch they are running; any still busy after
    /// `grace` are aborted.
    pub async fn shutdown(&self, grace: Duration) {
        if self.is_shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown_tx.send_replace(true);

        let mut workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let joined = tokio::time::timeout(grace, async {
            for worker in workers.iter_mut() {
                let _ = worker.await;
            }
        })
        .await;

        if joined.is_err() {
            for worker in &workers {
                worker.abort();
            }
            log_scheduler!("dispatcher", "workers_aborted", grace_ms = grace.as_millis() as u64);
        }
        log_scheduler!("dispatcher", "stopped", abandoned = self.queue.len());
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<SchedulingQueue>,
    mut shutdown: watch::Receiver<bool>,
    throughput: usize,
) {
    log_scheduler!("dispatcher", "worker_started", worker = worker_id);

    loop {
        if *shutdown.borrow() {
            break;
        }
        let task = tokio::select! {
            task = queue.pop() => task,
            _ = shutdown.changed() => break,
        };

        let path = task.path().clone();
        if let Err(payload) = AssertUnwindSafe(task.run(throughput)).catch_unwind().await {
            log_error!(panic_message(payload.as_ref()), worker = worker_id, actor = %path);
        }
    }

    log_scheduler!("dispatcher", "worker_stopped", worker = worker_id);
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counter {
        path: ActorPath,
        runs: Arc<AtomicUsize>,
    }

    impl Runnable for Counter {
        fn run(self: Arc<Self>, _throughput: usize) -> BoxedFuture<'static, ()> {
            Box::pin(async move {
                self.runs.fetch_add(1, Ordering::SeqCst);
            })
        }

        fn path(&self) -> &ActorPath {
            &self.path
        }
    }

    struct Panics(ActorPath);

    impl Runnable for Panics {
        fn run(self: Arc<Self>, _throughput: usize) -> BoxedFuture<'static, ()> {
            Box::pin(async move { panic!("boom") })
        }

        fn path(&self) -> &ActorPath {
            &self.0
        }
    }

    async fn wait_for_runs(runs: &AtomicUsize, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while runs.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("tasks should run");
    }

    #[tokio::test]
    async fn runs_dispatched_tasks() {
        let dispatcher = Dispatcher::start(2, 10, &Handle::current());
        let runs = Arc::new(AtomicUsize::new(0));
        for i in 0..5 {
            dispatcher.dispatch(Arc::new(Counter {
                path: ActorPath::top_level("test", &format!("c{i}")),
                runs: runs.clone(),
            }));
        }
        wait_for_runs(&runs, 5).await;
        dispatcher.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn worker_survives_panicking_task() {
        let dispatcher = Dispatcher::start(1, 10, &Handle::current());
        let runs = Arc::new(AtomicUsize::new(0));
        dispatcher.dispatch(Arc::new(Panics(ActorPath::top_level("test", "panics"))));
        dispatcher.dispatch(Arc::new(Counter {
            path: ActorPath::top_level("test", "after"),
            runs: runs.clone(),
        }));
        wait_for_runs(&runs, 1).await;
        dispatcher.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn dispatch_after_shutdown_is_ignored() {
        let dispatcher = Dispatcher::start(1, 10, &Handle::current());
        dispatcher.shutdown(Duration::from_secs(1)).await;
        assert!(dispatcher.is_shutting_down());

        let runs = Arc::new(AtomicUsize::new(0));
        dispatcher.dispatch(Arc::new(Counter {
            path: ActorPath::top_level("test", "late"),
            runs: runs.clone(),
        }));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panic_message_reads_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
