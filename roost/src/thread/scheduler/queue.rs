use std::fmt;
use std::sync::Arc;

use crossbeam_queue::SegQueue;
use tokio::sync::Notify;

use crate::thread::scheduler::Runnable;

/// Queue of actors that have work ready.
///
/// Workers pull from the head; an actor is pushed at most once at a time
/// because pushing requires winning its mailbox's `scheduled` flag.
///
/// # Thread Safety
/// - Uses a lock-free queue internally (SegQueue)
/// - Uses Notify to wake one idle worker per push
pub(crate) struct SchedulingQueue {
    queue: SegQueue<Arc<dyn Runnable>>,
    notify: Notify,
}

impl fmt::Debug for SchedulingQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulingQueue")
            .field("len", &self.queue.len())
            .finish()
    }
}

impl SchedulingQueue {
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
            notify: Notify::new(),
        }
    }

    /// Pushes a ready actor and wakes one waiting worker.
    ///
    /// If no worker is waiting, the wake-up is kept as a permit for the next
    /// worker that goes idle.
    pub fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.push(task);
        self.notify.notify_one();
    }

    pub fn try_pop(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.pop()
    }

    /// Waits until a ready actor is available and returns it.
    pub async fn pop(&self) -> Arc<dyn Runnable> {
        loop {
            if let Some(task) = self.try_pop() {
                // Notify keeps a single permit, so pass the wake-up on while
                // work remains.
                if !self.is_empty() {
                    self.notify.notify_one();
                }
                return task;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_api::{ActorPath, BoxedFuture};
    use std::time::Duration;

    struct Named(ActorPath);

    impl Runnable for Named {
        fn run(self: Arc<Self>, _throughput: usize) -> BoxedFuture<'static, ()> {
            Box::pin(async {})
        }

        fn path(&self) -> &ActorPath {
            &self.0
        }
    }

    fn task(name: &str) -> Arc<dyn Runnable> {
        Arc::new(Named(ActorPath::top_level("test", name)))
    }

    #[test]
    fn pops_in_push_order() {
        let queue = SchedulingQueue::new();
        queue.push(task("a"));
        queue.push(task("b"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_pop().map(|t| t.path().name().to_string()), Some("a".to_string()));
        assert_eq!(queue.try_pop().map(|t| t.path().name().to_string()), Some("b".to_string()));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn pop_waits_for_push() {
        let queue = Arc::new(SchedulingQueue::new());
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await.path().name().to_string() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(task("late"));
        let name = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("pop should wake up")
            .unwrap();
        assert_eq!(name, "late");
    }
}
