//! # Request Queue
//! Serializes outbound requests to a rate-sensitive collaborator: strict
//! FIFO, exactly one request in flight, a randomized pause between requests
//! and an exponential backoff sized by the backlog after a failure.
//!
//! Each caller gets a handle that resolves with its own result or failure;
//! a failure is propagated, never retried inside the queue.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot;

/// Inter-request delay bounds in seconds, uniform.
pub const MIN_DELAY_SECS: f64 = 1.5;
pub const MAX_DELAY_SECS: f64 = 3.5;

type TaskFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;
type TaskFn<T> = Box<dyn FnOnce() -> TaskFuture<T> + Send>;

struct Pending<T> {
    run: TaskFn<T>,
    done: oneshot::Sender<anyhow::Result<T>>,
}

struct QueueState<T> {
    waiting: VecDeque<Pending<T>>,
    draining: bool,
}

/// Owned, shareable request queue. The FIFO and the draining flag are the
/// only mutable state, touched exclusively by `submit` and the drain loop.
pub struct RequestQueue<T> {
    state: Arc<Mutex<QueueState<T>>>,
}

impl<T> Clone for RequestQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

/// Deferred result of a submitted task.
pub struct QueueHandle<T> {
    rx: oneshot::Receiver<anyhow::Result<T>>,
}

impl<T> QueueHandle<T> {
    pub async fn wait(self) -> anyhow::Result<T> {
        match self.rx.await {
            Ok(res) => res,
            Err(_) => Err(anyhow::anyhow!("request queue dropped the task")),
        }
    }
}

impl<T: Send + 'static> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                waiting: VecDeque::new(),
                draining: false,
            })),
        }
    }

    /// Enqueue a task at the tail. Execution order equals submission order.
    /// The returned handle resolves with this task's own outcome.
    pub fn submit<F, Fut>(&self, task: F) -> QueueHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let pending = Pending {
            run: Box::new(move || Box::pin(task())),
            done: tx,
        };

        let start_drain = {
            let mut st = self.state.lock().expect("queue mutex poisoned");
            st.waiting.push_back(pending);
            if st.draining {
                false
            } else {
                st.draining = true;
                true
            }
        };

        // A submit during an active drain only appends; the flag guarantees
        // a second drain never starts.
        if start_drain {
            let queue = self.clone();
            tokio::spawn(async move { queue.drain().await });
        }

        QueueHandle { rx }
    }

    /// Number of tasks still waiting (diagnostics only).
    pub fn backlog(&self) -> usize {
        self.state.lock().expect("queue mutex poisoned").waiting.len()
    }

    async fn drain(&self) {
        loop {
            let pending = {
                let mut st = self.state.lock().expect("queue mutex poisoned");
                match st.waiting.pop_front() {
                    Some(p) => p,
                    None => {
                        st.draining = false;
                        return;
                    }
                }
            };

            let result = (pending.run)().await;
            let failed = result.is_err();
            // The caller may have gone away; the schedule is unaffected.
            let _ = pending.done.send(result);

            if failed {
                // Backoff grows with the backlog; the request that just
                // failed still counts toward it.
                let backlog = {
                    let st = self.state.lock().expect("queue mutex poisoned");
                    st.waiting.len() as u32 + 1
                };
                let secs = 2u64.saturating_pow(backlog);
                metrics::counter!("queue_backoffs_total").increment(1);
                tracing::warn!(
                    backlog,
                    backoff_secs = secs,
                    "queued request failed, backing off"
                );
                tokio::time::sleep(Duration::from_secs(secs)).await;
            }

            tokio::time::sleep(random_delay()).await;
        }
    }
}

impl<T: Send + 'static> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn random_delay() -> Duration {
    let secs = rand::rng().random_range(MIN_DELAY_SECS..MAX_DELAY_SECS);
    Duration::from_secs_f64(secs)
}
