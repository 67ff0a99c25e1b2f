use async_trait::async_trait;
use model::Task;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::debug;

/// At-least-once task delivery.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: Task) -> anyhow::Result<()>;
    async fn enqueue_after(&self, task: Task, delay: Duration) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub task: Task,
    /// Zero on first delivery.
    pub attempt: u32,
}

impl Envelope {
    pub fn new(task: Task) -> Self {
        Self { task, attempt: 0 }
    }

    pub fn retry(self) -> Self {
        Self {
            task: self.task,
            attempt: self.attempt + 1,
        }
    }
}

struct Shared {
    tx: mpsc::UnboundedSender<Envelope>,
    /// Queued + delayed + in-flight envelopes.
    outstanding: AtomicUsize,
    idle: Notify,
}

impl Shared {
    fn send(&self, envelope: Envelope) {
        if self.tx.send(envelope).is_err() {
            // receiver is owned by the queue itself, so this only happens on drop
            self.finish();
        }
    }

    fn finish(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// In-process queue over a tokio channel. Delayed delivery is a spawned sleep.
pub struct LocalQueue {
    shared: Arc<Shared>,
    rx: Mutex<mpsc::UnboundedReceiver<Envelope>>,
}

impl Default for LocalQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                tx,
                outstanding: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
            rx: Mutex::new(rx),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    /// Re-delivers an envelope as-is after `delay`.
    pub fn redeliver(&self, envelope: Envelope, delay: Duration) {
        self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
        if delay.is_zero() {
            self.shared.send(envelope);
            return;
        }
        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.send(envelope);
        });
    }

    /// Marks one received envelope as handled.
    pub fn ack(&self) {
        self.shared.finish();
    }

    /// Next envelope, waiting as long as it takes.
    pub async fn recv(&self) -> Option<Envelope> {
        self.rx.lock().await.recv().await
    }

    /// Next envelope, or `None` once nothing is queued, delayed or in flight.
    pub async fn recv_until_idle(&self) -> Option<Envelope> {
        let mut rx = self.rx.lock().await;
        loop {
            let idle = self.shared.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if self.outstanding() == 0 {
                return None;
            }
            if let Ok(envelope) = rx.try_recv() {
                return Some(envelope);
            }
            tokio::select! {
                envelope = rx.recv() => return envelope,
                _ = &mut idle => continue,
            }
        }
    }
}

#[async_trait]
impl TaskQueue for LocalQueue {
    async fn enqueue(&self, task: Task) -> anyhow::Result<()> {
        debug!("enqueue {}", task.name());
        self.redeliver(Envelope::new(task), Duration::ZERO);
        Ok(())
    }

    async fn enqueue_after(&self, task: Task, delay: Duration) -> anyhow::Result<()> {
        debug!("enqueue {} after {:?}", task.name(), delay);
        self.redeliver(Envelope::new(task), delay);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(id: &str) -> Task {
        Task::ComputeScores {
            developer_id: id.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_idle_after_ack() {
        let queue = LocalQueue::new();
        queue.enqueue(scores("a")).await.unwrap();
        let env = queue.recv_until_idle().await.unwrap();
        assert_eq!(env.attempt, 0);
        assert_eq!(queue.outstanding(), 1);
        queue.ack();
        assert!(queue.recv_until_idle().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_delivery_keeps_queue_busy() {
        let queue = LocalQueue::new();
        queue
            .enqueue_after(scores("a"), Duration::from_secs(5))
            .await
            .unwrap();
        let env = queue.recv_until_idle().await.unwrap();
        assert_eq!(env.task, scores("a"));
        queue.redeliver(env.retry(), Duration::from_secs(1));
        queue.ack();
        let again = queue.recv_until_idle().await.unwrap();
        assert_eq!(again.attempt, 1);
        queue.ack();
        assert!(queue.recv_until_idle().await.is_none());
    }
}
