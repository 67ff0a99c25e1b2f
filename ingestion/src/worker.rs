use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::IngestionConfig;
use crate::error::TaskOutcome;
use crate::queue::{Envelope, LocalQueue};
use crate::tasks::Pipeline;

/// Drains the queue through the pipeline with bounded concurrency, turning
/// handler outcomes and errors into re-deliveries.
pub struct Worker {
    pipeline: Arc<Pipeline>,
    queue: Arc<LocalQueue>,
    concurrency: usize,
    max_attempts: u32,
}

impl Worker {
    pub fn new(pipeline: Arc<Pipeline>, queue: Arc<LocalQueue>, config: &IngestionConfig) -> Self {
        Self {
            pipeline,
            queue,
            concurrency: config.worker_concurrency.max(1),
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Runs until the queue is closed.
    pub async fn run(&self) {
        let sem = Arc::new(Semaphore::new(self.concurrency));
        info!("worker started with concurrency {}", self.concurrency);
        while let Some(envelope) = self.queue.recv().await {
            let Ok(permit) = sem.clone().acquire_owned().await else {
                break;
            };
            let (pipeline, queue, max_attempts) =
                (self.pipeline.clone(), self.queue.clone(), self.max_attempts);
            tokio::spawn(async move {
                let _permit = permit;
                process(&pipeline, &queue, envelope, max_attempts).await;
            });
        }
    }

    /// Runs until nothing is queued, delayed or in flight.
    pub async fn run_until_idle(&self) {
        let sem = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::new();
        while let Some(envelope) = self.queue.recv_until_idle().await {
            let Ok(permit) = sem.clone().acquire_owned().await else {
                break;
            };
            let (pipeline, queue, max_attempts) =
                (self.pipeline.clone(), self.queue.clone(), self.max_attempts);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                process(&pipeline, &queue, envelope, max_attempts).await;
            }));
        }
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                error!("worker task panicked: {}", e);
            }
        }
    }
}

async fn process(pipeline: &Pipeline, queue: &LocalQueue, envelope: Envelope, max_attempts: u32) {
    let span = info_span!(
        "task",
        kind = envelope.task.name(),
        developer = %envelope.task.developer_key(),
        attempt = envelope.attempt
    );
    async {
        let last_attempt = envelope.attempt + 1 >= max_attempts;
        match pipeline.handle(&envelope.task).await {
            Ok(TaskOutcome::Done) => debug!("done"),
            Ok(TaskOutcome::Skipped(reason)) => info!("skipped: {}", reason),
            Ok(TaskOutcome::Requeued(delay)) => {
                queue.redeliver(Envelope::new(envelope.task.clone()), delay);
            }
            Ok(TaskOutcome::Deferred(delay)) => {
                if last_attempt {
                    warn!("still not ready after {} attempts, dropping", max_attempts);
                } else {
                    queue.redeliver(envelope.clone().retry(), delay);
                }
            }
            Err(e) => match e.retry_delay(envelope.attempt, Utc::now()) {
                Some(delay) if !last_attempt => {
                    warn!("retrying in {:?}: {}", delay, e);
                    queue.redeliver(envelope.clone().retry(), delay);
                }
                Some(_) => error!("dropping after {} attempts: {}", max_attempts, e),
                None => warn!("dropping, not retryable: {}", e),
            },
        }
        queue.ack();
    }
    .instrument(span)
    .await
}
