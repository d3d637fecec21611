//! Work queue between the webhook handler and the pipeline
//!
//! The webhook handler acknowledges immediately and enqueues; a single worker
//! task drains the bounded queue and runs each envelope on its own task,
//! limited by a semaphore. Shutdown closes the queue, processes what is still
//! buffered and waits for in-flight envelopes.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use crate::domain::envelope::InboundEnvelope;
use crate::pipeline::EnvelopeProcessor;

/// Producer side of the work queue
#[derive(Clone)]
pub struct PipelineQueue {
    tx: mpsc::Sender<InboundEnvelope>,
}

impl PipelineQueue {
    /// Enqueue without waiting. Returns false when the envelope was dropped.
    pub fn enqueue(&self, envelope: InboundEnvelope) -> bool {
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(TrySendError::Full(envelope)) => {
                tracing::warn!(
                    provider_message_id = ?envelope.provider_message_id,
                    "Pipeline queue full; dropping message"
                );
                false
            }
            Err(TrySendError::Closed(envelope)) => {
                tracing::warn!(
                    provider_message_id = ?envelope.provider_message_id,
                    "Pipeline queue closed; dropping message"
                );
                false
            }
        }
    }
}

/// Handle to the running worker
pub struct PipelineWorker {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PipelineWorker {
    /// Stop accepting work, drain the queue and wait for in-flight envelopes
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Pipeline worker terminated abnormally");
        }
    }
}

/// Start the worker; returns the queue to hand to the webhook handler
pub fn spawn_pipeline_worker(
    processor: Arc<dyn EnvelopeProcessor>,
    capacity: usize,
    concurrency: usize,
) -> (PipelineQueue, PipelineWorker) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handle = tokio::spawn(run_worker(rx, processor, semaphore, shutdown_rx));

    tracing::info!(capacity, concurrency, "Pipeline worker started");

    (PipelineQueue { tx }, PipelineWorker { shutdown_tx, handle })
}

async fn run_worker(
    mut rx: mpsc::Receiver<InboundEnvelope>,
    processor: Arc<dyn EnvelopeProcessor>,
    semaphore: Arc<Semaphore>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
            received = rx.recv() => match received {
                Some(envelope) => spawn_one(&mut tasks, &processor, &semaphore, envelope).await,
                None => break,
            },
        }
    }

    rx.close();
    let mut drained = 0usize;
    while let Some(envelope) = rx.recv().await {
        spawn_one(&mut tasks, &processor, &semaphore, envelope).await;
        drained += 1;
    }

    tracing::info!(
        drained,
        in_flight = tasks.len(),
        "Pipeline worker shutting down"
    );

    while let Some(joined) = tasks.join_next().await {
        log_join(joined);
    }

    tracing::info!("Pipeline worker stopped");
}

async fn spawn_one(
    tasks: &mut JoinSet<()>,
    processor: &Arc<dyn EnvelopeProcessor>,
    semaphore: &Arc<Semaphore>,
    envelope: InboundEnvelope,
) {
    let permit = match semaphore.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            tracing::error!("Pipeline semaphore closed; dropping message");
            return;
        }
    };

    let processor = processor.clone();
    tasks.spawn(async move {
        let _permit = permit;
        processor.process(envelope).await;
    });
}

#[mutants::skip] // Logging only, no observable effect
fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Pipeline task panicked");
    }
}
