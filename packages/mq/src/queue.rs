use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use common::mq::JobMessage;
use common::retry::RetryAttempt;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{JobQueueBuilder, QueueSpec};
use crate::error::{JobError, MqError};
use crate::events::QueueEvent;
use crate::handler::{HandlerError, JobHandler};
use crate::models::{
    JobContext, JobCounts, JobHandle, JobId, JobOptions, JobOutcome, JobRecord, JobState,
};

const EVENT_CAPACITY: usize = 1024;

struct JobEntry<M> {
    record: JobRecord<M>,
    options: JobOptions,
    done: Option<oneshot::Sender<JobOutcome>>,
    finished: Option<Instant>,
}

struct Inner<M> {
    specs: Vec<QueueSpec>,
    senders: HashMap<&'static str, mpsc::Sender<JobId>>,
    receivers: StdMutex<Option<HashMap<&'static str, mpsc::Receiver<JobId>>>>,
    jobs: Mutex<HashMap<JobId, JobEntry<M>>>,
    events: broadcast::Sender<QueueEvent>,
    default_options: JobOptions,
    cancel: CancellationToken,
}

/// In-process job queue: one bounded channel per named queue, each drained
/// by a fixed pool of workers.
///
/// Jobs stay in the queue's table after they finish so they can be inspected,
/// until [`JobQueue::clean`] prunes them.
pub struct JobQueue<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for JobQueue<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: JobMessage> JobQueue<M> {
    pub fn builder() -> JobQueueBuilder {
        JobQueueBuilder::default()
    }

    pub(crate) fn from_builder(
        specs: Vec<QueueSpec>,
        channel_capacity: usize,
        default_options: JobOptions,
    ) -> Self {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for spec in &specs {
            let (tx, rx) = mpsc::channel(channel_capacity);
            senders.insert(spec.name, tx);
            receivers.insert(spec.name, rx);
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                specs,
                senders,
                receivers: StdMutex::new(Some(receivers)),
                jobs: Mutex::new(HashMap::new()),
                events,
                default_options,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Spawns the worker pools. Jobs enqueued before this call wait in their channel.
    pub fn start(&self, handler: Arc<dyn JobHandler<M>>) -> Result<Vec<JoinHandle<()>>, MqError> {
        let receivers = self
            .inner
            .receivers
            .lock()
            .map_err(|e| MqError::Internal(e.to_string()))?
            .take()
            .ok_or(MqError::AlreadyStarted)?;

        let mut handles = Vec::new();
        for (name, rx) in receivers {
            let concurrency = self
                .inner
                .specs
                .iter()
                .find(|s| s.name == name)
                .map_or(1, |s| s.concurrency);
            let rx = Arc::new(Mutex::new(rx));
            for worker in 0..concurrency {
                let inner = Arc::clone(&self.inner);
                let rx = Arc::clone(&rx);
                let handler = Arc::clone(&handler);
                handles.push(tokio::spawn(async move {
                    inner.worker_loop(name, worker, rx, handler).await;
                }));
            }
            info!(queue = name, concurrency, "Queue workers started");
        }
        Ok(handles)
    }

    pub async fn enqueue(&self, payload: M) -> Result<JobHandle, MqError> {
        let options = self.inner.default_options;
        self.enqueue_with(payload, options).await
    }

    pub async fn enqueue_with(&self, payload: M, options: JobOptions) -> Result<JobHandle, MqError> {
        if self.inner.cancel.is_cancelled() {
            return Err(MqError::Closed);
        }
        let queue = payload.queue_name();
        let sender = self
            .inner
            .senders
            .get(queue)
            .ok_or_else(|| MqError::UnknownQueue(queue.to_string()))?;

        let id = Uuid::now_v7();
        let (tx, rx) = oneshot::channel();
        let options = JobOptions {
            max_attempts: options.max_attempts.max(1),
            ..options
        };
        let entry = JobEntry {
            record: JobRecord {
                id,
                queue,
                payload,
                state: JobState::Waiting,
                attempts_made: 0,
                max_attempts: options.max_attempts,
                history: Vec::new(),
                result: None,
                created_at: Utc::now(),
                finished_at: None,
            },
            options,
            done: Some(tx),
            finished: None,
        };
        self.inner.jobs.lock().await.insert(id, entry);

        if sender.send(id).await.is_err() {
            self.inner.jobs.lock().await.remove(&id);
            return Err(MqError::Closed);
        }
        self.inner.emit(QueueEvent::Enqueued { queue, job_id: id });
        Ok(JobHandle::new(id, queue, rx))
    }

    pub async fn get(&self, id: JobId) -> Option<JobRecord<M>> {
        self.inner.jobs.lock().await.get(&id).map(|e| e.record.clone())
    }

    /// Marks every waiting or delayed job of `tenant_id` as removed. Active
    /// jobs are left to finish. Returns the number removed.
    pub async fn remove_pending_for_tenant(&self, tenant_id: &str) -> usize {
        let mut removed = Vec::new();
        {
            let mut jobs = self.inner.jobs.lock().await;
            let now = Instant::now();
            for entry in jobs.values_mut() {
                if entry.record.state.is_pending()
                    && entry.record.payload.tenant_id() == Some(tenant_id)
                {
                    entry.record.state = JobState::Removed;
                    entry.record.finished_at = Some(Utc::now());
                    entry.finished = Some(now);
                    if let Some(done) = entry.done.take() {
                        let _ = done.send(Err(JobError::Removed));
                    }
                    removed.push((entry.record.queue, entry.record.id));
                }
            }
        }
        for &(queue, job_id) in &removed {
            self.inner.emit(QueueEvent::Removed { queue, job_id });
        }
        removed.len()
    }

    /// Prunes jobs in the terminal `state` that finished more than `grace` ago.
    pub async fn clean(&self, grace: Duration, state: JobState) -> usize {
        if !state.is_terminal() {
            return 0;
        }
        let now = Instant::now();
        let mut jobs = self.inner.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, entry| {
            let expired = entry.record.state == state
                && entry
                    .finished
                    .is_some_and(|at| now.saturating_duration_since(at) >= grace);
            !expired
        });
        before - jobs.len()
    }

    pub async fn counts(&self, queue: &str) -> Result<JobCounts, MqError> {
        if !self.inner.senders.contains_key(queue) {
            return Err(MqError::UnknownQueue(queue.to_string()));
        }
        let jobs = self.inner.jobs.lock().await;
        let mut counts = JobCounts::default();
        for entry in jobs.values().filter(|e| e.record.queue == queue) {
            counts.add(entry.record.state);
        }
        Ok(counts)
    }

    /// Counts per queue name, in registration order.
    pub async fn all_counts(&self) -> Vec<(&'static str, JobCounts)> {
        let jobs = self.inner.jobs.lock().await;
        self.inner
            .specs
            .iter()
            .map(|spec| {
                let mut counts = JobCounts::default();
                for entry in jobs.values().filter(|e| e.record.queue == spec.name) {
                    counts.add(entry.record.state);
                }
                (spec.name, counts)
            })
            .collect()
    }

    /// Counts across all queues for one tenant's jobs.
    pub async fn counts_for_tenant(&self, tenant_id: &str) -> JobCounts {
        let jobs = self.inner.jobs.lock().await;
        let mut counts = JobCounts::default();
        for entry in jobs
            .values()
            .filter(|e| e.record.payload.tenant_id() == Some(tenant_id))
        {
            counts.add(entry.record.state);
        }
        counts
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    /// Stops workers and delayed retries. Further enqueues fail with `Closed`.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

impl<M: JobMessage> Inner<M> {
    fn emit(&self, event: QueueEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn worker_loop(
        self: Arc<Self>,
        queue: &'static str,
        worker: usize,
        rx: Arc<Mutex<mpsc::Receiver<JobId>>>,
        handler: Arc<dyn JobHandler<M>>,
    ) {
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => break,
                id = async { rx.lock().await.recv().await } => id,
            };
            let Some(id) = next else { break };
            self.run_job(queue, id, &handler).await;
        }
        debug!(queue, worker, "Queue worker stopped");
    }

    async fn run_job(self: &Arc<Self>, queue: &'static str, id: JobId, handler: &Arc<dyn JobHandler<M>>) {
        let (payload, ctx) = {
            let mut jobs = self.jobs.lock().await;
            let Some(entry) = jobs.get_mut(&id) else {
                return;
            };
            // Removed while waiting in the channel.
            if entry.record.state != JobState::Waiting {
                return;
            }
            entry.record.state = JobState::Active;
            entry.record.attempts_made += 1;
            let ctx = JobContext {
                job_id: id,
                queue,
                attempt: entry.record.attempts_made,
                max_attempts: entry.record.max_attempts,
            };
            (entry.record.payload.clone(), ctx)
        };
        self.emit(QueueEvent::Active {
            queue,
            job_id: id,
            attempt: ctx.attempt,
        });

        // A panicking handler fails the attempt instead of killing the worker.
        let task_handler = Arc::clone(handler);
        let task_ctx = ctx.clone();
        let result = tokio::spawn(async move { task_handler.handle(task_ctx, payload).await })
            .await
            .unwrap_or_else(|e| Err(HandlerError::Transient(format!("handler panicked: {e}"))));

        match result {
            Ok(value) => self.complete(id, queue, value).await,
            Err(err) if err.is_permanent() || ctx.is_last_attempt() => {
                self.fail(id, queue, ctx.attempt, err.to_string()).await
            }
            Err(err) => self.schedule_retry(id, queue, ctx.attempt, err.to_string()).await,
        }
    }

    async fn complete(&self, id: JobId, queue: &'static str, value: serde_json::Value) {
        {
            let mut jobs = self.jobs.lock().await;
            let Some(entry) = jobs.get_mut(&id) else {
                return;
            };
            entry.record.state = JobState::Completed;
            entry.record.result = Some(value.clone());
            entry.record.finished_at = Some(Utc::now());
            entry.finished = Some(Instant::now());
            if let Some(done) = entry.done.take() {
                let _ = done.send(Ok(value));
            }
        }
        self.emit(QueueEvent::Completed { queue, job_id: id });
    }

    async fn fail(&self, id: JobId, queue: &'static str, attempts: u32, error: String) {
        {
            let mut jobs = self.jobs.lock().await;
            let Some(entry) = jobs.get_mut(&id) else {
                return;
            };
            entry.record.state = JobState::Failed;
            entry.record.history.push(RetryAttempt::new(attempts, error.clone()));
            entry.record.finished_at = Some(Utc::now());
            entry.finished = Some(Instant::now());
            if let Some(done) = entry.done.take() {
                let _ = done.send(Err(JobError::Failed {
                    attempts,
                    error: error.clone(),
                }));
            }
        }
        self.emit(QueueEvent::Failed {
            queue,
            job_id: id,
            attempts,
            error,
        });
    }

    async fn schedule_retry(self: &Arc<Self>, id: JobId, queue: &'static str, attempt: u32, error: String) {
        let delay = {
            let mut jobs = self.jobs.lock().await;
            let Some(entry) = jobs.get_mut(&id) else {
                return;
            };
            entry.record.state = JobState::Delayed;
            entry.record.history.push(RetryAttempt::new(attempt, error.clone()));
            entry.options.backoff.delay_after(attempt)
        };
        self.emit(QueueEvent::Retrying {
            queue,
            job_id: id,
            attempt,
            delay,
            error,
        });

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            {
                let mut jobs = inner.jobs.lock().await;
                match jobs.get_mut(&id) {
                    Some(entry) if entry.record.state == JobState::Delayed => {
                        entry.record.state = JobState::Waiting;
                    }
                    _ => return,
                }
            }
            let Some(sender) = inner.senders.get(queue) else {
                return;
            };
            if sender.send(id).await.is_err() {
                error!(queue, job_id = %id, "Queue closed before delayed job could be requeued");
            }
        });
    }
}
