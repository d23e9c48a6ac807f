//! Ingestion Pipeline
//!
//! Admits events under bounded memory and drives them through the classification
//! chain on a fixed pool of workers.
//!
//! ## Responsibilities
//! - **Admission**: `submit` tries the primary queue, then the overflow queue, then
//!   drops and counts. It never blocks the producer.
//! - **Draining**: A background task periodically moves overflow records into the
//!   primary queue while it has room.
//! - **Processing**: Workers pop records, classify them and hand confirmed
//!   palindromes to the publisher.
//! - **Shutdown**: Stops admission and the drain task, then lets workers empty the
//!   primary queue and exit.

use super::detector::{Detection, PalindromeDetector, Verdict};
use super::queue::{BoundedQueue, PushError};
use super::stats::PipelineStats;
use super::types::*;
use crate::classifier::RejectReason;
use crate::config::ConfigError;
use crate::ingestion::RawEvent;
use crate::publish::{IdentityResolver, Publisher, Reply};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct IngestionPipeline {
    config: PipelineConfig,
    primary: BoundedQueue<QueuedRecord>,
    overflow: BoundedQueue<QueuedRecord>,
    detector: Arc<PalindromeDetector>,
    resolver: Arc<dyn IdentityResolver>,
    publisher: Arc<dyn Publisher>,
    stats: Arc<PipelineStats>,
    accepting: AtomicBool,
    /// Submissions between their `accepting` check and the end of their push.
    in_flight: AtomicUsize,
    started: AtomicBool,
    /// Cancelled once shutdown begins; stops the drain task.
    drain_stop: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    drain_task: Mutex<Option<JoinHandle<()>>>,
}

impl IngestionPipeline {
    /// Builds a pipeline. Nothing runs until [`IngestionPipeline::start`].
    pub fn new(
        config: PipelineConfig,
        detector: PalindromeDetector,
        resolver: Arc<dyn IdentityResolver>,
        publisher: Arc<dyn Publisher>,
        stats: Arc<PipelineStats>,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;

        Ok(Arc::new(Self {
            primary: BoundedQueue::new("primary", config.primary_capacity),
            overflow: BoundedQueue::new("overflow", config.overflow_capacity),
            config,
            detector: Arc::new(detector),
            resolver,
            publisher,
            stats,
            accepting: AtomicBool::new(true),
            in_flight: AtomicUsize::new(0),
            started: AtomicBool::new(false),
            drain_stop: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
            drain_task: Mutex::new(None),
        }))
    }

    /// Spawns the workers and the drain task and returns immediately.
    pub async fn start(self: &Arc<Self>) {
        if !self.is_accepting() {
            tracing::warn!("Pipeline is shut down, not starting");
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Pipeline already started");
            return;
        }

        tracing::info!(
            "Starting pipeline: primary={} overflow={} workers={} drain={}ms",
            self.config.primary_capacity,
            self.config.overflow_capacity,
            self.config.workers,
            self.config.drain_interval_ms
        );

        let mut workers = self.workers.lock().await;
        for worker_id in 0..self.config.workers {
            let pipeline = self.clone();
            workers.push(tokio::spawn(async move {
                pipeline.worker_loop(worker_id).await;
            }));
        }

        let pipeline = self.clone();
        *self.drain_task.lock().await = Some(tokio::spawn(async move {
            pipeline.drain_loop().await;
        }));

        tracing::info!("Pipeline started with {} workers", workers.len());
    }

    /// The single ingress. Never blocks and never fails; overload is counted.
    pub fn submit(&self, event: RawEvent) {
        self.stats.record_submitted(1);

        if !self.accepting.load(Ordering::SeqCst) {
            self.stats.record_refused(1);
            tracing::trace!("Admission: {:?}", Admission::Refused);
            return;
        }

        // Registered before `admit` re-reads `accepting`; shutdown flips the flag
        // first and then waits for this count to reach zero, so no push lands after it.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let admission = self.admit(event);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        tracing::trace!("Admission: {:?}", admission);
    }

    fn admit(&self, event: RawEvent) -> Admission {
        if !self.accepting.load(Ordering::SeqCst) {
            self.stats.record_refused(1);
            return Admission::Refused;
        }

        let record = match self.primary.try_push(QueuedRecord::new(event)) {
            Ok(()) => {
                self.stats.record_admitted_primary(1);
                return Admission::Primary;
            }
            Err(PushError::Full(record)) => record,
            Err(PushError::Closed(_)) => {
                self.stats.record_refused(1);
                return Admission::Refused;
            }
        };

        match self.overflow.try_push(record) {
            Ok(()) => {
                self.stats.record_admitted_overflow(1);
                Admission::Overflow
            }
            Err(PushError::Full(record)) => {
                self.stats.record_dropped(1);
                tracing::debug!(
                    "Primary and overflow queues full, dropping post {}",
                    record.event.post_id
                );
                Admission::Dropped
            }
            Err(PushError::Closed(_)) => {
                self.stats.record_refused(1);
                Admission::Refused
            }
        }
    }

    /// Moves overflow records into primary until primary is full or overflow is empty.
    ///
    /// A primary slot is reserved before each overflow pop, so a popped record always
    /// has somewhere to go. Returns the number of records moved.
    pub fn drain_overflow(&self) -> usize {
        let mut moved = 0;

        loop {
            let Some(slot) = self.primary.try_reserve() else {
                break;
            };
            let Some(mut record) = self.overflow.try_pop() else {
                break;
            };

            record.readmissions += 1;
            slot.push(record);
            moved += 1;
        }

        if moved > 0 {
            self.stats.record_readmitted(moved as u64);
            tracing::trace!("Moved {} records from overflow to primary", moved);
        }

        moved
    }

    async fn drain_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.drain_interval());

        loop {
            tokio::select! {
                _ = self.drain_stop.cancelled() => break,
                _ = interval.tick() => {
                    self.drain_overflow();
                }
            }
        }

        tracing::debug!("Drain task stopped");
    }

    /// The main loop for a single worker.
    ///
    /// Runs until the primary queue is closed and empty.
    async fn worker_loop(&self, worker_id: usize) {
        tracing::debug!("Worker {} started", worker_id);

        while let Some(record) = self.primary.pop().await {
            self.process_record(worker_id, record).await;
        }

        tracing::debug!("Worker {} stopped", worker_id);
    }

    async fn process_record(&self, worker_id: usize, record: QueuedRecord) {
        tracing::trace!(
            "Worker {} processing post {} (queued {:?}, readmitted {}x)",
            worker_id,
            record.event.post_id,
            record.queued_for(),
            record.readmissions
        );

        let verdict = self.detector.detect(&record.event.text);
        self.stats.record_processed(1);

        match verdict {
            Verdict::Accepted(detection) => {
                self.stats.record_candidates(1);
                self.stats.record_accepted(1);
                tracing::info!(
                    "Palindrome found: {:?} ({})",
                    detection.span.original,
                    detection.segmentation.phrases().join(" | ")
                );
                self.publish(&record.event, &detection).await;
            }
            Verdict::Rejected(RejectReason::NoSegmentation) => {
                self.stats.record_candidates(1);
                tracing::debug!(
                    "Candidate {:?} has no dictionary segmentation",
                    record.event.text
                );
            }
            Verdict::Rejected(reason) => {
                tracing::trace!("Post {} rejected: {}", record.event.post_id, reason);
            }
        }
    }

    /// Resolves the author, composes the reply and publishes it.
    ///
    /// Neither step is retried and neither failure is propagated.
    async fn publish(&self, event: &RawEvent, detection: &Detection) {
        let handle = match self.resolver.resolve(&event.author_id).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(
                    "Failed to resolve handle for {}, using raw id: {}",
                    event.author_id,
                    e
                );
                self.stats.record_identity_fallbacks(1);
                event.author_id.clone()
            }
        };

        let reply = Reply::new(
            &detection.span.original,
            &event.author_id,
            &handle,
            &event.post_id,
        );

        match self.publisher.publish(&reply).await {
            Ok(()) => {
                self.stats.record_published(1);
                tracing::info!("Published palindrome by {} ({})", handle, reply.link_url);
            }
            Err(e) => {
                self.stats.record_publish_failures(1);
                tracing::error!("Error publishing palindrome by {}: {}", handle, e);
            }
        }
    }

    /// Stops the pipeline and waits for every worker to finish.
    ///
    /// 1. New submissions are refused and submissions already past the check are
    ///    allowed to finish their push.
    /// 2. The drain task stops; one last drain moves what fits into primary and any
    ///    overflow remainder is discarded and counted as dropped.
    /// 3. The primary queue closes; workers finish what is queued and exit.
    /// 4. Anything still queued (there are no workers, or none were started) is
    ///    discarded and counted as dropped.
    pub async fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::SeqCst) {
            return;
        }

        tracing::info!("Shutting down pipeline");

        while self.in_flight.load(Ordering::SeqCst) > 0 {
            tokio::task::yield_now().await;
        }

        self.drain_stop.cancel();

        if let Some(handle) = self.drain_task.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::error!("Drain task failed: {}", e);
            }
        }

        self.overflow.close();
        self.drain_overflow();

        let discarded = self.discard_queued(&self.overflow);
        if discarded > 0 {
            tracing::warn!("Discarded {} overflow records at shutdown", discarded);
        }

        self.primary.close();

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!("Worker failed: {}", e);
            }
        }

        let unprocessed = self.discard_queued(&self.primary);
        if unprocessed > 0 {
            tracing::warn!(
                "Discarded {} primary records left without a worker",
                unprocessed
            );
        }

        tracing::info!("Pipeline stopped");
    }

    /// Pops everything left in `queue` and counts it as dropped.
    fn discard_queued(&self, queue: &BoundedQueue<QueuedRecord>) -> u64 {
        let mut discarded = 0u64;
        while queue.try_pop().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            self.stats.record_dropped(discarded);
        }
        discarded
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn primary_len(&self) -> usize {
        self.primary.len()
    }

    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }
}
