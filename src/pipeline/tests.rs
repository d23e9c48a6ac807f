//! Pipeline Module Tests
//!
//! Exercises admission under load, overflow draining, worker processing and shutdown.
//!
//! ## Test Scopes
//! - **Queue**: Bounded push/pop semantics, slot reservation and close behaviour.
//! - **Stats**: Snapshot versus take, and counter bookkeeping.
//! - **Detector**: The normalize -> classify -> segment chain on real phrases.
//! - **Pipeline**: Drop accounting, draining, publishing, fallbacks and shutdown.

#[cfg(test)]
mod tests {
    use crate::classifier::{ClassifierConfig, RejectReason};
    use crate::config::ConfigError;
    use crate::ingestion::RawEvent;
    use crate::pipeline::detector::{PalindromeDetector, Verdict};
    use crate::pipeline::pipeline::IngestionPipeline;
    use crate::pipeline::queue::{BoundedQueue, PushError};
    use crate::pipeline::stats::{PipelineStats, StatsSnapshot};
    use crate::pipeline::types::{PipelineConfig, QueuedRecord};
    use crate::publish::{IdentityResolver, Publisher, Reply, StaticResolver};
    use crate::segmenter::Dictionary;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // ============================================================
    // TEST DOUBLES
    // ============================================================

    #[derive(Default)]
    struct RecordingPublisher {
        replies: Mutex<Vec<Reply>>,
    }

    impl RecordingPublisher {
        fn replies(&self) -> Vec<Reply> {
            self.replies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, reply: &Reply) -> Result<()> {
            self.replies.lock().unwrap().push(reply.clone());
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, _reply: &Reply) -> Result<()> {
            Err(anyhow!("network unreachable"))
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl IdentityResolver for FailingResolver {
        async fn resolve(&self, _author_id: &str) -> Result<String> {
            Err(anyhow!("directory unavailable"))
        }
    }

    fn dictionary() -> Arc<Dictionary> {
        Arc::new(Dictionary::from_words([
            "a", "man", "plan", "canal", "panama", "race", "car", "xx", "ana", "step", "on",
            "no", "pets",
        ]))
    }

    fn detector() -> PalindromeDetector {
        PalindromeDetector::new(ClassifierConfig::default(), dictionary())
    }

    fn config(primary: usize, overflow: usize, workers: usize) -> PipelineConfig {
        PipelineConfig {
            primary_capacity: primary,
            overflow_capacity: overflow,
            workers,
            drain_interval_ms: 10,
            classifier: ClassifierConfig::default(),
        }
    }

    fn build(
        config: PipelineConfig,
        resolver: Arc<dyn IdentityResolver>,
        publisher: Arc<dyn Publisher>,
    ) -> Arc<IngestionPipeline> {
        IngestionPipeline::new(
            config,
            detector(),
            resolver,
            publisher,
            Arc::new(PipelineStats::new()),
        )
        .unwrap()
    }

    fn event(text: &str, n: usize) -> RawEvent {
        RawEvent::new(text, "did:plc:author", format!("post{}", n))
    }

    /// Polls `condition` until it holds or a second has passed.
    async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while tokio::time::Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        condition()
    }

    // ============================================================
    // QUEUE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_queue_rejects_push_when_full() {
        let queue = BoundedQueue::new("test", 2);

        assert!(queue.try_push(1).is_ok());
        assert!(queue.try_push(2).is_ok());
        assert_eq!(queue.try_push(3), Err(PushError::Full(3)));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.capacity(), 2);
    }

    #[tokio::test]
    async fn test_queue_is_fifo() {
        let queue = BoundedQueue::new("test", 3);
        queue.try_push("a").unwrap();
        queue.try_push("b").unwrap();

        assert_eq!(queue.try_pop(), Some("a"));
        assert_eq!(queue.pop().await, Some("b"));
        assert_eq!(queue.try_pop(), None);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_queue_reserved_slot_counts_against_capacity() {
        let queue = BoundedQueue::new("test", 1);

        let slot = queue.try_reserve().expect("slot should be free");
        assert!(queue.try_reserve().is_none());
        assert!(matches!(queue.try_push(1), Err(PushError::Full(1))));

        slot.push(7);
        assert_eq!(queue.try_pop(), Some(7));
    }

    #[tokio::test]
    async fn test_dropped_slot_is_released() {
        let queue: BoundedQueue<u32> = BoundedQueue::new("test", 1);

        drop(queue.try_reserve());

        assert!(queue.try_push(1).is_ok());
    }

    #[tokio::test]
    async fn test_closed_queue_refuses_pushes_but_yields_remaining_items() {
        let queue = BoundedQueue::new("test", 4);
        queue.try_push(1).unwrap();
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.try_push(2), Err(PushError::Closed(2)));
        assert!(queue.try_reserve().is_none());
        assert_eq!(queue.pop().await, Some(1));
        assert_eq!(queue.pop().await, None);
    }

    #[tokio::test]
    async fn test_pop_wakes_on_close() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new("test", 1));
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("pop should return after close")
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_push_error_returns_item() {
        assert_eq!(PushError::Full("x").into_inner(), "x");
        assert_eq!(PushError::Closed(5).to_string(), "queue is closed");
    }

    // ============================================================
    // STATS TESTS
    // ============================================================

    #[test]
    fn test_snapshot_keeps_counters() {
        let stats = PipelineStats::new();
        stats.record_submitted(3);
        stats.record_admitted_primary(2);
        stats.record_admitted_overflow(1);

        let snapshot = stats.snapshot();

        assert_eq!(snapshot.submitted, 3);
        assert_eq!(snapshot.admitted(), 3);
        assert_eq!(stats.submitted(), 3);
    }

    #[test]
    fn test_take_zeroes_counters() {
        let stats = PipelineStats::new();
        stats.record_dropped(4);
        stats.record_accepted(1);

        let taken = stats.take();

        assert_eq!(taken.dropped, 4);
        assert_eq!(taken.accepted, 1);
        assert_eq!(stats.snapshot(), Default::default());
    }

    #[test]
    fn test_accumulated_windows_match_running_totals() {
        let stats = PipelineStats::new();
        let mut totals = StatsSnapshot::default();

        stats.record_submitted(5);
        stats.record_dropped(1);
        totals.accumulate(&stats.take());
        stats.record_submitted(3);
        totals.accumulate(&stats.take());

        assert_eq!(totals.submitted, 8);
        assert_eq!(totals.dropped, 1);
        assert_eq!(stats.submitted(), 0);
    }

    #[test]
    fn test_snapshot_serializes_field_names() {
        let stats = PipelineStats::new();
        stats.record_published(2);

        let json = serde_json::to_value(stats.snapshot()).unwrap();

        assert_eq!(json["published"], 2);
        assert_eq!(json["dropped"], 0);
    }

    // ============================================================
    // DETECTOR TESTS
    // ============================================================

    #[test]
    fn test_detector_accepts_segmentable_palindrome() {
        let verdict = detector().detect("Racecar!");

        match verdict {
            Verdict::Accepted(detection) => {
                assert_eq!(detection.span.original, "Racecar");
                assert_eq!(detection.span.cleaned, "racecar");
                assert_eq!(detection.segmentation.phrases(), vec!["race car".to_string()]);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_detector_accepts_phrase_with_punctuation() {
        let verdict = detector().detect("A man, a plan, a canal: Panama");

        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_detector_ignores_emoji_and_mixed_case() {
        let verdict = detector().detect("🚀 Step on no pets 🐶");

        match verdict {
            Verdict::Accepted(detection) => {
                assert_eq!(detection.span.original, "Step on no pets");
                assert!(detection
                    .segmentation
                    .phrases()
                    .contains(&"step on no pets".to_string()));
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_detector_rejections() {
        let detector = detector();

        assert_eq!(
            detector.detect("hahahaha"),
            Verdict::Rejected(RejectReason::AlternatingPair)
        );
        assert_eq!(
            detector.detect("zzzzzzzz"),
            Verdict::Rejected(RejectReason::SingleCharacter)
        );
        assert_eq!(
            detector.detect("wow!"),
            Verdict::Rejected(RejectReason::TooShort {
                length: 3,
                minimum: 6
            })
        );
        assert_eq!(
            detector.detect("race cars"),
            Verdict::Rejected(RejectReason::NotPalindrome)
        );
        assert_eq!(
            detector.detect("12345 !!!"),
            Verdict::Rejected(RejectReason::NoLetters)
        );
    }

    #[test]
    fn test_detector_requires_dictionary_split() {
        // Palindrome, but "deified" is not in the word list
        assert_eq!(
            detector().detect("deified"),
            Verdict::Rejected(RejectReason::NoSegmentation)
        );
    }

    #[test]
    fn test_detector_splits_repeated_word_palindrome() {
        match detector().detect("xxanaxx") {
            Verdict::Accepted(detection) => {
                assert_eq!(detection.segmentation.phrases(), vec!["xx ana xx".to_string()]);
            }
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    // ============================================================
    // CONFIGURATION TESTS
    // ============================================================

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();

        assert_eq!(config.primary_capacity, 10);
        assert_eq!(config.overflow_capacity, 100);
        assert_eq!(config.workers, 5);
        assert_eq!(config.drain_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacities_are_rejected() {
        let err = IngestionPipeline::new(
            config(1, 0, 1),
            detector(),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
            Arc::new(PipelineStats::new()),
        )
        .err()
        .expect("zero overflow capacity should be rejected");

        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "overflow_capacity",
                ..
            }
        ));
    }

    // ============================================================
    // ADMISSION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_event_beyond_both_capacities_is_dropped() {
        // P + F + 1 events, nobody consuming
        let pipeline = build(
            config(2, 3, 0),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
        );

        for n in 0..6 {
            pipeline.submit(event("racecar", n));
        }

        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.submitted, 6);
        assert_eq!(stats.admitted_primary, 2);
        assert_eq!(stats.admitted_overflow, 3);
        assert_eq!(stats.dropped, 1);
        assert_eq!(pipeline.primary_len(), 2);
        assert_eq!(pipeline.overflow_len(), 3);
    }

    #[tokio::test]
    async fn test_drain_is_noop_while_primary_full() {
        let pipeline = build(
            config(1, 2, 0),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
        );
        pipeline.submit(event("racecar", 0));
        pipeline.submit(event("racecar", 1));

        assert_eq!(pipeline.drain_overflow(), 0);
        assert_eq!(pipeline.overflow_len(), 1);
    }

    #[test]
    fn test_queued_record_starts_fresh() {
        let record = QueuedRecord::new(event("racecar", 0));

        assert_eq!(record.readmissions, 0);
        assert!(record.queued_for() < Duration::from_secs(1));
    }

    // ============================================================
    // PROCESSING TESTS
    // ============================================================

    #[tokio::test]
    async fn test_overflow_is_drained_and_processed() {
        let publisher = Arc::new(RecordingPublisher::default());
        let pipeline = build(config(1, 5, 1), Arc::new(StaticResolver), publisher.clone());
        pipeline.start().await;

        for n in 0..6 {
            pipeline.submit(event("no lemon", n));
        }

        let stats = pipeline.stats().clone();
        assert!(wait_until(|| stats.processed() == 6).await);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.dropped, 0);
        assert_eq!(snapshot.admitted(), 6);
        assert_eq!(
            snapshot.readmitted, snapshot.admitted_overflow,
            "every overflow record should be moved back exactly once"
        );

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_accepted_palindrome_is_published() {
        let publisher = Arc::new(RecordingPublisher::default());
        let pipeline = build(config(4, 4, 2), Arc::new(StaticResolver), publisher.clone());
        pipeline.start().await;

        pipeline.submit(RawEvent::new("Racecar!", "did:plc:abc", "3kxyz"));
        pipeline.submit(event("just a regular post", 1));

        let stats = pipeline.stats().clone();
        assert!(wait_until(|| stats.processed() == 2).await);
        pipeline.shutdown().await;

        let replies = publisher.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0].text,
            "Palindrome Found!\n\nRacecar\n\nFrom user did:plc:abc"
        );
        assert_eq!(
            replies[0].link_url,
            "https://bsky.app/profile/did:plc:abc/post/3kxyz"
        );
        assert_eq!(replies[0].mention_id, "did:plc:abc");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.accepted, 1);
        assert_eq!(snapshot.candidates, 1);
        assert_eq!(snapshot.published, 1);
    }

    #[tokio::test]
    async fn test_resolver_failure_falls_back_to_raw_id() {
        let publisher = Arc::new(RecordingPublisher::default());
        let pipeline = build(config(2, 2, 1), Arc::new(FailingResolver), publisher.clone());
        pipeline.start().await;

        pipeline.submit(RawEvent::new("race car", "did:plc:xyz", "p1"));

        let stats = pipeline.stats().clone();
        assert!(wait_until(|| stats.published() == 1).await);
        pipeline.shutdown().await;

        assert_eq!(stats.identity_fallbacks(), 1);
        assert_eq!(publisher.replies()[0].mention_handle, "did:plc:xyz");
    }

    #[tokio::test]
    async fn test_publish_failure_is_counted_not_retried() {
        let pipeline = build(config(2, 2, 1), Arc::new(StaticResolver), Arc::new(FailingPublisher));
        pipeline.start().await;

        pipeline.submit(event("racecar", 0));
        pipeline.submit(event("racecar", 1));

        let stats = pipeline.stats().clone();
        assert!(wait_until(|| stats.processed() == 2).await);
        pipeline.shutdown().await;

        assert_eq!(stats.publish_failures(), 2);
        assert_eq!(stats.published(), 0);
        assert_eq!(stats.accepted(), 2);
    }

    #[tokio::test]
    async fn test_candidate_without_segmentation_is_not_published() {
        let publisher = Arc::new(RecordingPublisher::default());
        let pipeline = build(config(2, 2, 1), Arc::new(StaticResolver), publisher.clone());
        pipeline.start().await;

        pipeline.submit(event("deified", 0));

        let stats = pipeline.stats().clone();
        assert!(wait_until(|| stats.processed() == 1).await);
        pipeline.shutdown().await;

        assert_eq!(stats.candidates(), 1);
        assert_eq!(stats.accepted(), 0);
        assert!(publisher.replies().is_empty());
    }

    // ============================================================
    // SHUTDOWN TESTS
    // ============================================================

    #[tokio::test]
    async fn test_submit_after_shutdown_is_refused() {
        let pipeline = build(
            config(2, 2, 1),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
        );
        pipeline.start().await;
        pipeline.shutdown().await;

        pipeline.submit(event("racecar", 0));

        let stats = pipeline.stats().snapshot();
        assert!(!pipeline.is_accepting());
        assert_eq!(stats.refused, 1);
        assert_eq!(stats.admitted(), 0);
        assert_eq!(stats.dropped, 0);
    }

    #[tokio::test]
    async fn test_shutdown_without_workers_discards_everything_queued() {
        let pipeline = build(
            config(1, 3, 0),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
        );
        for n in 0..4 {
            pipeline.submit(event("racecar", n));
        }

        pipeline.shutdown().await;

        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.dropped, 4);
        assert_eq!(stats.processed, 0);
        assert_eq!(pipeline.primary_len(), 0);
        assert_eq!(pipeline.overflow_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_submits_racing_shutdown_leave_nothing_queued() {
        for round in 0..100 {
            let pipeline = build(
                config(4, 4, 2),
                Arc::new(StaticResolver),
                Arc::new(RecordingPublisher::default()),
            );
            pipeline.start().await;

            let producers: Vec<_> = (0..3)
                .map(|_| {
                    let pipeline = pipeline.clone();
                    tokio::task::spawn_blocking(move || {
                        for n in 0..2000 {
                            pipeline.submit(event("step on no pets", n));
                        }
                    })
                })
                .collect();

            tokio::task::yield_now().await;
            pipeline.shutdown().await;
            let queued_after_shutdown = pipeline.primary_len() + pipeline.overflow_len();

            for producer in producers {
                producer.await.unwrap();
            }

            let stats = pipeline.stats().snapshot();
            assert_eq!(queued_after_shutdown, 0, "round {}: {:?}", round, stats);
            assert_eq!(
                pipeline.primary_len() + pipeline.overflow_len(),
                0,
                "round {}: {:?}",
                round,
                stats
            );
            assert_eq!(stats.submitted, 6000);
            assert_eq!(
                stats.processed + stats.dropped,
                stats.submitted - stats.refused,
                "round {}: {:?}",
                round,
                stats
            );
        }
    }

    #[tokio::test]
    async fn test_start_after_shutdown_spawns_nothing() {
        let pipeline = build(
            config(2, 2, 2),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
        );
        pipeline.shutdown().await;

        pipeline.start().await;
        pipeline.submit(event("racecar", 0));

        assert_eq!(pipeline.stats().refused(), 1);
        assert_eq!(pipeline.primary_len(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_accounts_for_every_admitted_event() {
        let pipeline = build(
            config(2, 4, 2),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
        );
        pipeline.start().await;

        for n in 0..20 {
            pipeline.submit(event("step on no pets", n));
        }
        pipeline.shutdown().await;
        pipeline.submit(event("step on no pets", 99));

        // Every submission is processed, dropped or refused exactly once
        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.submitted, 21);
        assert_eq!(stats.refused, 1);
        assert_eq!(stats.processed + stats.dropped, stats.submitted - stats.refused);
        assert_eq!(pipeline.primary_len(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let pipeline = build(
            config(2, 2, 1),
            Arc::new(StaticResolver),
            Arc::new(RecordingPublisher::default()),
        );
        pipeline.start().await;

        pipeline.shutdown().await;
        pipeline.shutdown().await;

        assert!(!pipeline.is_accepting());
    }
}
