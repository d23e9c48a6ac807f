//! Throughput Benchmark
//!
//! Drives the real pipeline over a grid of queue capacities and worker counts and
//! reports how long each combination takes to work through a fixed burst of events
//! and how many of them were dropped.
//!
//! Publishing and identity lookups are replaced by `NullPublisher` and
//! `StaticResolver` so only admission, draining and classification are measured.

use crate::classifier::ClassifierConfig;
use crate::ingestion::RawEvent;
use crate::pipeline::{IngestionPipeline, PalindromeDetector, PipelineConfig, PipelineStats};
use crate::publish::{NullPublisher, StaticResolver};
use crate::segmenter::Dictionary;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PALINDROMES: &[&str] = &[
    "Racecar!",
    "A man, a plan, a canal: Panama",
    "Step on no pets",
    "Never odd or even",
    "Was it a car or a cat I saw?",
];

const FILLER: &[&str] = &[
    "just", "shipped", "the", "new", "release", "coffee", "morning", "great", "thread",
    "hahaha", "wow", "lol", "weekend", "plans", "anyone", "else", "🚀", "🎉",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub primary_sizes: Vec<usize>,
    pub overflow_sizes: Vec<usize>,
    pub worker_counts: Vec<usize>,
    pub events: usize,
    /// Fixes the generated event mix so runs are comparable.
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            primary_sizes: vec![100, 1000],
            overflow_sizes: vec![100, 1000, 5000],
            worker_counts: vec![1, 2, 4, 8, 16],
            events: 10_000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub primary_capacity: usize,
    pub overflow_capacity: usize,
    pub workers: usize,
    pub duration: Duration,
    pub dropped: u64,
    pub processed: u64,
    pub accepted: u64,
}

/// Builds `count` posts, roughly one in ten of them a palindrome.
pub fn generate_events(count: usize, seed: u64) -> Vec<RawEvent> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|n| {
            let text = if rng.gen_bool(0.1) {
                PALINDROMES[rng.gen_range(0..PALINDROMES.len())].to_string()
            } else {
                let words = rng.gen_range(3..12);
                (0..words)
                    .map(|_| FILLER[rng.gen_range(0..FILLER.len())])
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            RawEvent::new(text, format!("did:plc:bench{}", n % 97), format!("post{}", n))
        })
        .collect()
}

/// Runs every combination in the grid, one after another.
pub async fn run_benchmark(
    config: &BenchmarkConfig,
    dictionary: Arc<Dictionary>,
) -> Result<Vec<BenchmarkResult>> {
    let events = generate_events(config.events, config.seed);
    let stats = Arc::new(PipelineStats::new());
    let mut results = Vec::new();

    tracing::info!("Starting benchmark with {} events", events.len());

    for &primary in &config.primary_sizes {
        for &overflow in &config.overflow_sizes {
            for &workers in &config.worker_counts {
                let pipeline_config = PipelineConfig {
                    primary_capacity: primary,
                    overflow_capacity: overflow,
                    workers,
                    ..PipelineConfig::default()
                };
                let result =
                    simulate(pipeline_config, dictionary.clone(), &events, stats.clone()).await?;

                tracing::info!(
                    "Results: primary={} overflow={} workers={} duration={:?} dropped={} accepted={}",
                    result.primary_capacity,
                    result.overflow_capacity,
                    result.workers,
                    result.duration,
                    result.dropped,
                    result.accepted
                );
                results.push(result);
            }
        }
    }

    Ok(results)
}

/// Submits `events` as one burst and waits for the pipeline to wind down.
///
/// `stats` is zeroed when the run completes, so one counter object can be reused
/// across runs.
pub async fn simulate(
    config: PipelineConfig,
    dictionary: Arc<Dictionary>,
    events: &[RawEvent],
    stats: Arc<PipelineStats>,
) -> Result<BenchmarkResult> {
    let detector = PalindromeDetector::new(ClassifierConfig::default(), dictionary);
    let pipeline = IngestionPipeline::new(
        config.clone(),
        detector,
        Arc::new(StaticResolver),
        Arc::new(NullPublisher),
        stats.clone(),
    )?;

    pipeline.start().await;
    let start = Instant::now();

    for event in events {
        pipeline.submit(event.clone());
    }
    pipeline.shutdown().await;

    let duration = start.elapsed();
    let counters = stats.take();

    Ok(BenchmarkResult {
        primary_capacity: config.primary_capacity,
        overflow_capacity: config.overflow_capacity,
        workers: config.workers,
        duration,
        dropped: counters.dropped,
        processed: counters.processed,
        accepted: counters.accepted,
    })
}
