use palindrome_pipeline::api;
use palindrome_pipeline::bench::{run_benchmark, BenchmarkConfig};
use palindrome_pipeline::config::{AppConfig, RunMode};
use palindrome_pipeline::ingestion::{EventSource, JsonLinesSource};
use palindrome_pipeline::pipeline::{
    IngestionPipeline, PalindromeDetector, PipelineStats, StatsSnapshot,
};
use palindrome_pipeline::publish::{
    IdentityResolver, LogPublisher, PlcDirectoryResolver, Publisher, StaticResolver,
    XrpcPublisher,
};
use palindrome_pipeline::segmenter::Dictionary;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut config = AppConfig::from_env()?;
    if let Err(e) = config.apply_args(&args) {
        eprintln!("{}", e);
        eprintln!(
            "Usage: palindrome-pipeline [--dictionary <path>] [--bind <addr:port>|off] \
             [--workers <n>] [--primary <n>] [--overflow <n>] [--offline] [--bench]"
        );
        std::process::exit(1);
    }
    config.validate()?;

    // 1. Dictionary:
    let dictionary = Arc::new(Dictionary::load(&config.dictionary_path)?);

    if config.mode == RunMode::Bench {
        tracing::info!("Running benchmark mode");
        run_benchmark(&BenchmarkConfig::default(), dictionary).await?;
        return Ok(());
    }

    tracing::info!("Starting application");

    // 2. Collaborators:
    let resolver: Arc<dyn IdentityResolver> = if config.offline {
        tracing::info!("Offline mode: author handles will not be resolved");
        Arc::new(StaticResolver)
    } else {
        Arc::new(PlcDirectoryResolver::new(&config.plc_url).with_timeout(config.plc_timeout()))
    };
    let publisher: Arc<dyn Publisher> = match (&config.bsky_credentials, config.offline) {
        (Some(credentials), false) => {
            tracing::info!(
                "Posting replies to {} as {}",
                config.bsky_service,
                credentials.identifier
            );
            Arc::new(XrpcPublisher::new(
                &config.bsky_service,
                &credentials.identifier,
                &credentials.password,
            ))
        }
        _ => {
            tracing::info!("Dry run: replies will be logged, not posted");
            Arc::new(LogPublisher)
        }
    };
    let stats = Arc::new(PipelineStats::new());

    // 3. Pipeline:
    let detector = PalindromeDetector::new(config.pipeline.classifier.clone(), dictionary);
    let pipeline = IngestionPipeline::new(
        config.pipeline.clone(),
        detector,
        resolver,
        publisher,
        stats.clone(),
    )?;
    pipeline.start().await;

    // 4. Spawn stats reporter:
    let reporter_stop = CancellationToken::new();
    let reporter = {
        let stats = stats.clone();
        let stop = reporter_stop.clone();
        let period = Duration::from_secs(config.stats_interval_secs);

        tokio::spawn(async move {
            let mut totals = StatsSnapshot::default();
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = interval.tick() => {
                        let window = stats.take();
                        totals.accumulate(&window);
                        tracing::info!(
                            "Pipeline stats: submitted={} dropped={} processed={} accepted={} published={}",
                            window.submitted,
                            window.dropped,
                            window.processed,
                            window.accepted,
                            window.published
                        );
                    }
                }
            }

            totals.accumulate(&stats.take());
            totals
        })
    };

    // 5. Start HTTP server:
    if let Some(bind_addr) = config.bind_addr {
        let app = api::router(pipeline.clone());
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!("HTTP server listening on {}", bind_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("HTTP server failed: {}", e);
            }
        });
    }

    // 6. Feed events from stdin until EOF or Ctrl+C:
    tracing::info!("Reading events from stdin, press Ctrl+C to shutdown");
    let mut source = JsonLinesSource::new(BufReader::new(tokio::io::stdin()));

    tokio::select! {
        result = source.run(&pipeline) => {
            if let Err(e) = result {
                tracing::error!("Event source failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    pipeline.shutdown().await;

    reporter_stop.cancel();
    let totals = reporter.await?;
    tracing::info!(
        "Totals: submitted={} dropped={} refused={} processed={} accepted={} published={} publish_failures={}",
        totals.submitted,
        totals.dropped,
        totals.refused,
        totals.processed,
        totals.accepted,
        totals.published,
        totals.publish_failures
    );

    Ok(())
}
