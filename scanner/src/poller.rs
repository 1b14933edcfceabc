use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use core_model::Quote;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("venue sampling timed out")]
    Timeout,
    #[error("venue adapter error: {0}")]
    Venue(String),
}

/// One venue's ability to produce a fresh quote for this tick. Implemented
/// per (chain, pair, venue) by wiring a `ChainClient` read plus a
/// `venues::VenueAdapter::quote_pair` call; kept as a trait here so the
/// fan-out logic below can be tested without any real transport.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn sample(&self) -> Result<Quote, ScanError>;
}

/// Fans out to every configured venue for one (chain, pair) tuple, bounded
/// by `concurrency_cap` concurrent in-flight samples and an overall
/// `tick_deadline` (§4.C steps 2-3). Partial results are acceptable: any
/// venue that errors or doesn't finish in time is dropped, not retried.
pub async fn collect_quotes(sources: &[Arc<dyn QuoteSource>], concurrency_cap: usize, tick_deadline: Duration) -> Vec<Quote> {
    let semaphore = Arc::new(Semaphore::new(concurrency_cap.max(1)));
    let mut tasks = Vec::with_capacity(sources.len());

    for source in sources {
        let source = source.clone();
        let semaphore = semaphore.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            source.sample().await.ok()
        }));
    }

    let gathered = tokio::time::timeout(tick_deadline, futures::future::join_all(tasks)).await;

    match gathered {
        Ok(results) => results.into_iter().filter_map(|r| r.ok().flatten()).collect(),
        Err(_) => {
            warn!(sources = sources.len(), "tick deadline exceeded, proceeding with partial quotes");
            Vec::new()
        }
    }
}

/// Tracks a chain's recent failure rate and decides whether its scanning
/// loop should pause for a back-off interval (§4.C "Failures").
pub struct FailureBreaker {
    window: Vec<bool>,
    window_size: usize,
    threshold: f64,
    backoff: Duration,
}

impl FailureBreaker {
    pub fn new(window_size: usize, threshold: f64, backoff: Duration) -> Self {
        Self { window: Vec::with_capacity(window_size), window_size: window_size.max(1), threshold, backoff }
    }

    pub fn record(&mut self, success: bool) {
        if self.window.len() >= self.window_size {
            self.window.remove(0);
        }
        self.window.push(success);
    }

    pub fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|s| !**s).count();
        failures as f64 / self.window.len() as f64
    }

    pub fn should_pause(&self) -> bool {
        self.window.len() >= self.window_size && self.failure_rate() > self.threshold
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}
