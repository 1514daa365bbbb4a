//! Scrape orchestration
//!
//! One [`Scraper`] is created per inbound scrape request. It fans out one task
//! per resource path, drains exactly one outcome per task in arrival order,
//! joins every task and finally records its own wall-clock duration.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::collector::{decode, Decoded, ResourcePath, SansayClient};
use crate::error::ScrapeError;
use crate::transformer::{emit_decoded, MetricSample, MetricSink};

/// Name of the per-scrape duration gauge
pub const SCRAPE_DURATION_METRIC: &str = "sansay_scrape_duration_seconds";

type Outcome = (ResourcePath, Result<Decoded, ScrapeError>);

/// Orchestrates one scrape of one device
pub struct Scraper {
    client: Arc<SansayClient>,
}

impl Scraper {
    /// Scrape every resource path
    pub fn new(client: SansayClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Run the scrape
    ///
    /// Never fails: every per-path failure is recorded in the returned sink
    /// as an error marker.
    #[instrument(skip(self), fields(target = %self.client.target()))]
    pub async fn scrape(self) -> MetricSink {
        let start = Instant::now();
        let mut sink = MetricSink::new();

        let (tx, mut rx) = mpsc::channel::<Outcome>(ResourcePath::ALL.len());

        let handles: Vec<_> = ResourcePath::ALL
            .into_iter()
            .map(|path| {
                let client = Arc::clone(&self.client);
                let tx = tx.clone();
                let handle = tokio::spawn(async move {
                    let outcome = fetch_and_decode(&client, path).await;
                    // The receiver outlives every sender
                    let _ = tx.send((path, outcome)).await;
                });
                (path, handle)
            })
            .collect();
        drop(tx);

        while let Some((path, outcome)) = rx.recv().await {
            match outcome {
                Ok(decoded) => {
                    debug!(path = %path, "Processing resource");
                    emit_decoded(path.as_str(), &decoded, &mut sink);
                }
                Err(e) => {
                    info!(path = %path, error = %e, "Error scraping target");
                    sink.push_error(path.as_str(), &e);
                }
            }
        }

        for (path, handle) in handles {
            if let Err(e) = handle.await {
                let err = ScrapeError::Task {
                    path: path.to_string(),
                    message: e.to_string(),
                };
                info!(path = %path, error = %err, "Error scraping target");
                sink.push_error(path.as_str(), &err);
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        debug!(
            duration_seconds = elapsed,
            samples = sink.samples().len(),
            errors = sink.errors().len(),
            "Scrape complete"
        );

        let duration = MetricSample::gauge(SCRAPE_DURATION_METRIC, elapsed)
            .with_help("Total sansay time scrape took (walk and processing).");
        if let Err(e) = sink.push(duration) {
            sink.push_error(SCRAPE_DURATION_METRIC, &e);
        }

        sink
    }
}

/// Fetch one resource and decode it into its expected shape
async fn fetch_and_decode(
    client: &SansayClient,
    path: ResourcePath,
) -> Result<Decoded, ScrapeError> {
    let body = client.fetch(path).await?;
    let decoded = decode(path.as_str(), &body)?;
    Ok(decoded)
}
