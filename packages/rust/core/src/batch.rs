//! Catalog runner: enrich many entries with bounded concurrency.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::{info, instrument, warn};
use url::Url;

use enricher_shared::{CatalogEntry, EnricherError, EntryId, Result};

use crate::pipeline::{EnrichOutcome, Enricher, ProgressReporter};

/// One entry to enrich.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: EntryId,
    pub url: Url,
    pub markers: Vec<String>,
}

impl BatchJob {
    /// Validate a `[[entries]]` item from the config file.
    pub fn from_catalog(entry: &CatalogEntry) -> Result<Self> {
        let id: EntryId = entry.id.parse()?;
        let url = Url::parse(&entry.url).map_err(|e| {
            EnricherError::validation(format!("entry '{id}': invalid url '{}': {e}", entry.url))
        })?;
        Ok(Self {
            id,
            url,
            markers: entry.markers.clone(),
        })
    }
}

/// Per-identifier locks serializing the load-mutate-save cycle.
///
/// Two jobs for the same identifier never run at the same time; jobs for
/// different identifiers are independent.
#[derive(Debug, Clone, Default)]
pub struct EntryLocks {
    inner: Arc<Mutex<HashMap<EntryId, Arc<Mutex<()>>>>>,
}

impl EntryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `id`, created on first use.
    pub async fn lock_for(&self, id: &EntryId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(id.clone()).or_default().clone()
    }
}

/// Per-entry results of a catalog run, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(EntryId, Result<EnrichOutcome>)>,
}

impl BatchReport {
    /// Entries whose primary stage succeeded.
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, Ok(outcome) if !outcome.is_failed()))
            .count()
    }

    /// Entries whose primary fetch failed (recorded as error records).
    pub fn fetch_failed(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, Ok(outcome) if outcome.is_failed()))
            .count()
    }

    /// Entries aborted by a persistence or task error.
    pub fn errored(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Enrich every job, running at most `concurrency` at once.
///
/// A failing entry is reported in the [`BatchReport`] and does not stop the
/// others. `concurrency` of 0 is treated as 1.
#[instrument(skip_all, fields(jobs = jobs.len(), concurrency = concurrency))]
pub async fn enrich_catalog(
    enricher: Arc<Enricher>,
    jobs: Vec<BatchJob>,
    concurrency: usize,
    locks: EntryLocks,
    progress: Arc<dyn ProgressReporter>,
) -> BatchReport {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    info!(jobs = jobs.len(), "starting catalog run");

    let mut handles = Vec::with_capacity(jobs.len());
    for job in jobs {
        let enricher = Arc::clone(&enricher);
        let semaphore = Arc::clone(&semaphore);
        let locks = locks.clone();
        let progress = Arc::clone(&progress);
        let id = job.id.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| EnricherError::Storage(format!("scheduler closed: {e}")))?;
            let entry_lock = locks.lock_for(&job.id).await;
            let _guard = entry_lock.lock().await;

            enricher
                .enrich(&job.id, &job.url, &job.markers, progress.as_ref())
                .await
        });
        handles.push((id, handle));
    }

    let mut report = BatchReport::default();
    for (id, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(EnricherError::Storage(format!("enrichment task failed: {e}"))),
        };
        if let Err(e) = &result {
            warn!(%id, error = %e, "entry aborted");
        }
        report.results.push((id, result));
    }

    info!(
        succeeded = report.succeeded(),
        fetch_failed = report.fetch_failed(),
        errored = report.errored(),
        "catalog run complete"
    );
    report
}
