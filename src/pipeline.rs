//! Concurrent fetch → decode → join of the three datasets
//!
//! For every [`CaseType`] one fetch task and one decode task are spawned. The fetch
//! task hands its [`FetchResult`] to the decode task through a `oneshot` channel
//! (exactly one write, exactly one read). The decode tasks form a join barrier:
//! [`Pipeline::run`] only returns datasets once all three are decoded.
//!
//! The first fatal error returns immediately. Dropping the task sets aborts the
//! sibling tasks, so results that were already available are discarded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::Config;
use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::remote::RemoteSource;
use crate::types::{CaseType, Dataset, Datasets, FetchResult};

/// Runs one fetcher/decoder pair per dataset and joins the results
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Fetcher,
    decoder: Decoder,
}

impl Pipeline {
    /// Create a pipeline from its two stages
    pub fn new(fetcher: Fetcher, decoder: Decoder) -> Self {
        Self { fetcher, decoder }
    }

    /// Wire a pipeline from configuration: remote settings drive the fetcher, and the
    /// decoder persists raw payloads into the working directory when enabled
    pub fn from_config(config: &Config, source: Arc<dyn RemoteSource>) -> Self {
        let persist_dir: Option<PathBuf> = config
            .storage
            .persist_raw
            .then(|| config.storage.work_dir.clone());
        Self::new(
            Fetcher::new(source, config.remote.clone()),
            Decoder::new(persist_dir),
        )
    }

    /// Fetch and decode all three datasets concurrently
    ///
    /// # Errors
    /// The first fetch or decode error of any dataset, or [`Error::TaskFailed`] if a
    /// task panicked. There is no partial result.
    pub async fn run(&self) -> Result<Datasets> {
        let started = Instant::now();
        let mut fetches = JoinSet::new();
        let mut decodes = JoinSet::new();

        for case in CaseType::ALL {
            let (tx, rx) = oneshot::channel::<Result<FetchResult>>();

            let fetcher = self.fetcher.clone();
            fetches.spawn(async move {
                tx.send(fetcher.fetch(case).await).ok();
            });

            let decoder = self.decoder.clone();
            decodes.spawn(async move {
                let fetched = rx.await.map_err(|_| {
                    Error::TaskFailed(format!(
                        "fetch of {} ended without a result",
                        case.file_name()
                    ))
                })??;
                let dataset = decoder.decode(fetched).await?;
                Ok::<_, Error>((case, dataset))
            });
            debug!(dataset = case.file_name(), "tasks spawned");
        }

        let mut confirmed = None;
        let mut dead = None;
        let mut recovered = None;
        while let Some(joined) = decodes.join_next().await {
            let (case, dataset) = joined.map_err(|e| Error::TaskFailed(e.to_string()))??;
            debug!(
                dataset = case.file_name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "dataset ready"
            );
            match case {
                CaseType::Confirmed => confirmed = Some(dataset),
                CaseType::Dead => dead = Some(dataset),
                CaseType::Recovered => recovered = Some(dataset),
            }
        }

        let datasets = Datasets {
            confirmed: take(confirmed, CaseType::Confirmed)?,
            dead: take(dead, CaseType::Dead)?,
            recovered: take(recovered, CaseType::Recovered)?,
        };
        datasets.check_consistent()?;

        info!(
            days = datasets.confirmed.days(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "all datasets decoded"
        );
        Ok(datasets)
    }
}

fn take(slot: Option<Dataset>, case: CaseType) -> Result<Dataset> {
    slot.ok_or_else(|| Error::TaskFailed(format!("no result for {}", case.file_name())))
}
