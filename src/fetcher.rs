//! Time-bounded retrieval of one dataset

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::remote::RemoteSource;
use crate::types::{CaseType, ContentLocation, FetchResult};

/// Retrieves the raw content of a dataset from the configured repository
///
/// Each call is bounded by `RemoteConfig::timeout`, measured from the start of that
/// call. There is no retry: a timeout, rate limit or transport failure ends the fetch.
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn RemoteSource>,
    remote: RemoteConfig,
}

impl Fetcher {
    /// Create a fetcher reading from `source`
    pub fn new(source: Arc<dyn RemoteSource>, remote: RemoteConfig) -> Self {
        Self { source, remote }
    }

    /// Repository location of a dataset
    pub fn location(&self, case: CaseType) -> ContentLocation {
        ContentLocation {
            owner: self.remote.owner.clone(),
            repository: self.remote.repository.clone(),
            path: self.remote.dataset_path(case),
        }
    }

    /// Fetch one dataset
    ///
    /// # Errors
    /// - [`Error::RemoteTimeout`] when the source does not answer in time
    /// - [`Error::RateLimited`] / [`Error::Remote`] as reported by the source
    pub async fn fetch(&self, case: CaseType) -> Result<FetchResult> {
        let location = self.location(case);
        let timeout = self.remote.timeout;
        debug!(
            dataset = case.file_name(),
            source = self.source.name(),
            path = %location.path,
            "get remote data"
        );

        let started = Instant::now();
        let content = tokio::time::timeout(timeout, self.source.get_contents(&location))
            .await
            .map_err(|_| Error::RemoteTimeout {
                dataset: case.file_name().to_string(),
                timeout,
            })??;

        debug!(
            dataset = case.file_name(),
            status = content.meta.status,
            from_cache = content.meta.from_cache,
            rate_limit_remaining = ?content.meta.rate_limit_remaining,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        Ok(FetchResult { case, content })
    }
}
