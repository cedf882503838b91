//! On-disk cache of GitHub contents responses, revalidated with ETags.
//!
//! Each request URL maps to one JSON file named after the SHA-256 of the URL, so
//! concurrent fetches of different datasets never touch the same file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::types::{RemoteContent, ResponseMeta};

/// A cached response body with the validator needed to revalidate it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request URL the entry belongs to
    pub url: String,
    /// Entity tag of the cached response
    pub etag: Option<String>,
    /// Content in its transport encoding
    pub content: String,
    /// Encoding announced by the host
    pub encoding: String,
    /// Git blob SHA
    pub sha: Option<String>,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Turn a revalidated entry back into remote content
    pub fn into_content(self, rate_limit_remaining: Option<u64>) -> RemoteContent {
        RemoteContent {
            content: self.content,
            encoding: self.encoding,
            meta: ResponseMeta {
                status: 304,
                etag: self.etag,
                rate_limit_remaining,
                sha: self.sha,
                from_cache: true,
            },
        }
    }
}

/// Directory-backed response cache
///
/// Failures never surface to callers: an unreadable entry is a miss and a failed
/// write only costs a full download next time.
#[derive(Clone, Debug)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Create a cache rooted at `dir` (created lazily on first store)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let key = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{:x}.json", key))
    }

    /// Look up the entry for `url`
    pub async fn load(&self, url: &str) -> Option<CacheEntry> {
        let path = self.entry_path(url);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read cache entry");
                return None;
            }
        };
        match serde_json::from_slice::<CacheEntry>(&raw) {
            Ok(entry) if entry.url == url => {
                debug!(url, "cache hit");
                Some(entry)
            }
            Ok(_) => {
                warn!(path = %path.display(), "cache entry belongs to another url, ignoring");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache entry, ignoring");
                None
            }
        }
    }

    /// Write (or replace) the entry for `entry.url`
    pub async fn store(&self, entry: &CacheEntry) {
        if let Err(e) = self.try_store(entry).await {
            warn!(url = %entry.url, error = %e, "cannot write cache entry");
        }
    }

    async fn try_store(&self, entry: &CacheEntry) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(&entry.url);
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_vec(entry).map_err(std::io::Error::other)?;
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(url = %entry.url, path = %path.display(), "cache entry stored");
        Ok(())
    }
}
