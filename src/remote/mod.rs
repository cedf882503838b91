//! Remote retrieval of repository files
//!
//! The pipeline only depends on the [`RemoteSource`] trait: given an owner, a
//! repository and a path, return the file content in its transport encoding, or a
//! typed error that tells a rate limit apart from any other failure.
//!
//! [`GitHubClient`] is the production implementation, backed by the GitHub
//! contents API. Files larger than the contents API limit come back without a body;
//! those are fetched again through the git blob API using the returned SHA.
//! An optional [`ResponseCache`] turns repeated runs into cheap `304` revalidations.

mod cache;


pub use cache::{CacheEntry, ResponseCache};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, ETAG, HeaderMap, IF_NONE_MATCH, USER_AGENT};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::types::{ContentLocation, RemoteContent, ResponseMeta};

/// Trait for retrieving one file from a remote repository host
///
/// Implementations must distinguish [`Error::RateLimited`] from other failures,
/// which are reported as [`Error::Remote`]. Timeouts are enforced by the caller.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Retrieve the content of the file at `location`
    async fn get_contents(&self, location: &ContentLocation) -> Result<RemoteContent>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// Subset of the GitHub contents/blob response we rely on
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    sha: Option<String>,
}

/// GitHub error body
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

const GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// [`RemoteSource`] backed by the GitHub REST API
#[derive(Clone, Debug)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    token: Option<String>,
    cache: Option<ResponseCache>,
}

impl GitHubClient {
    /// Create a client for the API base URL and credentials in `remote`
    ///
    /// # Errors
    /// Returns [`Error::Config`] for an invalid API URL and [`Error::Network`] if
    /// the HTTP client cannot be built.
    pub fn new(remote: &RemoteConfig) -> Result<Self> {
        let api_url = Url::parse(&remote.api_url).map_err(|e| {
            Error::config("remote.api_url", format!("'{}': {}", remote.api_url, e))
        })?;
        if api_url.cannot_be_a_base() {
            return Err(Error::config(
                "remote.api_url",
                format!("'{}' cannot be used as a base URL", remote.api_url),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            remote
                .user_agent
                .parse()
                .map_err(|_| Error::config("remote.user_agent", "not a valid header value"))?,
        );
        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_url,
            token: remote.token.clone(),
            cache: None,
        })
    }

    /// Revalidate responses against `cache` instead of always downloading
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("remote.api_url", "cannot be used as a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, location: &ContentLocation) -> Result<Url> {
        let prefix = [
            "repos",
            location.owner.as_str(),
            location.repository.as_str(),
            "contents",
        ];
        self.endpoint(
            prefix
                .into_iter()
                .chain(location.path.split('/').filter(|s| !s.is_empty())),
        )
    }

    fn blob_url(&self, location: &ContentLocation, sha: &str) -> Result<Url> {
        self.endpoint([
            "repos",
            location.owner.as_str(),
            location.repository.as_str(),
            "git",
            "blobs",
            sha,
        ])
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.http.get(url).header(ACCEPT, GITHUB_JSON);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("token {}", token)),
            None => request,
        }
    }

    async fn send(
        &self,
        dataset: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        request.send().await.map_err(|e| Error::Remote {
            dataset: dataset.to_string(),
            status: e.status().map(|s| s.as_u16()),
            reason: if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                e.to_string()
            },
        })
    }

    /// Map every non-success status to a typed error
    async fn check_status(dataset: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers();
        if is_rate_limited(status, headers) {
            return Err(Error::RateLimited {
                dataset: dataset.to_string(),
                reset_at: rate_limit_reset(headers),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let reason = match serde_json::from_str::<ApiMessage>(&body) {
            Ok(api) => format!("{} {}", status, api.message),
            Err(_) => status.to_string(),
        };
        Err(Error::Remote {
            dataset: dataset.to_string(),
            status: Some(status.as_u16()),
            reason,
        })
    }

    async fn decode_body(dataset: &str, response: reqwest::Response) -> Result<ContentsResponse> {
        response.json().await.map_err(|e| Error::Remote {
            dataset: dataset.to_string(),
            status: None,
            reason: format!("invalid contents response: {}", e),
        })
    }

    /// Fetch a file too large for the contents API through the blob API
    async fn get_blob(&self, location: &ContentLocation, sha: &str) -> Result<ContentsResponse> {
        let dataset = location.file_name();
        let url = self.blob_url(location, sha)?;
        debug!(dataset, %url, "file exceeds contents api limit, fetching blob");
        let response = self.send(dataset, self.request(url)).await?;
        let response = Self::check_status(dataset, response).await?;
        Self::decode_body(dataset, response).await
    }
}

#[async_trait]
impl RemoteSource for GitHubClient {
    async fn get_contents(&self, location: &ContentLocation) -> Result<RemoteContent> {
        let dataset = location.file_name();
        let url = self.contents_url(location)?;

        let cached = match &self.cache {
            Some(cache) => cache.load(url.as_str()).await,
            None => None,
        };

        let mut request = self.request(url.clone());
        if let Some(etag) = cached.as_ref().and_then(|c| c.etag.as_deref()) {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = self.send(dataset, request).await?;
        let remaining = header_u64(response.headers(), "x-ratelimit-remaining");

        if response.status() == StatusCode::NOT_MODIFIED {
            return match cached {
                Some(entry) => {
                    debug!(dataset, "not modified, using cached content");
                    Ok(entry.into_content(remaining))
                }
                None => Err(Error::Remote {
                    dataset: dataset.to_string(),
                    status: Some(304),
                    reason: "304 Not Modified without a cached copy".to_string(),
                }),
            };
        }

        let response = Self::check_status(dataset, response).await?;
        let status = response.status().as_u16();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Self::decode_body(dataset, response).await?;
        if body.encoding.as_deref() == Some("none") || body.content.as_deref() == Some("") {
            let sha = body.sha.clone().ok_or_else(|| Error::Remote {
                dataset: dataset.to_string(),
                status: Some(status),
                reason: "empty content and no blob sha".to_string(),
            })?;
            body = self.get_blob(location, &sha).await?;
        }

        let content = RemoteContent {
            content: body.content.unwrap_or_default(),
            encoding: body.encoding.unwrap_or_else(|| "base64".to_string()),
            meta: ResponseMeta {
                status,
                etag,
                rate_limit_remaining: remaining,
                sha: body.sha,
                from_cache: false,
            },
        };

        if let Some(cache) = &self.cache {
            cache
                .store(&CacheEntry {
                    url: url.to_string(),
                    etag: content.meta.etag.clone(),
                    content: content.content.clone(),
                    encoding: content.encoding.clone(),
                    sha: content.meta.sha.clone(),
                    stored_at: Utc::now(),
                })
                .await;
        }

        Ok(content)
    }

    fn name(&self) -> &str {
        "github"
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && header_u64(headers, "x-ratelimit-remaining") == Some(0))
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let secs = header_u64(headers, "x-ratelimit-reset")?;
    DateTime::<Utc>::from_timestamp(i64::try_from(secs).ok()?, 0)
}
