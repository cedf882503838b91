//! # covid-cases
//!
//! Retrieves the JHU CSSE COVID-19 global time series (confirmed, dead and
//! recovered cases per region), decodes them into typed datasets and derives
//! summaries, per-country views, rankings and trend plots.
//!
//! ## Design
//!
//! - **Concurrent pipeline** - the three datasets are fetched and decoded in
//!   parallel; results are only used once all three are joined
//! - **Fail fast** - any timeout, rate limit, transport, decode or persistence
//!   failure aborts the whole run with a typed [`Error`]
//! - **Pluggable source** - the pipeline talks to a [`RemoteSource`]; the GitHub
//!   contents API ([`GitHubClient`]) is the default
//! - **Explicit presentation** - rendering goes to any `io::Write` with a
//!   [`ReportStyle`], no global printer
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use covid_cases::{CaseType, Config, GitHubClient, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = GitHubClient::new(&config.remote)?;
//!
//!     let datasets = Pipeline::from_config(&config, Arc::new(client)).run().await?;
//!
//!     println!("confirmed: {:?}", datasets.confirmed.sum(-1));
//!     for entry in datasets.get(CaseType::Dead).ranking(5) {
//!         println!("{:2}. {} {}", entry.rank, entry.country, entry.latest);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Command-line arguments and the report flow of the binary
pub mod cli;
/// Configuration types
pub mod config;
/// Transport decoding, raw persistence and CSV parsing
pub mod decoder;
/// Error types
pub mod error;
/// Time-bounded retrieval of one dataset
pub mod fetcher;
/// Concurrent fetch/decode/join of all datasets
pub mod pipeline;
/// Remote repository access and response caching
pub mod remote;
/// Aggregation and rendering
pub mod report;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, RemoteConfig, ReportConfig, StorageConfig};
pub use decoder::Decoder;
pub use error::{Error, Result};
pub use fetcher::Fetcher;
pub use pipeline::Pipeline;
pub use remote::{GitHubClient, RemoteSource, ResponseCache};
pub use report::{CountryView, Ranking, ReportStyle, Reporter, Summary};
pub use types::{
    CaseType, ContentLocation, Dataset, Datasets, FetchResult, Record, RemoteContent,
    ResponseMeta,
};
