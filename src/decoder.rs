//! Conversion of fetched content into typed datasets
//!
//! Decoding is strictly fail-fast: the upstream files are a trusted, fixed source, so
//! any malformation (bad base64, ragged rows, non-numeric counts) aborts the run
//! instead of being skipped.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Dataset, FetchResult, METADATA_COLUMNS, Record, RemoteContent};

/// Turns a [`FetchResult`] into a [`Dataset`], optionally persisting the raw CSV first
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    persist_dir: Option<PathBuf>,
}

impl Decoder {
    /// Create a decoder; with `Some(dir)` every raw payload is written to
    /// `dir/<dataset file name>` before parsing
    pub fn new(persist_dir: Option<PathBuf>) -> Self {
        Self { persist_dir }
    }

    /// Where the raw payload of `fetched` would be written, if persistence is on
    pub fn persist_path(&self, fetched: &FetchResult) -> Option<PathBuf> {
        self.persist_dir
            .as_ref()
            .map(|dir| dir.join(fetched.case.file_name()))
    }

    /// Decode, persist (if enabled) and parse one fetched dataset
    ///
    /// Consumes the fetch result.
    pub async fn decode(&self, fetched: FetchResult) -> Result<Dataset> {
        let dataset = fetched.case.file_name();
        debug!(dataset, "convert data");

        let text = decode_transport(dataset, &fetched.content)?;

        if let Some(path) = self.persist_path(&fetched) {
            persist(&path, &text).await?;
            debug!(dataset, path = %path.display(), bytes = text.len(), "raw data saved");
        }

        let parsed = tokio::task::spawn_blocking(move || parse_csv(dataset, &text))
            .await
            .map_err(|e| Error::TaskFailed(format!("parsing {}: {}", dataset, e)))??;

        debug!(
            dataset,
            records = parsed.records.len(),
            days = parsed.days(),
            "data converted"
        );
        Ok(parsed)
    }
}

/// Undo the transport encoding of remote content
///
/// GitHub wraps base64 payloads every 60 columns; embedded whitespace is ignored.
pub fn decode_transport(dataset: &str, content: &RemoteContent) -> Result<String> {
    if !content.encoding.eq_ignore_ascii_case("base64") {
        return Err(Error::Decode {
            dataset: dataset.to_string(),
            reason: format!("unsupported encoding '{}'", content.encoding),
        });
    }

    let compact: String = content
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact).map_err(|e| Error::Decode {
        dataset: dataset.to_string(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::Decode {
        dataset: dataset.to_string(),
        reason: e.to_string(),
    })
}

/// Write `text` verbatim to `path`, replacing any previous file, and flush it to disk
pub async fn persist(path: &Path, text: &str) -> Result<()> {
    let persistence = |source| Error::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(persistence)?;
    }
    let mut file = tokio::fs::File::create(path).await.map_err(persistence)?;
    file.write_all(text.as_bytes()).await.map_err(persistence)?;
    file.sync_all().await.map_err(persistence)?;
    Ok(())
}

/// Parse a time series CSV
///
/// The first row is the header. Columns 0-1 are province and country, 2-3 are
/// latitude/longitude (empty cells allowed), the rest are integer counts.
pub fn parse_csv(dataset: &str, text: &str) -> Result<Dataset> {
    let parse_error = |e: csv::Error| Error::Parse {
        dataset: dataset.to_string(),
        reason: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if header.len() <= METADATA_COLUMNS {
        return Err(Error::Parse {
            dataset: dataset.to_string(),
            reason: format!(
                "header has {} columns, expected province, country, lat, long and at least one date",
                header.len()
            ),
        });
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(parse_error)?;
        let line = index + 1;

        let field = |column: usize| row.get(column).unwrap_or_default();
        let field_error = |column: usize, reason: String| Error::FieldParse {
            dataset: dataset.to_string(),
            row: line,
            column,
            value: field(column).to_string(),
            reason,
        };
        let coordinate = |column: usize| -> Result<Option<f64>> {
            let raw = field(column);
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse::<f64>()
                .map(Some)
                .map_err(|e| field_error(column, e.to_string()))
        };

        let cases = (METADATA_COLUMNS..row.len())
            .map(|column| {
                field(column)
                    .parse::<i64>()
                    .map_err(|e| field_error(column, e.to_string()))
            })
            .collect::<Result<Vec<i64>>>()?;

        records.push(Record {
            province: field(0).to_string(),
            country: field(1).to_string(),
            lat: coordinate(2)?,
            long: coordinate(3)?,
            cases,
        });
    }

    Dataset::new(dataset, header, records)
}
