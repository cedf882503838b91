//! Core types for covid-cases

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of leading metadata columns (province, country, lat, long) in every dataset
pub const METADATA_COLUMNS: usize = 4;

/// One of the three published case types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    /// Confirmed cases
    Confirmed,
    /// Deaths
    Dead,
    /// Recoveries
    Recovered,
}

impl CaseType {
    /// All case types in reporting order
    pub const ALL: [CaseType; 3] = [CaseType::Confirmed, CaseType::Dead, CaseType::Recovered];

    /// File name of the time series in the upstream repository
    pub fn file_name(self) -> &'static str {
        match self {
            CaseType::Confirmed => "time_series_covid19_confirmed_global.csv",
            CaseType::Dead => "time_series_covid19_deaths_global.csv",
            CaseType::Recovered => "time_series_covid19_recovered_global.csv",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            CaseType::Confirmed => "Confirmed",
            CaseType::Dead => "Dead",
            CaseType::Recovered => "Recovered",
        }
    }
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a dataset: a region and its cumulative counts, one per reporting day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Province or state, empty for country-level rows
    pub province: String,
    /// Country or region name
    pub country: String,
    /// Latitude, absent for a few upstream rows
    pub lat: Option<f64>,
    /// Longitude, absent for a few upstream rows
    pub long: Option<f64>,
    /// Case counts in ascending date order
    pub cases: Vec<i64>,
}

impl Record {
    /// Build a record for a country without province or coordinates
    pub fn country(country: impl Into<String>, cases: Vec<i64>) -> Self {
        Self {
            province: String::new(),
            country: country.into(),
            lat: None,
            long: None,
            cases,
        }
    }
}

/// A header plus the decoded rows of one time series
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column labels; the first four are metadata, the rest are dates
    pub header: Vec<String>,
    /// Rows in source order
    pub records: Vec<Record>,
}

impl Dataset {
    /// Assemble a dataset, checking that every record has one count per date column
    pub fn new(name: &str, header: Vec<String>, records: Vec<Record>) -> Result<Self> {
        if header.len() <= METADATA_COLUMNS {
            return Err(Error::Parse {
                dataset: name.to_string(),
                reason: format!(
                    "header has {} columns, expected at least {}",
                    header.len(),
                    METADATA_COLUMNS + 1
                ),
            });
        }
        let days = header.len() - METADATA_COLUMNS;
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.cases.len() != days)
        {
            return Err(Error::Parse {
                dataset: name.to_string(),
                reason: format!(
                    "row {} ({}) has {} counts, header has {} dates",
                    row + 1,
                    record.country,
                    record.cases.len(),
                    days
                ),
            });
        }
        Ok(Self { header, records })
    }

    /// Date column labels
    pub fn date_labels(&self) -> &[String] {
        self.header.get(METADATA_COLUMNS..).unwrap_or(&[])
    }

    /// Number of reporting days
    pub fn days(&self) -> usize {
        self.date_labels().len()
    }

    /// Date columns parsed as calendar dates (`M/D/YY`); unparsable labels yield `None`
    pub fn dates(&self) -> Vec<Option<NaiveDate>> {
        self.date_labels()
            .iter()
            .map(|label| NaiveDate::parse_from_str(label.trim(), "%m/%d/%y").ok())
            .collect()
    }
}

/// The three decoded time series of one run
#[derive(Clone, Debug, PartialEq)]
pub struct Datasets {
    /// Confirmed cases
    pub confirmed: Dataset,
    /// Deaths
    pub dead: Dataset,
    /// Recoveries
    pub recovered: Dataset,
}

impl Datasets {
    /// Dataset of one case type
    pub fn get(&self, case: CaseType) -> &Dataset {
        match case {
            CaseType::Confirmed => &self.confirmed,
            CaseType::Dead => &self.dead,
            CaseType::Recovered => &self.recovered,
        }
    }

    /// Verify the three datasets share the same date columns
    pub fn check_consistent(&self) -> Result<()> {
        let reference = self.confirmed.date_labels();
        for case in [CaseType::Dead, CaseType::Recovered] {
            let labels = self.get(case).date_labels();
            if labels != reference {
                return Err(Error::Parse {
                    dataset: case.file_name().to_string(),
                    reason: format!(
                        "date columns differ from {} ({} vs {} dates)",
                        CaseType::Confirmed.file_name(),
                        labels.len(),
                        reference.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Where a file lives on the remote repository host
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentLocation {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repository: String,
    /// Path of the file inside the repository
    pub path: String,
}

impl ContentLocation {
    /// Last path segment, used to name the dataset in errors and logs
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Metadata of the response that produced a [`RemoteContent`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP status of the (final) response
    pub status: u16,
    /// Entity tag, if the host sent one
    pub etag: Option<String>,
    /// Remaining request quota, if the host reported it
    pub rate_limit_remaining: Option<u64>,
    /// Git blob SHA of the file
    pub sha: Option<String>,
    /// The body was served by the response cache after revalidation
    pub from_cache: bool,
}

/// Raw file content as delivered by the transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteContent {
    /// Content in its transport encoding (base64, possibly line-wrapped)
    pub content: String,
    /// Encoding announced by the host
    pub encoding: String,
    /// Response metadata
    pub meta: ResponseMeta,
}

/// The output of one fetch, handed over to exactly one decode stage
#[derive(Debug)]
pub struct FetchResult {
    /// Which time series this is
    pub case: CaseType,
    /// The retrieved content
    pub content: RemoteContent,
}
