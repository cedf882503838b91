//! Aggregation and presentation of decoded datasets
//!
//! The aggregation half works on plain [`Dataset`]s: global sums at a day offset,
//! day-over-day deltas, the per-country reduction, country lookup and rankings.
//! Nothing here mutates its input; every derived view is a new value.
//!
//! Rendering lives in [`render`], driven by an explicit [`ReportStyle`].

mod format;
pub mod plot;
mod render;

pub use format::{ReportStyle, group_thousands};
pub use render::Reporter;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{CaseType, Dataset, Datasets, Record};

/// Latest value and its change from the previous day for one case type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Case type summarized
    pub case: CaseType,
    /// Count on the latest day
    pub total: i64,
    /// Change from the previous day, absent with a single day of data
    pub new: Option<i64>,
}

/// One line of a top-N ranking
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ranking {
    /// 1-based position
    pub rank: usize,
    /// Country name
    pub country: String,
    /// Count on the latest day
    pub latest: i64,
}

/// Consolidated records of one country across the three datasets
#[derive(Clone, Debug, PartialEq)]
pub struct CountryView {
    /// Country name as spelled in the confirmed dataset
    pub country: String,
    /// Confirmed, dead and recovered records, in that order
    pub series: Vec<(CaseType, Record)>,
}

impl CountryView {
    /// Summaries of every series that has at least one day of data
    pub fn summaries(&self) -> Vec<Summary> {
        self.series
            .iter()
            .filter_map(|(case, record)| record.summary(*case))
            .collect()
    }
}

impl Record {
    /// Count on the latest day
    pub fn latest(&self) -> Option<i64> {
        self.cases.last().copied()
    }

    /// Change between the last two days
    pub fn delta(&self) -> Option<i64> {
        match self.cases.as_slice() {
            [.., previous, last] => Some(last - previous),
            _ => None,
        }
    }

    /// Summary of this record as `case`
    pub fn summary(&self, case: CaseType) -> Option<Summary> {
        Some(Summary {
            case,
            total: self.latest()?,
            new: self.delta(),
        })
    }
}

impl Dataset {
    /// Sum of all records at a day index
    ///
    /// Negative offsets count from the end: `-1` is the latest day, `-2` the one
    /// before. Returns `None` when the offset falls outside the date columns.
    pub fn sum(&self, offset: isize) -> Option<i64> {
        let days = self.days();
        let index = if offset < 0 {
            days.checked_sub(offset.unsigned_abs())?
        } else {
            offset.unsigned_abs()
        };
        if index >= days {
            return None;
        }
        Some(
            self.records
                .iter()
                .filter_map(|r| r.cases.get(index))
                .sum(),
        )
    }

    /// Global change between the last two days
    pub fn delta(&self) -> Option<i64> {
        Some(self.sum(-1)? - self.sum(-2)?)
    }

    /// Global summary of this dataset as `case`
    pub fn summary(&self, case: CaseType) -> Option<Summary> {
        Some(Summary {
            case,
            total: self.sum(-1)?,
            new: self.delta(),
        })
    }

    /// One record per country, case counts summed across its regions
    ///
    /// Records come out ordered by country name (byte order). Province and
    /// coordinates are cleared since they no longer describe a single place.
    pub fn reduce(&self) -> Dataset {
        let mut sorted: Vec<&Record> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.country.cmp(&b.country));

        let mut merged: Vec<Record> = Vec::new();
        for record in sorted {
            match merged.last_mut() {
                Some(last) if last.country == record.country => {
                    for (total, n) in last.cases.iter_mut().zip(&record.cases) {
                        *total += n;
                    }
                }
                _ => merged.push(Record::country(
                    record.country.clone(),
                    record.cases.clone(),
                )),
            }
        }

        Dataset {
            header: self.header.clone(),
            records: merged,
        }
    }

    /// Consolidated record of a country, matched case-insensitively
    ///
    /// Regions of the same country are summed first, so the result always covers
    /// the whole country.
    pub fn filter(&self, country: &str) -> Option<Record> {
        let wanted = country.to_lowercase();
        self.reduce()
            .records
            .into_iter()
            .find(|r| r.country.to_lowercase() == wanted)
    }

    /// The `n` countries with the highest latest count, in descending order
    ///
    /// `n` is clamped to the number of countries. Ties keep country-name order.
    pub fn top_n(&self, n: usize) -> Dataset {
        let mut reduced = self.reduce();
        reduced
            .records
            .sort_by(|a, b| b.latest().cmp(&a.latest()));
        reduced.records.truncate(n);
        reduced
    }

    /// [`Dataset::top_n`] as numbered ranking lines
    pub fn ranking(&self, n: usize) -> Vec<Ranking> {
        self.top_n(n)
            .records
            .into_iter()
            .enumerate()
            .map(|(i, r)| Ranking {
                rank: i + 1,
                latest: r.latest().unwrap_or_default(),
                country: r.country,
            })
            .collect()
    }
}

impl Datasets {
    /// Global summary of every dataset, in reporting order
    pub fn summaries(&self) -> Vec<Summary> {
        CaseType::ALL
            .into_iter()
            .filter_map(|case| self.get(case).summary(case))
            .collect()
    }

    /// Consolidated records of one country across all datasets
    ///
    /// # Errors
    /// [`Error::CountryNotFound`] if any dataset lacks the country.
    pub fn country(&self, name: &str) -> Result<CountryView> {
        let series = CaseType::ALL
            .into_iter()
            .map(|case| {
                self.get(case)
                    .filter(name)
                    .map(|record| (case, record))
                    .ok_or_else(|| Error::CountryNotFound(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let country = series
            .first()
            .map(|(_, r)| r.country.clone())
            .unwrap_or_else(|| name.to_string());
        Ok(CountryView { country, series })
    }
}
