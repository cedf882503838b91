use std::io::Write;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::format::ReportStyle;
use super::plot::plot;
use super::{CountryView, Ranking, Summary};
use crate::error::Result;
use crate::types::{CaseType, Dataset, Datasets, Record};

/// Table row of a ranking
#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Cases")]
    latest: String,
}

/// Writes reports to any [`Write`] sink
pub struct Reporter<W: Write> {
    out: W,
    style: ReportStyle,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter writing to `out`
    pub fn new(out: W, style: ReportStyle) -> Self {
        Self { out, style }
    }

    /// Give back the sink
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Worldwide totals and new cases of every dataset under a "Globe" heading,
    /// dated with the latest reporting day when its label parses
    pub fn global(&mut self, datasets: &Datasets) -> Result<()> {
        let heading = match datasets.confirmed.dates().last().copied().flatten() {
            Some(day) => format!("Globe (as of {})", day.format("%Y-%m-%d")),
            None => "Globe".to_string(),
        };
        writeln!(self.out, "{}", self.style.heading().apply_to(heading))?;
        self.summaries(&datasets.summaries())
    }

    /// Totals of one country, followed by its trend plots when `graph` is set
    pub fn country(&mut self, view: &CountryView, graph: bool) -> Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{}",
            self.style.heading().apply_to(&view.country)
        )?;
        self.summaries(&view.summaries())?;

        if graph {
            for (case, record) in &view.series {
                self.graph(*case, record)?;
            }
        }
        Ok(())
    }

    /// Trend plot of one record, captioned `<country> - <Case type>`
    pub fn graph(&mut self, case: CaseType, record: &Record) -> Result<()> {
        let series: Vec<f64> = record.cases.iter().map(|n| *n as f64).collect();
        let chart = plot(
            &series,
            self.style.graph_width,
            self.style.graph_height,
            &format!("{} - {}", record.country, case.label()),
        );
        writeln!(self.out)?;
        writeln!(self.out, "{}", self.style.case(case).apply_to(chart))?;
        Ok(())
    }

    /// Top `n` countries of `dataset` by latest count
    pub fn ranking(&mut self, case: CaseType, dataset: &Dataset, n: usize) -> Result<()> {
        let ranking = dataset.ranking(n);
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{}",
            self.style.heading().apply_to(format!(
                "Top {} countries by most {} cases",
                ranking.len(),
                case.label().to_lowercase()
            ))
        )?;
        writeln!(self.out, "{}", self.ranking_table(&ranking))?;
        Ok(())
    }

    fn ranking_table(&self, ranking: &[Ranking]) -> Table {
        let rows = ranking.iter().map(|r| RankingRow {
            rank: r.rank,
            country: r.country.clone(),
            latest: self.style.number(r.latest),
        });
        let mut table = Table::new(rows);
        table.with(Style::blank());
        table
    }

    /// `Label: total  New: delta`, totals right-aligned in one column
    fn summaries(&mut self, summaries: &[Summary]) -> Result<()> {
        let totals: Vec<String> = summaries
            .iter()
            .map(|s| self.style.number(s.total))
            .collect();
        let width = totals.iter().map(|t| t.chars().count()).max().unwrap_or(0);

        for (summary, total) in summaries.iter().zip(&totals) {
            let paint = self.style.case(summary.case);
            let new = summary
                .new
                .map(|n| self.style.number(n))
                .unwrap_or_else(|| "n/a".to_string());
            writeln!(
                self.out,
                "{:<11}{}  New: {}",
                format!("{}:", summary.case.label()),
                paint.apply_to(format!("{:>width$}", total)),
                paint.apply_to(new),
            )?;
        }
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(&str, &[i64])]) -> Dataset {
        let days = rows.first().map(|(_, c)| c.len()).unwrap_or(1);
        let mut header: Vec<String> = ["Province/State", "Country/Region", "Lat", "Long"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend((0..days).map(|d| format!("4/{}/20", d + 1)));
        let records = rows
            .iter()
            .map(|(country, cases)| Record::country(*country, cases.to_vec()))
            .collect();
        Dataset::new("t.csv", header, records).unwrap()
    }

    fn datasets() -> Datasets {
        Datasets {
            confirmed: dataset(&[("Italy", &[1000, 2500]), ("Chad", &[1, 3])]),
            dead: dataset(&[("Italy", &[10, 40]), ("Chad", &[0, 0])]),
            recovered: dataset(&[("Italy", &[5, 7]), ("Chad", &[1, 1])]),
        }
    }

    fn render(f: impl FnOnce(&mut Reporter<Vec<u8>>) -> Result<()>) -> String {
        let mut reporter = Reporter::new(Vec::new(), ReportStyle::default().plain());
        f(&mut reporter).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn global_lists_totals_and_new_cases() {
        let out = render(|r| r.global(&datasets()));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Globe (as of 2020-04-02)");
        assert_eq!(lines[1], "Confirmed: 2,503  New: 1,502");
        assert_eq!(lines[2], "Dead:         40  New: 30");
        assert_eq!(lines[3], "Recovered:     8  New: 2");
    }

    #[test]
    fn multibyte_separator_keeps_totals_aligned() {
        let style = ReportStyle {
            thousands_separator: '\u{202f}',
            ..ReportStyle::default().plain()
        };
        let mut reporter = Reporter::new(Vec::new(), style);
        reporter.global(&datasets()).unwrap();
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[1], "Confirmed: 2\u{202f}503  New: 1\u{202f}502");
        assert_eq!(lines[2], "Dead:         40  New: 30");
        let new_column: Vec<usize> = lines[1..4]
            .iter()
            .map(|l| l.chars().take_while(|c| *c != 'N').count())
            .collect();
        assert!(new_column.windows(2).all(|w| w[0] == w[1]), "{out}");
    }

    #[test]
    fn country_section_with_graphs() {
        let view = datasets().country("italy").unwrap();
        let out = render(|r| r.country(&view, true));

        assert!(out.starts_with("\nItaly\n"), "{out}");
        assert!(out.contains("Confirmed: 2,500  New: 1,500"));
        assert!(out.contains("Italy - Confirmed"));
        assert!(out.contains("Italy - Dead"));
        assert!(out.contains("Italy - Recovered"));
    }

    #[test]
    fn country_section_without_graphs() {
        let view = datasets().country("Chad").unwrap();
        let out = render(|r| r.country(&view, false));
        assert!(!out.contains(" - "), "{out}");
    }

    #[test]
    fn ranking_heading_reflects_clamped_size() {
        let out = render(|r| r.ranking(CaseType::Dead, &datasets().dead, 10));

        assert!(out.contains("Top 2 countries by most dead cases"), "{out}");
        let italy = out.find("Italy").unwrap();
        let chad = out.find("Chad").unwrap();
        assert!(italy < chad);
        assert!(out.contains("40"));
    }

    #[test]
    fn colored_output_contains_escape_codes() {
        let style = ReportStyle {
            color: true,
            ..ReportStyle::default()
        };
        let mut reporter = Reporter::new(Vec::new(), style);
        reporter.global(&datasets()).unwrap();
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.contains("\u{1b}["));
    }
}
