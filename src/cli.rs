//! Command-line surface of the `covid` binary
//!
//! [`Args`] only parameterizes the library: which config to start from, whether
//! caching and persistence are engaged, and which report sections are printed.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, warn};

use crate::config::{Config, StorageConfig};
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::remote::{GitHubClient, ResponseCache};
use crate::report::{ReportStyle, Reporter};
use crate::types::{CaseType, Datasets};

/// Shows number of COVID-19 cases
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "covid", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Args {
    /// Enable request caching (default)
    #[arg(short = 'e', long = "cache", overrides_with = "no_cache")]
    pub cache: bool,

    /// Disable request caching
    #[arg(long = "no-cache", overrides_with = "cache")]
    pub no_cache: bool,

    /// Country to show number of cases for
    #[arg(short = 'c', long = "country", value_name = "NAME")]
    pub country: Option<String>,

    /// Plot graphs, only if a country is selected
    #[arg(short = 'g', long = "graph")]
    pub graph: bool,

    /// Save/overwrite raw data files in the working directory (default)
    #[arg(short = 's', long = "save", overrides_with = "no_save")]
    pub save: bool,

    /// Do not write raw data files
    #[arg(long = "no-save", overrides_with = "save")]
    pub no_save: bool,

    /// Top countries by most confirmed cases
    #[arg(short = 't', long = "top-confirmed")]
    pub top_confirmed: bool,

    /// Top countries by most dead cases
    #[arg(long = "top-dead")]
    pub top_dead: bool,

    /// Top countries by most recovered cases
    #[arg(long = "top-recovered")]
    pub top_recovered: bool,

    /// Number of countries in rankings
    #[arg(short = 'n', long = "top", value_name = "N")]
    pub top: Option<usize>,

    /// More verbose operation information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Working directory for raw data and the response cache
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GitHub API token
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Args {
    /// Build the effective configuration: the config file (or defaults) with the
    /// flags given on the command line applied on top
    ///
    /// # Errors
    /// Unreadable or invalid config file, or an invalid resulting configuration.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if self.cache {
            config.storage.cache_enabled = true;
        } else if self.no_cache {
            config.storage.cache_enabled = false;
        }
        if self.save {
            config.storage.persist_raw = true;
        } else if self.no_save {
            config.storage.persist_raw = false;
        }
        if let Some(dir) = &self.work_dir {
            config.storage.work_dir = dir.clone();
        }
        if let Some(n) = self.top {
            config.report.top_n = n;
        }
        if let Some(token) = &self.token {
            config.remote.token = Some(token.clone());
        }
        if self.no_color {
            config.report.color = false;
        }

        config.validate()?;
        Ok(config)
    }

    /// Ranking sections requested, in reporting order
    pub fn rankings(&self) -> Vec<CaseType> {
        [
            (self.top_confirmed, CaseType::Confirmed),
            (self.top_dead, CaseType::Dead),
            (self.top_recovered, CaseType::Recovered),
        ]
        .into_iter()
        .filter_map(|(wanted, case)| wanted.then_some(case))
        .collect()
    }
}

/// Fetch all datasets according to `config` and write the requested report to `out`
///
/// # Errors
/// Any fatal pipeline error, or [`Error::CountryNotFound`](crate::Error::CountryNotFound)
/// when the selected country is missing. The global summary has already been
/// written in the latter case.
pub async fn run<W: Write>(args: &Args, config: &Config, out: W) -> Result<()> {
    prepare_work_dir(&config.storage).await;

    let mut client = GitHubClient::new(&config.remote)?;
    if config.storage.cache_enabled {
        client = client.with_cache(ResponseCache::new(config.storage.cache_dir()));
    }

    let datasets = Pipeline::from_config(config, Arc::new(client)).run().await?;
    report(args, config, &datasets, out)
}

/// Write the global summary, the selected country and the requested rankings
pub fn report<W: Write>(args: &Args, config: &Config, datasets: &Datasets, out: W) -> Result<()> {
    let mut reporter = Reporter::new(out, ReportStyle::from_config(&config.report));

    reporter.global(datasets)?;

    if let Some(name) = &args.country {
        let view = datasets.country(name)?;
        reporter.country(&view, args.graph)?;
    }

    for case in args.rankings() {
        reporter.ranking(case, datasets.get(case), config.report.top_n)?;
    }

    reporter.into_inner().flush()?;
    Ok(())
}

/// Line printed on stderr when a run ends with `error`
///
/// Fatal errors are prefixed with `error:`; a recoverable one (an unknown country)
/// is reported as-is after a blank line, following the printed summary.
pub fn failure_message(error: &Error) -> String {
    if error.is_fatal() {
        format!("error: {}", error)
    } else {
        format!("\n{}", error)
    }
}

/// Create the working directory when anything will be written to it
///
/// Failure is only logged; persistence reports its own error if it cannot write.
async fn prepare_work_dir(storage: &StorageConfig) {
    if !storage.persist_raw && !storage.cache_enabled {
        return;
    }
    match tokio::fs::create_dir_all(&storage.work_dir).await {
        Ok(()) => debug!(path = %storage.work_dir.display(), "working directory ready"),
        Err(e) => warn!(
            path = %storage.work_dir.display(),
            error = %e,
            "could not create working directory"
        ),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dataset, Record};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("covid").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_keep_cache_and_save_enabled() {
        let config = parse(&[]).to_config().unwrap();
        assert!(config.storage.cache_enabled);
        assert!(config.storage.persist_raw);
        assert_eq!(config.report.top_n, 10);
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&[
            "--no-cache",
            "--no-save",
            "-n",
            "3",
            "--work-dir",
            "/tmp/covid-test",
            "--no-color",
            "-c",
            "Italy",
            "-g",
        ]);
        let config = args.to_config().unwrap();

        assert!(!config.storage.cache_enabled);
        assert!(!config.storage.persist_raw);
        assert_eq!(config.report.top_n, 3);
        assert_eq!(config.storage.work_dir, PathBuf::from("/tmp/covid-test"));
        assert!(!config.report.color);
        assert_eq!(args.country.as_deref(), Some("Italy"));
        assert!(args.graph);
    }

    #[test]
    fn last_of_cache_flags_wins() {
        assert!(parse(&["--no-cache", "--cache"]).to_config().unwrap().storage.cache_enabled);
        assert!(!parse(&["-e", "--no-cache"]).to_config().unwrap().storage.cache_enabled);
    }

    #[test]
    fn flags_apply_on_top_of_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covid.json");
        std::fs::write(
            &path,
            r#"{"storage": {"cache_enabled": false}, "report": {"top_n": 5}}"#,
        )
        .unwrap();

        let config = parse(&["--config", path.to_str().unwrap()]).to_config().unwrap();
        assert!(!config.storage.cache_enabled);
        assert_eq!(config.report.top_n, 5);

        let config = parse(&["--config", path.to_str().unwrap(), "-e", "-n", "7"])
            .to_config()
            .unwrap();
        assert!(config.storage.cache_enabled);
        assert_eq!(config.report.top_n, 7);
    }

    #[test]
    fn zero_ranking_size_is_rejected() {
        assert!(matches!(
            parse(&["-n", "0"]).to_config(),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn rankings_follow_reporting_order() {
        let args = parse(&["--top-recovered", "-t"]);
        assert_eq!(args.rankings(), vec![CaseType::Confirmed, CaseType::Recovered]);
        assert!(parse(&[]).rankings().is_empty());
    }

    #[test]
    fn failure_message_splits_on_fatality() {
        let missing = Error::CountryNotFound("Atlantis".into());
        assert_eq!(
            failure_message(&missing),
            "\nCountry Atlantis is not in the list"
        );

        let timeout = Error::RemoteTimeout {
            dataset: CaseType::Dead.file_name().into(),
            timeout: std::time::Duration::from_secs(10),
        };
        assert_eq!(
            failure_message(&timeout),
            "error: timed out fetching time_series_covid19_deaths_global.csv after 10s"
        );
    }

    fn datasets() -> Datasets {
        let header: Vec<String> = ["P", "C", "Lat", "Long", "1/1/21", "1/2/21"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let ds = |rows: Vec<Record>| Dataset::new("t.csv", header.clone(), rows).unwrap();
        Datasets {
            confirmed: ds(vec![
                Record::country("Peru", vec![10, 20]),
                Record::country("Chile", vec![30, 40]),
            ]),
            dead: ds(vec![
                Record::country("Peru", vec![1, 2]),
                Record::country("Chile", vec![0, 1]),
            ]),
            recovered: ds(vec![
                Record::country("Peru", vec![0, 5]),
                Record::country("Chile", vec![3, 3]),
            ]),
        }
    }

    #[test]
    fn report_prints_requested_sections() {
        let args = parse(&["-c", "peru", "-t", "--no-color"]);
        let config = args.to_config().unwrap();
        let mut out = Vec::new();

        report(&args, &config, &datasets(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        let globe = out.find("Globe").unwrap();
        let country = out.find("\nPeru\n").unwrap();
        let top = out.find("Top 2 countries by most confirmed cases").unwrap();
        assert!(globe < country && country < top, "{out}");
        assert!(!out.contains("dead cases"));
    }

    #[test]
    fn unknown_country_stops_before_rankings() {
        let args = parse(&["-c", "Atlantis", "-t", "--no-color"]);
        let config = args.to_config().unwrap();
        let mut out = Vec::new();

        let result = report(&args, &config, &datasets(), &mut out);
        assert!(matches!(result, Err(Error::CountryNotFound(ref name)) if name == "Atlantis"));

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Globe"));
        assert!(!out.contains("Top"));
    }
}
