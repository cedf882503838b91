//! Configuration helpers for end-to-end tests

use std::time::Duration;

use covid_cases::Config;
use tempfile::TempDir;
use wiremock::MockServer;

/// Configuration pointing at `server`, storing everything in a fresh temp dir
///
/// The temp dir must be kept alive for the duration of the test.
pub fn config_for(server: &MockServer) -> (Config, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.remote.api_url = server.uri();
    config.remote.timeout = Duration::from_secs(5);
    config.storage.work_dir = temp_dir.path().join("covid");
    config.report.color = false;
    (config, temp_dir)
}
