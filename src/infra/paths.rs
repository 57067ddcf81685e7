// src/infra/paths.rs - Config and snapshot locations
//
// JUDGEBENCH_HOME overrides the config directory for isolation (CI, tests).
// When unset, config lives in ~/.judgebench/.

use std::path::PathBuf;

/// Default location of the summary snapshot read by the dashboard.
pub const DEFAULT_SNAPSHOT_PATH: &str = "site/summary.json";

fn judgebench_home() -> Option<PathBuf> {
    std::env::var_os("JUDGEBENCH_HOME").map(PathBuf::from)
}

/// Configuration directory: $JUDGEBENCH_HOME/ or ~/.judgebench/
pub fn config_dir() -> Option<PathBuf> {
    if let Some(home) = judgebench_home() {
        return Some(home);
    }
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".judgebench"))
}

/// Config file path, if a home directory can be determined.
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
