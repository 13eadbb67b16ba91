use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use sweep_core::ConfigError;

pub const DEFAULT_CONFIG: &str = "serials.yaml";

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub targets: Option<PathBuf>,
    pub credentials: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub scheme: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: Option<RunConfig>,
}

/// Load `path`, or `./serials.yaml` when no path is given and that file exists.
/// An explicitly named file that is missing is an error; an absent default is not.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).map_err(|e| ConfigError::ConfigInvalid { path: path.clone(), message: e.to_string() })?;
    parse_config(&path, &s).map(Some)
}

pub fn parse_config(path: &Path, s: &str) -> Result<Config, ConfigError> {
    if s.trim().is_empty() { return Ok(Config::default()); }
    serde_yaml::from_str(s).map_err(|e| ConfigError::ConfigInvalid { path: path.to_path_buf(), message: e.to_string() })
}
