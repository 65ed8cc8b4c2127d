// Configuration: where the two data files live.
//
// Values come from built-in defaults, then an optional JSON file in the
// user's config directory, then `JOB_SEEKER_*` environment variables. The
// binary may override the data directory from the command line.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "JOB_SEEKER_DATA_DIR";
pub const JOB_FILE_VAR: &str = "JOB_SEEKER_JOB_FILE";
pub const POC_FILE_VAR: &str = "JOB_SEEKER_POC_FILE";

/// Data directory and file names. Missing keys in a config file keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub job_file: String,
    pub poc_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            job_file: "jobs.txt".into(),
            poc_file: "pocs.txt".into(),
        }
    }
}

impl Config {
    /// Build the configuration from the config file (if any) and the
    /// process environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// `<config dir>/job_seeker/config.json`, when the platform has a
    /// config directory.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("job_seeker").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Override fields from variables returned by `lookup`. Empty values
    /// are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(dir) = get(DATA_DIR_VAR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(name) = get(JOB_FILE_VAR) {
            self.job_file = name;
        }
        if let Some(name) = get(POC_FILE_VAR) {
            self.poc_file = name;
        }
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn job_path(&self) -> PathBuf {
        self.data_dir.join(&self.job_file)
    }

    pub fn poc_path(&self) -> PathBuf {
        self.data_dir.join(&self.poc_file)
    }
}
