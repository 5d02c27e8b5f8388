use std::{env, fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

/// What to do when the same `(user_id, item_id)` pair is rated more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// the record seen last wins
    #[default]
    LastWrite,
    /// average of every rating given to the pair
    Mean,
}

impl FromStr for DuplicatePolicy {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_write" | "last-write" | "last" => Ok(DuplicatePolicy::LastWrite),
            "mean" | "avg" => Ok(DuplicatePolicy::Mean),
            other => Err(RecommendError::Config(format!("unknown duplicate policy `{other}`"))),
        }
    }
}

/// Recommender settings
///
/// Layered as defaults, then a JSON file, then `RECOMMENDER_*` environment
/// variables. CLI flags go on top in the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// number of items returned per request
    pub top_n: usize,
    pub duplicate_policy: DuplicatePolicy,
    /// item count from which similarity is computed on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            duplicate_policy: DuplicatePolicy::LastWrite,
            parallel_threshold: 64,
        }
    }
}

impl RecommenderConfig {
    /// Read a JSON config file. Absent keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw)
            .map_err(|e| RecommendError::Config(format!("{}: {e}", path.as_ref().display())))
    }

    /// Apply `RECOMMENDER_TOP_N`, `RECOMMENDER_DUPLICATE_POLICY` and
    /// `RECOMMENDER_PARALLEL_THRESHOLD` when set.
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| env::var(key).ok())
    }

    fn with_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RECOMMENDER_TOP_N") {
            self.top_n = parse_usize("RECOMMENDER_TOP_N", &v)?;
        }
        if let Some(v) = lookup("RECOMMENDER_DUPLICATE_POLICY") {
            self.duplicate_policy = v.parse()?;
        }
        if let Some(v) = lookup("RECOMMENDER_PARALLEL_THRESHOLD") {
            self.parallel_threshold = parse_usize("RECOMMENDER_PARALLEL_THRESHOLD", &v)?;
        }
        Ok(self)
    }

    /// Defaults, optional file, then environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_env()
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| RecommendError::Config(format!("{key} must be a non-negative integer, got `{value}`")))
}
