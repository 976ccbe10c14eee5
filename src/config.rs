//! Runtime settings read from the environment (and `.env` when present).

use std::env;

use anyhow::Context;

use crate::seed::STUDENT_NAMES;

pub const DEFAULT_LOG_LEVEL: &str = "attendance_tracker=warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Seed for reproducible mock data; random when unset.
    pub seed: Option<u64>,
    pub student_count: usize,
    pub threshold: u32,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            student_count: STUDENT_NAMES.len(),
            threshold: 75,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let seed = lookup("ATTENDANCE_SEED")
            .map(|value| value.trim().parse::<u64>())
            .transpose()
            .context("ATTENDANCE_SEED must be an unsigned integer")?;

        let student_count = lookup("STUDENT_COUNT")
            .map(|value| value.trim().parse::<usize>())
            .transpose()
            .context("STUDENT_COUNT must be an unsigned integer")?
            .map(|count| count.min(STUDENT_NAMES.len()))
            .unwrap_or(defaults.student_count);

        let threshold = lookup("ATTENDANCE_THRESHOLD")
            .map(|value| value.trim().parse::<u32>())
            .transpose()
            .context("ATTENDANCE_THRESHOLD must be a percentage")?
            .unwrap_or(defaults.threshold);
        if threshold > 100 {
            anyhow::bail!("ATTENDANCE_THRESHOLD must be between 0 and 100, got {threshold}");
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Self {
            seed,
            student_count,
            threshold,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.student_count, 60);
        assert_eq!(config.threshold, 75);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ATTENDANCE_SEED", "42"),
            ("STUDENT_COUNT", "12"),
            ("ATTENDANCE_THRESHOLD", "60"),
            ("LOG_LEVEL", "attendance_tracker=debug"),
        ]))
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.student_count, 12);
        assert_eq!(config.threshold, 60);
        assert_eq!(config.log_level, "attendance_tracker=debug");
    }

    #[test]
    fn student_count_is_capped() {
        let config = Config::from_lookup(lookup(&[("STUDENT_COUNT", "1000")])).unwrap();
        assert_eq!(config.student_count, 60);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(Config::from_lookup(lookup(&[("ATTENDANCE_SEED", "abc")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ATTENDANCE_THRESHOLD", "120")])).is_err());
    }
}
