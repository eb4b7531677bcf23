use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::batch::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::evaluation::decision::DecisionThresholds;

/// Where uploaded CVs go.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// S3 or MinIO.
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Local { root: PathBuf },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// `None` runs with in-memory repositories.
    pub database_url: Option<String>,
    pub storage: StorageConfig,
    pub cv_url_expiry: Duration,
    /// Batch and directory intake only read CVs from under this folder.
    pub cv_intake_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub batch_max_concurrent: usize,
    pub thresholds: DecisionThresholds,
    pub job_ranking_limit: usize,
    /// Recipient used for jobs created without an HR email.
    pub hr_notify_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let storage = match get("STORAGE_TYPE")
            .unwrap_or_else(|| "s3".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" | "minio" => StorageConfig::S3 {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            },
            "local" => StorageConfig::Local {
                root: PathBuf::from(
                    get("LOCAL_STORAGE_DIR").unwrap_or_else(|| "./storage".to_string()),
                ),
            },
            other => bail!("STORAGE_TYPE must be 's3' or 'local', got '{other}'"),
        };

        let expiry_hours: u64 = parse_or(&get, "CV_URL_EXPIRY_HOURS", 24)?;
        let config = Config {
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            database_url: get("DATABASE_URL"),
            storage,
            cv_url_expiry: Duration::from_secs(expiry_hours * 3600),
            cv_intake_dir: PathBuf::from(
                get("CV_INTAKE_DIR").unwrap_or_else(|| "./cv_inbox".to_string()),
            ),
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            batch_max_concurrent: parse_or(&get, "BATCH_MAX_CONCURRENT", 5)?,
            thresholds: DecisionThresholds {
                high: parse_or(&get, "HIGH_POTENTIAL_THRESHOLD", 70)?,
                moderate: parse_or(&get, "MODERATE_THRESHOLD", 50)?,
            },
            job_ranking_limit: parse_or(&get, "JOB_RANKING_LIMIT", 50)?,
            hr_notify_email: get("HR_NOTIFY_EMAIL"),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.batch_max_concurrent) {
            bail!(
                "BATCH_MAX_CONCURRENT must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}, got {}",
                self.batch_max_concurrent
            );
        }
        let DecisionThresholds { high, moderate } = self.thresholds;
        if high > 100 || moderate > high {
            bail!("Thresholds must satisfy MODERATE_THRESHOLD <= HIGH_POTENTIAL_THRESHOLD <= 100, got {moderate} and {high}");
        }
        // Presigned S3 URLs are valid for at most 7 days.
        let hours = self.cv_url_expiry.as_secs() / 3600;
        if !(1..=168).contains(&hours) {
            bail!("CV_URL_EXPIRY_HOURS must be between 1 and 168, got {hours}");
        }
        if self.job_ranking_limit == 0 {
            bail!("JOB_RANKING_LIMIT must be at least 1");
        }
        Ok(())
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    const LOCAL: &[(&str, &str)] = &[("ANTHROPIC_API_KEY", "sk-test"), ("STORAGE_TYPE", "local")];

    #[test]
    fn test_defaults_for_local_storage() {
        let config = config(LOCAL).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.batch_max_concurrent, 5);
        assert_eq!(config.thresholds, DecisionThresholds::default());
        assert_eq!(config.job_ranking_limit, 50);
        assert_eq!(config.cv_url_expiry, Duration::from_secs(24 * 3600));
        assert!(config.database_url.is_none());
        assert_eq!(config.cv_intake_dir, PathBuf::from("./cv_inbox"));
        assert_eq!(
            config.storage,
            StorageConfig::Local {
                root: PathBuf::from("./storage")
            }
        );
    }

    #[test]
    fn test_intake_dir_is_configurable() {
        let mut pairs = LOCAL.to_vec();
        pairs.push(("CV_INTAKE_DIR", "/srv/cvs"));
        assert_eq!(config(&pairs).unwrap().cv_intake_dir, PathBuf::from("/srv/cvs"));
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = config(&[("STORAGE_TYPE", "local")]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_s3_requires_bucket_settings() {
        let err = config(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let config = config(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("S3_BUCKET", "cvs"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("AWS_ACCESS_KEY_ID", "minio"),
            ("AWS_SECRET_ACCESS_KEY", "minio123"),
        ])
        .unwrap();
        assert!(matches!(config.storage, StorageConfig::S3 { ref bucket, .. } if bucket == "cvs"));
    }

    #[test]
    fn test_concurrency_out_of_range_is_rejected() {
        let mut pairs = LOCAL.to_vec();
        pairs.push(("BATCH_MAX_CONCURRENT", "21"));
        assert!(config(&pairs).is_err());
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let mut pairs = LOCAL.to_vec();
        pairs.push(("HIGH_POTENTIAL_THRESHOLD", "40"));
        assert!(config(&pairs).is_err());
    }

    #[test]
    fn test_malformed_number_names_the_key() {
        let mut pairs = LOCAL.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = config(&pairs).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
