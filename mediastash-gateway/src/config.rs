//! Store configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const ENV_ENDPOINT: &str = "S3_ENDPOINT";
const ENV_REGION: &str = "S3_REGION";
const ENV_BUCKET: &str = "S3_BUCKET";
const ENV_ACCESS_KEY: &str = "S3_ACCESS_KEY";
const ENV_SECRET_KEY: &str = "S3_SECRET_KEY";
const ENV_PATH_STYLE: &str = "S3_PATH_STYLE";
const ENV_CA_BUNDLE: &str = "S3_CA_BUNDLE";
const ENV_CONNECT_TIMEOUT: &str = "S3_CONNECT_TIMEOUT";
const ENV_REQUEST_TIMEOUT: &str = "S3_REQUEST_TIMEOUT";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("Cannot read CA bundle {}", .path.display())]
    CaBundleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CA bundle {} was rejected: {reason}", .path.display())]
    CaBundleInvalid { path: PathBuf, reason: String },
}

/// Connection settings for the backing object store
///
/// Values come from `S3_*` environment variables; absence of a required
/// one is a startup-time failure, never a per-call one.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Endpoint URL of the S3-compatible store
    pub endpoint: String,
    /// Signing region; self-hosted stores accept nearly any name
    pub region: String,
    /// Bucket holding every object this gateway touches
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Path-style addressing (`endpoint/bucket/key`); on by default since
    /// self-hosted stores rarely resolve virtual-hosted bucket names
    pub path_style: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Optional PEM bundle that replaces the system roots as the trust
    /// store for this one client
    pub ca_bundle: Option<PathBuf>,
}

impl StoreConfig {
    /// Build a config with default region, addressing, and timeouts
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: DEFAULT_REGION.to_string(),
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            path_style: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ca_bundle: None,
        }
    }

    /// Load and validate a config from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            require(ENV_ENDPOINT)?,
            require(ENV_BUCKET)?,
            require(ENV_ACCESS_KEY)?,
            require(ENV_SECRET_KEY)?,
        );
        if let Some(region) = optional(ENV_REGION) {
            config.region = region;
        }
        if let Some(raw) = optional(ENV_PATH_STYLE) {
            config.path_style = parse_bool(ENV_PATH_STYLE, &raw)?;
        }
        if let Some(raw) = optional(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout = parse_secs(ENV_CONNECT_TIMEOUT, &raw)?;
        }
        if let Some(raw) = optional(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = parse_secs(ENV_REQUEST_TIMEOUT, &raw)?;
        }
        config.ca_bundle = optional(ENV_CA_BUNDLE).map(PathBuf::from);
        config.validate()?;
        Ok(config)
    }

    /// Check endpoint, bucket, and credential well-formedness
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: ENV_ENDPOINT,
                reason: format!("must be an http(s) URL, got {:?}", self.endpoint),
            });
        }
        // S3 bucket names: 3-63 characters, DNS-compatible
        if self.bucket.len() < 3 || self.bucket.len() > 63 {
            return Err(ConfigError::InvalidValue {
                var: ENV_BUCKET,
                reason: "bucket name must be 3-63 characters".to_string(),
            });
        }
        if !self
            .bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        {
            return Err(ConfigError::InvalidValue {
                var: ENV_BUCKET,
                reason: format!(
                    "bucket name may only contain lowercase letters, digits, '-' and '.', got {:?}",
                    self.bucket
                ),
            });
        }
        if self.region.is_empty() {
            return Err(ConfigError::InvalidValue {
                var: ENV_REGION,
                reason: "region must be non-empty".to_string(),
            });
        }
        if self.access_key.is_empty() {
            return Err(ConfigError::MissingVar(ENV_ACCESS_KEY));
        }
        if self.secret_key.is_empty() {
            return Err(ConfigError::MissingVar(ENV_SECRET_KEY));
        }
        Ok(())
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}

fn optional(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|err| ConfigError::InvalidValue {
        var,
        reason: err.to_string(),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            var,
            reason: "timeout must be positive".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StoreConfig {
        StoreConfig::new("https://stash.example.net", "media", "access", "secret")
    }

    #[test]
    fn test_defaults() {
        let c = config();
        assert_eq!(c.region, DEFAULT_REGION);
        assert!(c.path_style);
        assert_eq!(c.connect_timeout, Duration::from_secs(10));
        assert_eq!(c.request_timeout, Duration::from_secs(300));
        assert!(c.ca_bundle.is_none());
        c.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut c = config();
        c.endpoint = "stash.example.net".to_string();
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidValue { var: "S3_ENDPOINT", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_bucket() {
        let mut c = config();
        c.bucket = "ab".to_string();
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidValue { var: "S3_BUCKET", .. })
        ));

        c.bucket = "Uppercase".to_string();
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidValue { var: "S3_BUCKET", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let mut c = config();
        c.secret_key = String::new();
        assert!(matches!(c.validate(), Err(ConfigError::MissingVar("S3_SECRET_KEY"))));
    }

    // Process-wide env mutation lives in this one test; no other test in
    // the binary reads these variables.
    #[test]
    fn test_from_env_requires_each_var() {
        let required = [
            (ENV_ENDPOINT, "http://localhost:9000"),
            (ENV_BUCKET, "media"),
            (ENV_ACCESS_KEY, "access"),
            (ENV_SECRET_KEY, "secret"),
        ];
        for var in [
            ENV_REGION,
            ENV_PATH_STYLE,
            ENV_CA_BUNDLE,
            ENV_CONNECT_TIMEOUT,
            ENV_REQUEST_TIMEOUT,
        ] {
            env::remove_var(var);
        }
        for (var, value) in required {
            env::set_var(var, value);
        }

        env::remove_var(ENV_SECRET_KEY);
        assert!(matches!(
            StoreConfig::from_env(),
            Err(ConfigError::MissingVar("S3_SECRET_KEY"))
        ));

        // A blank value counts as missing, same as an unset variable.
        env::set_var(ENV_SECRET_KEY, "  ");
        assert!(matches!(
            StoreConfig::from_env(),
            Err(ConfigError::MissingVar("S3_SECRET_KEY"))
        ));

        env::set_var(ENV_SECRET_KEY, "secret");
        let c = StoreConfig::from_env().unwrap();
        assert_eq!(c.endpoint, "http://localhost:9000");
        assert_eq!(c.bucket, "media");
        assert_eq!(c.region, DEFAULT_REGION);
        assert!(c.path_style);

        for (var, _) in required {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_bool_accepts_common_spellings() {
        for raw in ["1", "true", "YES", "On"] {
            assert!(parse_bool("S3_PATH_STYLE", raw).unwrap());
        }
        for raw in ["0", "false", "no", "OFF"] {
            assert!(!parse_bool("S3_PATH_STYLE", raw).unwrap());
        }
        assert!(parse_bool("S3_PATH_STYLE", "maybe").is_err());
    }

    #[test]
    fn test_parse_secs_rejects_zero_and_garbage() {
        assert_eq!(
            parse_secs("S3_CONNECT_TIMEOUT", "15").unwrap(),
            Duration::from_secs(15)
        );
        assert!(parse_secs("S3_CONNECT_TIMEOUT", "0").is_err());
        assert!(parse_secs("S3_CONNECT_TIMEOUT", "soon").is_err());
    }
}
