//! Runtime configuration read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration error; fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Listen address
    pub bind: SocketAddr,
    /// Directory holding generated markdown artifacts
    pub output_dir: PathBuf,
    /// Remote agent endpoint; `None` means every job fails as unconfigured
    pub agent_url: Option<String>,
    /// Bearer token for the agent
    pub agent_api_key: Option<String>,
    /// HTTP timeout for a single agent call
    pub agent_timeout: Duration,
    /// Upper bound for a whole job
    pub job_timeout: Duration,
    /// Jobs allowed to run at once
    pub max_concurrent_jobs: usize,
    /// Retention for terminal jobs; `None` keeps them forever
    pub job_ttl: Option<Duration>,
    /// How often expired jobs are swept
    pub sweep_interval: Duration,
    /// Allowed CORS origin; `None` allows any
    pub cors_origin: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            output_dir: PathBuf::from("output"),
            agent_url: None,
            agent_api_key: None,
            agent_timeout: Duration::from_secs(300),
            job_timeout: Duration::from_secs(600),
            max_concurrent_jobs: 4,
            job_ttl: None,
            sweep_interval: Duration::from_secs(60),
            cors_origin: None,
        }
    }
}

impl ApiConfig {
    /// Read `DOCFORGE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let bind = match get("DOCFORGE_BIND") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "DOCFORGE_BIND",
                expected: "socket address",
                value: v,
            })?,
            None => defaults.bind,
        };

        let max_concurrent_jobs = match get("DOCFORGE_MAX_CONCURRENT_JOBS") {
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DOCFORGE_MAX_CONCURRENT_JOBS",
                        expected: "positive integer",
                        value: v,
                    });
                }
            },
            None => defaults.max_concurrent_jobs,
        };

        Ok(Self {
            bind,
            output_dir: get("DOCFORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            agent_url: get("DOCFORGE_AGENT_URL"),
            agent_api_key: get("DOCFORGE_AGENT_API_KEY"),
            agent_timeout: seconds(&get, "DOCFORGE_AGENT_TIMEOUT_SECS")?
                .unwrap_or(defaults.agent_timeout),
            job_timeout: seconds(&get, "DOCFORGE_JOB_TIMEOUT_SECS")?.unwrap_or(defaults.job_timeout),
            max_concurrent_jobs,
            job_ttl: seconds(&get, "DOCFORGE_JOB_TTL_SECS")?,
            sweep_interval: seconds(&get, "DOCFORGE_SWEEP_INTERVAL_SECS")?
                .unwrap_or(defaults.sweep_interval),
            cors_origin: get("DOCFORGE_CORS_ORIGIN"),
        })
    }
}

fn seconds(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match get(var) {
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(ConfigError::Invalid {
                var,
                expected: "positive number of seconds",
                value: v,
            }),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config_from(&[]).unwrap(), ApiConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config_from(&[
            ("DOCFORGE_BIND", "127.0.0.1:9000"),
            ("DOCFORGE_OUTPUT_DIR", "/tmp/docs"),
            ("DOCFORGE_AGENT_URL", "http://agent:8000/extract"),
            ("DOCFORGE_AGENT_API_KEY", "k"),
            ("DOCFORGE_AGENT_TIMEOUT_SECS", "30"),
            ("DOCFORGE_JOB_TIMEOUT_SECS", "90"),
            ("DOCFORGE_MAX_CONCURRENT_JOBS", "2"),
            ("DOCFORGE_JOB_TTL_SECS", "3600"),
            ("DOCFORGE_SWEEP_INTERVAL_SECS", "10"),
            ("DOCFORGE_CORS_ORIGIN", "http://localhost:3000"),
        ])
        .unwrap();

        assert_eq!(cfg.bind, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(cfg.agent_url.as_deref(), Some("http://agent:8000/extract"));
        assert_eq!(cfg.agent_api_key.as_deref(), Some("k"));
        assert_eq!(cfg.agent_timeout, Duration::from_secs(30));
        assert_eq!(cfg.job_timeout, Duration::from_secs(90));
        assert_eq!(cfg.max_concurrent_jobs, 2);
        assert_eq!(cfg.job_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(cfg.sweep_interval, Duration::from_secs(10));
        assert_eq!(cfg.cors_origin.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn blank_values_are_unset() {
        let cfg = config_from(&[("DOCFORGE_AGENT_URL", "  "), ("DOCFORGE_JOB_TTL_SECS", "")]).unwrap();
        assert!(cfg.agent_url.is_none());
        assert!(cfg.job_ttl.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("DOCFORGE_BIND", "localhost")]),
            Err(ConfigError::Invalid { var: "DOCFORGE_BIND", .. })
        ));
        assert!(matches!(
            config_from(&[("DOCFORGE_MAX_CONCURRENT_JOBS", "0")]),
            Err(ConfigError::Invalid { var: "DOCFORGE_MAX_CONCURRENT_JOBS", .. })
        ));
        assert!(matches!(
            config_from(&[("DOCFORGE_JOB_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid { var: "DOCFORGE_JOB_TIMEOUT_SECS", .. })
        ));
    }
}
