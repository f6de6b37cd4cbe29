//! Portal configuration, read from the environment (and `.env` via dotenvy).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PortalError, PortalResult};
use crate::session::RestorePolicy;

pub const DEFAULT_ROOT_DOMAIN: &str = "xyz.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Domain tenants are served under (`{slug}.{root_domain}`).
    pub root_domain: String,
    /// Fixed API base URL; when unset it is derived from the host.
    pub api_url: Option<String>,
    pub token_path: PathBuf,
    /// Where the selected tenant id is remembered between runs.
    pub tenant_path: PathBuf,
    pub request_timeout: Duration,
    pub restore_policy: RestorePolicy,
    pub log_format: LogFormat,
    /// Daily-rolling log files go here instead of stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            root_domain: DEFAULT_ROOT_DOMAIN.into(),
            api_url: None,
            token_path: PathBuf::from(".lms_token"),
            tenant_path: PathBuf::from(".lms_tenant"),
            request_timeout: Duration::from_secs(10),
            restore_policy: RestorePolicy::ClearOnAnyFailure,
            log_format: LogFormat::Text,
            log_dir: None,
        }
    }
}

impl PortalConfig {
    /// Loads `.env` if present, then reads `LMS_*` variables over the defaults.
    pub fn from_env() -> PortalResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> PortalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(domain) = lookup("LMS_ROOT_DOMAIN") {
            config.root_domain = parse_root_domain(&domain)?;
        }
        if let Some(url) = lookup("LMS_API_URL").filter(|u| !u.trim().is_empty()) {
            config.apply_overrides(Some(&url), None)?;
        }
        if let Some(path) = lookup("LMS_TOKEN_PATH") {
            config.token_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("LMS_TENANT_PATH") {
            config.tenant_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("LMS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                PortalError::Config(format!("LMS_REQUEST_TIMEOUT_SECS is not a number: {secs:?}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = lookup("LMS_KEEP_TOKEN_ON_NETWORK_ERROR") {
            if parse_bool("LMS_KEEP_TOKEN_ON_NETWORK_ERROR", &flag)? {
                config.restore_policy = RestorePolicy::KeepOnTransient;
            }
        }
        if let Some(format) = lookup("LMS_LOG_FORMAT") {
            config.log_format = match format.trim().to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(PortalError::Config(format!(
                        "LMS_LOG_FORMAT must be text or json, got {other:?}"
                    )))
                }
            };
        }
        if let Some(dir) = lookup("LMS_LOG_DIR").filter(|d| !d.trim().is_empty()) {
            config.log_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Applies command-line overrides with the same checks as the environment.
    pub fn apply_overrides(
        &mut self,
        api_url: Option<&str>,
        root_domain: Option<&str>,
    ) -> PortalResult<()> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url.trim().trim_end_matches('/').to_owned());
        }
        if let Some(domain) = root_domain {
            self.root_domain = parse_root_domain(domain)?;
        }
        Ok(())
    }
}

/// Lower-cases `raw` and strips outer dots; the result must still contain a dot.
pub fn parse_root_domain(raw: &str) -> PortalResult<String> {
    let domain = raw.trim().trim_matches('.').to_ascii_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return Err(PortalError::Config(format!(
            "root domain must be a dotted domain, got {domain:?}"
        )));
    }
    Ok(domain)
}

fn parse_bool(key: &str, value: &str) -> PortalResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(PortalError::Config(format!("{key} is not a boolean: {other:?}"))),
    }
}
