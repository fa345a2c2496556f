//! Environment-driven configuration for both handlers.
//!
//! Values are read once per cold start. Loading goes through a lookup
//! function so tests never touch the process environment.

use std::path::PathBuf;
use std::time::Duration;

use dcp_glue_core::script_template::ScriptParameters;
use dcp_glue_core::storage_keys::SCRIPT_FILENAME;

use crate::adapters::callback::CallbackMethod;
use crate::error::ConfigError;

pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResourceConfig {
    pub curated_bucket: String,
    pub assets_bucket: String,
    pub account_id: String,
    pub template_path: PathBuf,
    pub watchdog_timeout: Duration,
    pub callback_method: CallbackMethod,
}

impl ScriptResourceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let watchdog_timeout = match optional(&lookup, "WATCHDOG_TIMEOUT_MS") {
            Some(raw) => parse_timeout_ms("WATCHDOG_TIMEOUT_MS", &raw)?,
            None => DEFAULT_WATCHDOG_TIMEOUT,
        };
        let callback_method = match optional(&lookup, "CALLBACK_HTTP_METHOD") {
            Some(raw) => raw.parse::<CallbackMethod>().map_err(|message| ConfigError::Invalid {
                name: "CALLBACK_HTTP_METHOD",
                message,
            })?,
            None => CallbackMethod::default(),
        };

        Ok(Self {
            curated_bucket: required(&lookup, "GLUE_CURATED_BUCKET")?,
            assets_bucket: required(&lookup, "GLUE_ASSETS_BUCKET")?,
            account_id: required(&lookup, "ACCOUNT_ID")?,
            template_path: optional(&lookup, "SCRIPT_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(SCRIPT_FILENAME)),
            watchdog_timeout,
            callback_method,
        })
    }

    pub fn script_parameters(&self) -> ScriptParameters {
        ScriptParameters {
            curated_bucket: self.curated_bucket.clone(),
            account_id: self.account_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTriggerConfig {
    pub workflow_name: String,
}

impl WorkflowTriggerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            workflow_name: required(&lookup, "WORKFLOW_NAME")?,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing { name })
}

fn parse_timeout_ms(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let millis = raw
        .trim()
        .parse::<u64>()
        .map_err(|error| ConfigError::Invalid {
            name,
            message: format!("expected milliseconds, got '{raw}' ({error})"),
        })?;
    if millis == 0 {
        return Err(ConfigError::Invalid {
            name,
            message: "must be a positive number of milliseconds".to_string(),
        });
    }
    Ok(Duration::from_millis(millis))
}
