//! CloudFormation custom resource that renders the Glue ETL script and
//! uploads it to the assets bucket.

use std::time::Duration;

use dcp_glue_core::contract::{
    malformed_event_callback, CallbackResponse, CallbackStatus, CustomResourceEvent,
    ValidationError, RESOURCE_TIMEOUT_MESSAGE,
};
use dcp_glue_core::script_template::{render_script, script_fingerprint};
use dcp_glue_core::storage_keys::{s3_uri, script_object_key};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::adapters::callback::{CallbackSender, CALLBACK_REQUEST_TIMEOUT};
use crate::adapters::object_store::ScriptStore;
use crate::config::ScriptResourceConfig;
use crate::error::{ConfigError, ScriptResourceError};

/// Time kept back from the Lambda deadline so a timeout can still be reported.
/// Covers the longest the callback request is allowed to take.
pub const CALLBACK_REPORTING_MARGIN: Duration = CALLBACK_REQUEST_TIMEOUT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub aws_request_id: String,
    pub log_stream_name: String,
    pub remaining_time: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptResourceOutcome {
    pub status: CallbackStatus,
    pub uploaded: bool,
    pub physical_resource_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProvisionedScript {
    bucket: String,
    key: String,
    sha256: String,
    uploaded: bool,
}

impl ProvisionedScript {
    fn callback_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("ScriptBucket".to_string(), Value::from(self.bucket.clone()));
        data.insert("ScriptKey".to_string(), Value::from(self.key.clone()));
        data.insert(
            "ScriptLocation".to_string(),
            Value::from(s3_uri(&self.bucket, &self.key)),
        );
        data.insert("ScriptSha256".to_string(), Value::from(self.sha256.clone()));
        data.insert("Uploaded".to_string(), Value::from(self.uploaded));
        data
    }
}

/// Runs one custom-resource request and reports the outcome to CloudFormation.
///
/// The provisioning work races a watchdog; whichever finishes first decides
/// the single callback that is sent. Provisioning errors become `FAILED`
/// callbacks, so only a callback delivery failure is returned as an error.
pub async fn handle_script_resource_event(
    event: &CustomResourceEvent,
    context: &InvocationContext,
    config: &ScriptResourceConfig,
    store: &impl ScriptStore,
    callback: &impl CallbackSender,
) -> Result<ScriptResourceOutcome, ScriptResourceError> {
    info!(
        component = "script_resource",
        event = "request_received",
        request_type = event.request_type.as_str(),
        stack_id = %event.stack_id,
        request_id = %event.request_id,
        aws_request_id = %context.aws_request_id,
        log_stream = %context.log_stream_name,
        logical_resource_id = %event.logical_resource_id,
        response_url = %event.response_url,
    );

    let watchdog = effective_watchdog(config.watchdog_timeout, context.remaining_time);

    let result = tokio::select! {
        biased;
        result = provision_script(event, config, store) => {
            result.map_err(|error| error.to_string())
        }
        _ = tokio::time::sleep(watchdog) => {
            warn!(
                component = "script_resource",
                event = "watchdog_fired",
                request_id = %event.request_id,
                timeout_ms = watchdog.as_millis() as u64,
            );
            Err(RESOURCE_TIMEOUT_MESSAGE.to_string())
        }
    };

    let (response, uploaded) = match &result {
        Ok(script) => (
            CallbackResponse::success(event, &context.log_stream_name, script.callback_data()),
            script.uploaded,
        ),
        Err(message) => {
            error!(
                component = "script_resource",
                event = "provisioning_failed",
                request_id = %event.request_id,
                error = %message,
            );
            (
                CallbackResponse::failed(event, &context.log_stream_name, message),
                false,
            )
        }
    };

    deliver_callback(&event.response_url, &response, callback).await?;

    Ok(ScriptResourceOutcome {
        status: response.status,
        uploaded,
        physical_resource_id: response.physical_resource_id,
    })
}

/// Answers the stack when configuration could not be loaded, so it does not
/// wait for CloudFormation's own timeout.
pub async fn report_configuration_failure(
    event: &CustomResourceEvent,
    context: &InvocationContext,
    config_error: &ConfigError,
    callback: &impl CallbackSender,
) -> Result<(), ScriptResourceError> {
    let message = config_error.to_string();
    error!(
        component = "script_resource",
        event = "configuration_failed",
        request_id = %event.request_id,
        aws_request_id = %context.aws_request_id,
        error = %message,
    );
    let response = CallbackResponse::failed(event, &context.log_stream_name, &message);
    deliver_callback(&event.response_url, &response, callback).await
}

/// Sends a `FAILED` callback for a payload that did not parse as a
/// custom-resource event. Returns `false` when the payload carries no usable
/// `ResponseURL` and nothing could be reported.
pub async fn report_malformed_event(
    payload: &Value,
    context: &InvocationContext,
    validation_error: &ValidationError,
    callback: &impl CallbackSender,
) -> Result<bool, ScriptResourceError> {
    error!(
        component = "script_resource",
        event = "malformed_event",
        aws_request_id = %context.aws_request_id,
        error = %validation_error,
    );
    let Some((response_url, response)) = malformed_event_callback(
        payload,
        &context.log_stream_name,
        validation_error.message(),
    ) else {
        return Ok(false);
    };
    deliver_callback(&response_url, &response, callback).await?;
    Ok(true)
}

async fn deliver_callback(
    response_url: &str,
    response: &CallbackResponse,
    callback: &impl CallbackSender,
) -> Result<(), ScriptResourceError> {
    let status_label = status_label(response.status);
    callback
        .send(response_url, response)
        .await
        .map_err(|message| {
            error!(
                component = "script_resource",
                event = "callback_failed",
                request_id = %response.request_id,
                status = status_label,
                error = %message,
            );
            ScriptResourceError::Callback {
                status: status_label.to_string(),
                message,
            }
        })?;

    info!(
        component = "script_resource",
        event = "callback_sent",
        request_id = %response.request_id,
        status = status_label,
        physical_resource_id = %response.physical_resource_id,
    );
    Ok(())
}

async fn provision_script(
    event: &CustomResourceEvent,
    config: &ScriptResourceConfig,
    store: &impl ScriptStore,
) -> Result<ProvisionedScript, ScriptResourceError> {
    let template = tokio::fs::read_to_string(&config.template_path)
        .await
        .map_err(|source| ScriptResourceError::TemplateRead {
            path: config.template_path.clone(),
            source,
        })?;
    let body = render_script(&template, &config.script_parameters());
    let sha256 = script_fingerprint(&body);
    let key = script_object_key();

    let uploaded = if event.request_type.writes_script() {
        info!(
            component = "script_resource",
            event = "script_upload_started",
            bucket = %config.assets_bucket,
            key = %key,
        );
        store
            .put_object(&config.assets_bucket, &key, body.into_bytes())
            .await
            .map_err(|message| ScriptResourceError::Upload {
                bucket: config.assets_bucket.clone(),
                key: key.clone(),
                message,
            })?;
        info!(
            component = "script_resource",
            event = "script_uploaded",
            location = %s3_uri(&config.assets_bucket, &key),
            sha256 = %sha256,
        );
        true
    } else {
        info!(
            component = "script_resource",
            event = "upload_skipped",
            request_type = event.request_type.as_str(),
        );
        false
    };

    Ok(ProvisionedScript {
        bucket: config.assets_bucket.clone(),
        key,
        sha256,
        uploaded,
    })
}

/// Caps the configured watchdog so it fires before the Lambda deadline.
pub fn effective_watchdog(configured: Duration, remaining: Option<Duration>) -> Duration {
    match remaining {
        Some(remaining) => configured.min(remaining.saturating_sub(CALLBACK_REPORTING_MARGIN)),
        None => configured,
    }
}

/// Time left until `deadline_ms` (epoch millis) as seen at `now_ms`.
pub fn remaining_until(deadline_ms: u64, now_ms: i64) -> Option<Duration> {
    let deadline_ms = i64::try_from(deadline_ms).ok()?;
    let remaining = deadline_ms.checked_sub(now_ms)?;
    u64::try_from(remaining).ok().map(Duration::from_millis)
}

fn status_label(status: CallbackStatus) -> &'static str {
    match status {
        CallbackStatus::Success => "SUCCESS",
        CallbackStatus::Failed => "FAILED",
    }
}
