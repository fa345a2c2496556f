use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CALLBACK_REASON_PREFIX: &str = "See the details in CloudWatch Log Stream: ";
pub const RESOURCE_TIMEOUT_MESSAGE: &str = "Resource timeout";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

impl RequestType {
    /// Only provisioning requests that leave the resource in place rewrite the script.
    pub fn writes_script(self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallbackStatus {
    Success,
    Failed,
}

/// Body delivered to the pre-signed CloudFormation response URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackResponse {
    pub status: CallbackStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: Map<String, Value>,
}

impl CallbackResponse {
    pub fn success(
        event: &CustomResourceEvent,
        log_stream_name: &str,
        data: Map<String, Value>,
    ) -> Self {
        Self::build(
            event,
            log_stream_name,
            CallbackStatus::Success,
            format!("{CALLBACK_REASON_PREFIX}{log_stream_name}"),
            data,
        )
    }

    pub fn failed(event: &CustomResourceEvent, log_stream_name: &str, message: &str) -> Self {
        let mut data = Map::new();
        data.insert("error".to_string(), Value::from(message));
        Self::build(
            event,
            log_stream_name,
            CallbackStatus::Failed,
            format!("{CALLBACK_REASON_PREFIX}{log_stream_name} ({message})"),
            data,
        )
    }

    fn build(
        event: &CustomResourceEvent,
        log_stream_name: &str,
        status: CallbackStatus,
        reason: String,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            status,
            reason,
            physical_resource_id: physical_resource_id(event, log_stream_name),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            no_echo: false,
            data,
        }
    }
}

/// Keeps the physical id stable across updates; a fresh resource is named
/// after the log stream that created it.
pub fn physical_resource_id(event: &CustomResourceEvent, log_stream_name: &str) -> String {
    event
        .physical_resource_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(log_stream_name)
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectCreatedEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Object {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ObjectCreatedEvent {
    /// Bucket and key of the first record; later records are ignored.
    pub fn first_object(&self) -> Option<(&str, &str)> {
        self.records
            .first()
            .map(|record| (record.s3.bucket.name.as_str(), record.s3.object.key.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowRunStarted {
    #[serde(rename = "RunId")]
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn parse_custom_resource_event(
    payload: Value,
) -> Result<CustomResourceEvent, ValidationError> {
    let event: CustomResourceEvent = serde_json::from_value(payload).map_err(|error| {
        ValidationError::new(format!("Malformed custom resource event: {error}"))
    })?;

    if event.response_url.trim().is_empty() {
        return Err(ValidationError::new("ResponseURL cannot be empty"));
    }

    Ok(event)
}

/// Builds a `FAILED` callback from whatever identifiers a malformed payload
/// still carries. Missing identifiers are sent as empty strings; `None` when
/// there is no usable `ResponseURL` to report to.
pub fn malformed_event_callback(
    payload: &Value,
    log_stream_name: &str,
    message: &str,
) -> Option<(String, CallbackResponse)> {
    let text = |field: &str| {
        payload
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let response_url = text("ResponseURL");
    if response_url.trim().is_empty() {
        return None;
    }

    let event = CustomResourceEvent {
        request_type: RequestType::Unknown,
        response_url: response_url.clone(),
        stack_id: text("StackId"),
        request_id: text("RequestId"),
        logical_resource_id: text("LogicalResourceId"),
        physical_resource_id: payload
            .get("PhysicalResourceId")
            .and_then(Value::as_str)
            .map(str::to_string),
        resource_type: None,
        service_token: None,
        resource_properties: None,
        old_resource_properties: None,
    };
    Some((
        response_url,
        CallbackResponse::failed(&event, log_stream_name, message),
    ))
}

pub fn parse_object_created_event(
    payload: Value,
) -> Result<ObjectCreatedEvent, ValidationError> {
    serde_json::from_value(payload)
        .map_err(|error| ValidationError::new(format!("Malformed S3 notification: {error}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const RESPONSE_URL: &str =
        "https://cloudformation-custom-resource-response-useast1.s3.amazonaws.com/signed";

    fn create_event() -> Value {
        json!({
            "RequestType": "Create",
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:create-glue-script",
            "ResponseURL": RESPONSE_URL,
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/dcp/guid",
            "RequestId": "req-1",
            "LogicalResourceId": "GlueScript",
            "ResourceType": "Custom::GlueScript",
            "ResourceProperties": {"ServiceToken": "arn"}
        })
    }

    #[test]
    fn parses_custom_resource_event_fields() {
        let event = parse_custom_resource_event(create_event()).expect("event should parse");

        assert_eq!(event.request_type, RequestType::Create);
        assert_eq!(event.request_id, "req-1");
        assert_eq!(event.logical_resource_id, "GlueScript");
        assert!(event.response_url.ends_with("/signed"));
        assert!(event.physical_resource_id.is_none());
    }

    #[test]
    fn unrecognized_request_type_is_unknown() {
        let mut payload = create_event();
        payload["RequestType"] = json!("Rollback");

        let event = parse_custom_resource_event(payload).expect("event should parse");
        assert_eq!(event.request_type, RequestType::Unknown);
        assert!(!event.request_type.writes_script());
    }

    #[test]
    fn only_create_and_update_write_the_script() {
        assert!(RequestType::Create.writes_script());
        assert!(RequestType::Update.writes_script());
        assert!(!RequestType::Delete.writes_script());
    }

    #[test]
    fn rejects_event_without_response_url() {
        let mut payload = create_event();
        payload["ResponseURL"] = json!("  ");

        let error = parse_custom_resource_event(payload).expect_err("event should fail");
        assert_eq!(error.message(), "ResponseURL cannot be empty");
    }

    #[test]
    fn callback_body_uses_cloudformation_field_names() {
        let event = parse_custom_resource_event(create_event()).expect("event should parse");
        let response = CallbackResponse::failed(&event, "2026/10/16/[$LATEST]abc", "boom");

        let body = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(body["Status"], "FAILED");
        assert_eq!(body["PhysicalResourceId"], "2026/10/16/[$LATEST]abc");
        assert_eq!(body["StackId"], event.stack_id.as_str());
        assert_eq!(body["RequestId"], "req-1");
        assert_eq!(body["LogicalResourceId"], "GlueScript");
        assert_eq!(body["NoEcho"], false);
        assert_eq!(body["Data"], json!({"error": "boom"}));
        assert_eq!(
            body["Reason"],
            "See the details in CloudWatch Log Stream: 2026/10/16/[$LATEST]abc (boom)"
        );
    }

    #[test]
    fn existing_physical_id_is_preserved() {
        let mut payload = create_event();
        payload["RequestType"] = json!("Update");
        payload["PhysicalResourceId"] = json!("original-stream");
        let event = parse_custom_resource_event(payload).expect("event should parse");

        let response = CallbackResponse::success(&event, "new-stream", Map::new());
        assert_eq!(response.physical_resource_id, "original-stream");
        assert_eq!(response.status, CallbackStatus::Success);
    }

    #[test]
    fn first_object_reads_only_the_first_record() {
        let event = parse_object_created_event(json!({
            "Records": [
                {
                    "eventSource": "aws:s3",
                    "s3": {"bucket": {"name": "landing"}, "object": {"key": "a/b.json"}}
                },
                {
                    "eventSource": "aws:s3",
                    "s3": {"bucket": {"name": "other"}, "object": {"key": "c.json"}}
                }
            ]
        }))
        .expect("event should parse");

        assert_eq!(event.first_object(), Some(("landing", "a/b.json")));
    }

    #[test]
    fn malformed_payload_still_yields_failed_callback() {
        let payload = json!({
            "RequestType": "Create",
            "ResponseURL": "https://cfn-response.example/signed",
            "StackId": "stack",
            "RequestId": "req-1"
        });
        let error = parse_custom_resource_event(payload.clone()).expect_err("event should fail");
        assert!(error.message().contains("LogicalResourceId"));

        let (url, response) = malformed_event_callback(&payload, "stream", error.message())
            .expect("response url is usable");

        assert_eq!(url, "https://cfn-response.example/signed");
        assert_eq!(response.status, CallbackStatus::Failed);
        assert_eq!(response.stack_id, "stack");
        assert_eq!(response.request_id, "req-1");
        assert_eq!(response.logical_resource_id, "");
        assert_eq!(response.physical_resource_id, "stream");
        assert_eq!(response.data["error"], error.message());
    }

    #[test]
    fn malformed_payload_without_response_url_yields_nothing() {
        assert!(malformed_event_callback(&json!({"StackId": "stack"}), "stream", "bad").is_none());
        assert!(malformed_event_callback(&json!({"ResponseURL": " "}), "stream", "bad").is_none());
        assert!(malformed_event_callback(&json!("not an object"), "stream", "bad").is_none());
    }

    #[test]
    fn missing_records_parse_as_empty() {
        let event = parse_object_created_event(json!({})).expect("event should parse");
        assert!(event.first_object().is_none());
    }

    #[test]
    fn workflow_run_started_serializes_run_id() {
        let started = WorkflowRunStarted {
            run_id: "wr_123".to_string(),
        };
        assert_eq!(
            serde_json::to_value(started).expect("value should serialize"),
            json!({"RunId": "wr_123"})
        );
    }
}
