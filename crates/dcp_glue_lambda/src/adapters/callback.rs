use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use dcp_glue_core::contract::CallbackResponse;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

/// Upper bound for one callback request, including connect.
pub const CALLBACK_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// HTTP verb used for the response URL. Pre-signed CloudFormation URLs are
/// signed for `PUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackMethod {
    #[default]
    Put,
    Post,
}

impl CallbackMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

impl FromStr for CallbackMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            other => Err(format!("unsupported callback method '{other}'")),
        }
    }
}

#[async_trait]
pub trait CallbackSender: Send + Sync {
    async fn send(&self, response_url: &str, response: &CallbackResponse) -> Result<(), String>;
}

/// Thin HTTP client for the custom-resource response URL.
#[derive(Debug, Clone)]
pub struct HttpCallbackSender {
    client: reqwest::Client,
    method: CallbackMethod,
}

impl HttpCallbackSender {
    pub fn new(method: CallbackMethod) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(CALLBACK_REQUEST_TIMEOUT)
            .build()
            .map_err(|error| format!("failed to build callback client: {error}"))?;
        Ok(Self { client, method })
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackSender {
    async fn send(&self, response_url: &str, response: &CallbackResponse) -> Result<(), String> {
        let body = serde_json::to_vec(response)
            .map_err(|error| format!("failed to serialize callback body: {error}"))?;

        let request = match self.method {
            CallbackMethod::Put => self.client.put(response_url),
            CallbackMethod::Post => self.client.post(response_url),
        };

        // The pre-signed URL is signed with an empty content type.
        let reply = request
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(|error| format!("failed to deliver callback: {error}"))?;

        let status = reply.status();
        if !status.is_success() {
            let detail = reply.text().await.unwrap_or_default();
            return Err(format!(
                "callback rejected with status {status}: {}",
                detail.trim()
            ));
        }

        Ok(())
    }
}
