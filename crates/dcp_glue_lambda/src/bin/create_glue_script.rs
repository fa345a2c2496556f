use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use dcp_glue_core::contract::parse_custom_resource_event;
use dcp_glue_lambda::adapters::callback::HttpCallbackSender;
use dcp_glue_lambda::adapters::object_store::ScriptStore;
use dcp_glue_lambda::config::ScriptResourceConfig;
use dcp_glue_lambda::error::ConfigError;
use dcp_glue_lambda::handlers::script_resource::{
    handle_script_resource_event, remaining_until, report_configuration_failure,
    report_malformed_event, InvocationContext, ScriptResourceOutcome,
};
use dcp_glue_lambda::logging::init_logging;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct S3ScriptStore {
    s3_client: aws_sdk_s3::Client,
}

#[async_trait]
impl ScriptStore for S3ScriptStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), String> {
        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                format!(
                    "failed to write object to s3: {}",
                    DisplayErrorContext(&error)
                )
            })
    }
}

struct RuntimeDependencies {
    config: Result<ScriptResourceConfig, ConfigError>,
    store: S3ScriptStore,
    callback: HttpCallbackSender,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ScriptResourceOutcome, Error> {
    let (payload, lambda_context) = event.into_parts();
    let context = InvocationContext {
        aws_request_id: lambda_context.request_id.clone(),
        log_stream_name: lambda_context.env_config.log_stream.clone(),
        remaining_time: remaining_until(lambda_context.deadline, Utc::now().timestamp_millis()),
    };

    let resource_event = match parse_custom_resource_event(payload.clone()) {
        Ok(value) => value,
        Err(error) => {
            report_malformed_event(&payload, &context, &error, &deps.callback)
                .await
                .map_err(|callback_error| Error::from(callback_error.to_string()))?;
            return Err(Error::from(error.message()));
        }
    };

    let config = match &deps.config {
        Ok(value) => value,
        Err(error) => {
            report_configuration_failure(&resource_event, &context, error, &deps.callback)
                .await
                .map_err(|callback_error| Error::from(callback_error.to_string()))?;
            return Err(Error::from(error.to_string()));
        }
    };

    handle_script_resource_event(
        &resource_event,
        &context,
        config,
        &deps.store,
        &deps.callback,
    )
    .await
    .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = ScriptResourceConfig::from_env();
    let callback_method = config
        .as_ref()
        .map(|value| value.callback_method)
        .unwrap_or_default();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        store: S3ScriptStore {
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        callback: HttpCallbackSender::new(callback_method).map_err(Error::from)?,
    };
    let deps_ref = &deps;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps_ref).await
    }))
    .await
}
