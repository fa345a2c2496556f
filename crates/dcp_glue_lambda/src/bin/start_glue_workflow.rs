use async_trait::async_trait;
use aws_sdk_glue::error::DisplayErrorContext;
use dcp_glue_core::contract::{parse_object_created_event, WorkflowRunStarted};
use dcp_glue_lambda::adapters::workflow::WorkflowStarter;
use dcp_glue_lambda::config::WorkflowTriggerConfig;
use dcp_glue_lambda::handlers::workflow_trigger::handle_object_created_event;
use dcp_glue_lambda::logging::init_logging;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct GlueWorkflowStarter {
    glue_client: aws_sdk_glue::Client,
}

#[async_trait]
impl WorkflowStarter for GlueWorkflowStarter {
    async fn start_workflow_run(&self, workflow_name: &str) -> Result<String, String> {
        let output = self
            .glue_client
            .start_workflow_run()
            .name(workflow_name)
            .send()
            .await
            .map_err(|error| {
                format!(
                    "failed to start glue workflow run: {}",
                    DisplayErrorContext(&error)
                )
            })?;

        output
            .run_id()
            .map(str::to_string)
            .ok_or_else(|| "StartWorkflowRun response did not include a RunId".to_string())
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &WorkflowTriggerConfig,
    starter: &GlueWorkflowStarter,
) -> Result<WorkflowRunStarted, Error> {
    let notification = parse_object_created_event(event.payload)
        .map_err(|error| Error::from(error.message()))?;

    handle_object_created_event(&notification, config, starter)
        .await
        .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config =
        WorkflowTriggerConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let starter = GlueWorkflowStarter {
        glue_client: aws_sdk_glue::Client::new(&aws_config),
    };
    let config_ref = &config;
    let starter_ref = &starter;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, config_ref, starter_ref).await
    }))
    .await
}
