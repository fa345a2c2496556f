use dcp_glue_core::contract::{ObjectCreatedEvent, WorkflowRunStarted};
use dcp_glue_core::storage_keys::s3_uri;
use tracing::{info, warn};

use crate::adapters::workflow::WorkflowStarter;
use crate::config::WorkflowTriggerConfig;
use crate::error::WorkflowTriggerError;

/// Starts the configured workflow for an object-created notification.
///
/// The notification only feeds the log line; the workflow started is always
/// the configured one. Errors are returned untouched so the platform's own
/// retry policy applies.
pub async fn handle_object_created_event(
    event: &ObjectCreatedEvent,
    config: &WorkflowTriggerConfig,
    starter: &impl WorkflowStarter,
) -> Result<WorkflowRunStarted, WorkflowTriggerError> {
    match event.first_object() {
        Some((bucket, key)) => info!(
            component = "workflow_trigger",
            event = "workflow_start_requested",
            workflow_name = %config.workflow_name,
            object = %s3_uri(bucket, key),
            record_count = event.records.len(),
            "Starting DCP Glue Workflow for {}",
            s3_uri(bucket, key),
        ),
        None => warn!(
            component = "workflow_trigger",
            event = "workflow_start_requested",
            workflow_name = %config.workflow_name,
            record_count = 0,
            "Starting DCP Glue Workflow for a notification without records",
        ),
    }

    let run_id = starter
        .start_workflow_run(&config.workflow_name)
        .await
        .map_err(|message| WorkflowTriggerError::StartRun {
            workflow_name: config.workflow_name.clone(),
            message,
        })?;

    info!(
        component = "workflow_trigger",
        event = "workflow_started",
        workflow_name = %config.workflow_name,
        run_id = %run_id,
    );

    Ok(WorkflowRunStarted { run_id })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dcp_glue_core::contract::parse_object_created_event;
    use serde_json::json;

    use super::*;

    struct RecordingStarter {
        names: Mutex<Vec<String>>,
        fail_with: Option<String>,
    }

    impl RecordingStarter {
        fn new() -> Self {
            Self {
                names: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn names(&self) -> Vec<String> {
            self.names.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl WorkflowStarter for RecordingStarter {
        async fn start_workflow_run(&self, workflow_name: &str) -> Result<String, String> {
            self.names
                .lock()
                .expect("poisoned mutex")
                .push(workflow_name.to_string());
            match &self.fail_with {
                Some(message) => Err(message.clone()),
                None => Ok(format!("wr_{}", self.names().len())),
            }
        }
    }

    fn config() -> WorkflowTriggerConfig {
        WorkflowTriggerConfig {
            workflow_name: "dcp-glue-workflow".to_string(),
        }
    }

    #[tokio::test]
    async fn starts_configured_workflow_for_object() {
        let starter = RecordingStarter::new();
        let event = parse_object_created_event(json!({
            "Records": [{
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": "dcp-landing"},
                    "object": {"key": "2026/10/16/events.json", "size": 42}
                }
            }]
        }))
        .expect("event should parse");

        let started = handle_object_created_event(&event, &config(), &starter)
            .await
            .expect("workflow should start");

        assert_eq!(started.run_id, "wr_1");
        assert_eq!(starter.names(), vec!["dcp-glue-workflow".to_string()]);
    }

    #[tokio::test]
    async fn event_content_never_changes_the_workflow() {
        let starter = RecordingStarter::new();
        let events = [
            json!({}),
            json!({"Records": []}),
            json!({
                "Records": [{
                    "s3": {"bucket": {"name": "other"}, "object": {"key": "WORKFLOW_NAME"}}
                }]
            }),
        ];

        for payload in events {
            let event = parse_object_created_event(payload).expect("event should parse");
            handle_object_created_event(&event, &config(), &starter)
                .await
                .expect("workflow should start");
        }

        assert_eq!(starter.names(), vec!["dcp-glue-workflow".to_string(); 3]);
    }

    #[tokio::test]
    async fn start_errors_propagate() {
        let starter = RecordingStarter {
            names: Mutex::new(Vec::new()),
            fail_with: Some("ConcurrentRunsExceededException".to_string()),
        };
        let event = parse_object_created_event(json!({"Records": []})).expect("event parses");

        let error = handle_object_created_event(&event, &config(), &starter)
            .await
            .expect_err("start failure should propagate");

        assert_eq!(
            error,
            WorkflowTriggerError::StartRun {
                workflow_name: "dcp-glue-workflow".to_string(),
                message: "ConcurrentRunsExceededException".to_string(),
            }
        );
        assert_eq!(starter.names().len(), 1);
    }
}
