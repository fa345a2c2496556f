use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be configured")]
    Missing { name: &'static str },
    #[error("{name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum ScriptResourceError {
    #[error("failed to read script template '{}': {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to upload script to s3://{bucket}/{key}: {message}")]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("failed to send {status} callback: {message}")]
    Callback { status: String, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowTriggerError {
    #[error("failed to start workflow '{workflow_name}': {message}")]
    StartRun {
        workflow_name: String,
        message: String,
    },
}
