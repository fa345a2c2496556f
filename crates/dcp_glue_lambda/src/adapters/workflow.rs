use async_trait::async_trait;

#[async_trait]
pub trait WorkflowStarter: Send + Sync {
    /// Starts a run of the named workflow and returns its run id.
    async fn start_workflow_run(&self, workflow_name: &str) -> Result<String, String>;
}
