use async_trait::async_trait;

#[async_trait]
pub trait ScriptStore: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), String>;
}
