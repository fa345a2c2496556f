#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use dcp_glue_core::contract::CallbackResponse;
use dcp_glue_lambda::adapters::callback::CallbackSender;
use dcp_glue_lambda::adapters::object_store::ScriptStore;

/// Object store that keeps every write in memory.
pub struct MemoryStore {
    writes: Mutex<Vec<StoredObject>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<StoredObject> {
        self.writes.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl ScriptStore for MemoryStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), String> {
        self.writes
            .lock()
            .expect("poisoned mutex")
            .push(StoredObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
                body,
            });
        Ok(())
    }
}

/// Callback sender that records every delivered response.
pub struct CapturingCallback {
    sent: Mutex<Vec<(String, CallbackResponse)>>,
}

impl CapturingCallback {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, CallbackResponse)> {
        self.sent.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl CallbackSender for CapturingCallback {
    async fn send(&self, response_url: &str, response: &CallbackResponse) -> Result<(), String> {
        self.sent
            .lock()
            .expect("poisoned mutex")
            .push((response_url.to_string(), response.clone()));
        Ok(())
    }
}
