//! Progress reporting for long-running resolution work
//!
//! The engine reports free-text messages at coarse milestones (file
//! detection, batch start, batch completion, lock synthesis success) so a
//! surrounding job tracker can surface them to users.

use std::sync::Arc;

use async_trait::async_trait;

/// Receiver for resolution progress messages
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, message: String);
}

/// Progress sink that discards all messages
pub struct NoopProgress;

impl NoopProgress {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _message: String) {}
}

/// Progress sink that collects messages in memory, for tests and polling UIs
pub struct VecProgress {
    messages: Arc<tokio::sync::Mutex<Vec<String>>>,
}

impl VecProgress {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(tokio::sync::Mutex::new(Vec::new())),
        }
    }

    pub async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.messages.lock().await.clear();
    }
}

impl Default for VecProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for VecProgress {
    async fn report(&self, message: String) {
        self.messages.lock().await.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vec_progress_collects_messages() {
        let sink = VecProgress::new();
        sink.report("Detected package.json".to_string()).await;
        sink.report("Batch 1 complete".to_string()).await;

        let messages = sink.messages().await;
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("package.json"));
    }

    #[tokio::test]
    async fn test_noop_progress_discards() {
        let sink = NoopProgress::new();
        sink.report("ignored".to_string()).await;
    }
}
