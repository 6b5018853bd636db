use std::time::Duration;

use async_trait::async_trait;

/// Cooperative wait used for all pacing in the pipeline: the pause between
/// PDF downloads, the pause between announcements, and the classification
/// backoff. Injected so tests can record the requested delays instead of
/// sleeping through them.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn wait(&self, duration: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
