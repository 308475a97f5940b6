//! Inter-item pacing.

use std::time::Duration;

use async_trait::async_trait;

use super::traits::WaitPolicy;

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleep;

#[async_trait]
impl WaitPolicy for TokioSleep {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
