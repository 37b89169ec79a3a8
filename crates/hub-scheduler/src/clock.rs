//! `now()` and cancellable sleeps (C1).

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Sleeps for `duration`, or returns early if `cancel` fires. Returns
/// `true` if the sleep ran to completion, `false` if it was cancelled.
pub async fn sleep(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleep_completes_without_cancellation() {
        let token = CancellationToken::new();
        let completed = sleep(Duration::from_millis(1), &token).await;
        assert!(completed);
    }

    #[tokio::test]
    async fn sleep_is_interrupted_by_cancellation() {
        let token = CancellationToken::new();
        let token2 = token.clone();
        tokio::spawn(async move {
            token2.cancel();
        });
        let completed = sleep(Duration::from_secs(30), &token).await;
        assert!(!completed);
    }
}
