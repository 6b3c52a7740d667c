//! Cooperative cancellation for pipeline runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Shared cancel flag. Clones observe the same flag.
///
/// Checked before each write and raced against pacing waits; a request
/// already sent is never interrupted.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Wait `delay` unless cancelled first. Returns `false` if cancelled.
pub async fn pace(delay: Duration, cancel: &CancelToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }
    tracing::debug!("pacing {:?}", delay);
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        clone.cancelled().await;
    }

    #[tokio::test]
    async fn cancel_interrupts_pacing() {
        let token = CancelToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let completed = tokio::time::timeout(
            Duration::from_secs(5),
            pace(Duration::from_secs(60), &token),
        )
        .await
        .unwrap();
        assert!(!completed);
    }

    #[tokio::test]
    async fn zero_pacing_completes_immediately() {
        assert!(pace(Duration::ZERO, &CancelToken::new()).await);
    }
}
