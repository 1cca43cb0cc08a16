//! Cancellation token for the multiplexer loop.

use tokio::sync::watch;

/// Create a linked trigger/token pair.
#[must_use]
pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

/// Sets the shutdown flag. Typically owned by a signal handler.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Create another token observing this handle.
    #[must_use]
    pub fn token(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observes the shutdown flag.
///
/// If every [`ShutdownHandle`] is dropped without triggering, the token never
/// fires.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Check the flag without waiting.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is requested.
    pub async fn triggered(&mut self) {
        let fired = self.rx.wait_for(|&stop| stop).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initially_not_triggered() {
        let (_handle, token) = channel();
        assert!(!token.is_triggered());
    }

    #[test]
    fn test_trigger_is_visible_to_all_tokens() {
        let (handle, token) = channel();
        let cloned = token.clone();
        let subscribed = handle.token();

        handle.trigger();
        handle.trigger();

        assert!(token.is_triggered());
        assert!(cloned.is_triggered());
        assert!(subscribed.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_wakes_waiter() {
        let (handle, mut token) = channel();
        let waiter = tokio::spawn(async move { token.triggered().await });

        handle.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_triggered_returns_immediately_when_already_set() {
        let (handle, mut token) = channel();
        handle.trigger();
        tokio::time::timeout(Duration::from_millis(100), token.triggered())
            .await
            .expect("already triggered");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_never_fires() {
        let (handle, mut token) = channel();
        drop(handle);
        let result = tokio::time::timeout(Duration::from_secs(5), token.triggered()).await;
        assert!(result.is_err());
        assert!(!token.is_triggered());
    }
}
