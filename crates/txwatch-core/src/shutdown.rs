//! Cancellation signal shared by the scanner task and its owner.
//!
//! ```text
//! ShutdownTrigger ──cancel()──▶ watch<bool> ──▶ Shutdown (clone per task)
//! ```

use tokio::sync::watch;

/// Create a linked trigger / signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Owner side: fires the signal once. Dropping it also fires the signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signal every linked [`Shutdown`]. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// A new signal linked to this trigger.
    pub fn signal(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side, cheap to clone.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Returns `true` if the trigger fired or was dropped.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the trigger fires or is dropped.
    pub async fn cancelled(&mut self) {
        // Err means the trigger is gone, which counts as cancellation.
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_reaches_every_clone() {
        let (trigger, signal) = shutdown_channel();
        let mut a = signal.clone();
        let mut b = trigger.signal();
        assert!(!signal.is_cancelled());

        trigger.cancel();
        tokio::time::timeout(Duration::from_secs(1), a.cancelled()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), b.cancelled()).await.unwrap();
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_trigger_cancels() {
        let (trigger, mut signal) = shutdown_channel();
        drop(trigger);
        assert!(signal.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), signal.cancelled()).await.unwrap();
    }

    #[tokio::test]
    async fn pending_until_cancelled() {
        let (_trigger, mut signal) = shutdown_channel();
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(waited.is_err());
    }
}
