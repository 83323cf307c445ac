//! Transaction-sent events: payload-free, broadcast to every listening session.

use tokio::sync::broadcast;

/// Raised once per successful broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSent;

#[derive(Clone)]
pub struct TransactionEvents {
    sender: broadcast::Sender<TransactionSent>,
}

impl Default for TransactionEvents {
    fn default() -> Self { Self::new() }
}

impl TransactionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransactionSent> {
        self.sender.subscribe()
    }

    /// Returns the number of listeners reached. No listener is not an error.
    pub fn notify(&self) -> usize {
        self.sender.send(TransactionSent).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let events = TransactionEvents::new();
        assert_eq!(events.notify(), 0);
        let mut a = events.subscribe();
        let mut b = events.clone().subscribe();
        assert_eq!(events.notify(), 2);
        assert_eq!(a.recv().await.unwrap(), TransactionSent);
        assert_eq!(b.recv().await.unwrap(), TransactionSent);
    }
}
