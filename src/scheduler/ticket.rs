//! One-shot result delivery
//!
//! A job holds the [`Resolver`], the caller holds the [`Ticket`]. The resolver
//! delivers at most once; dropping it unresolved closes the ticket.

use tokio::sync::oneshot;

/// Create a connected resolver/ticket pair
pub fn ticket<T>() -> (Resolver<T>, Ticket<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx: Some(tx) }, Ticket { rx })
}

/// Sending half, owned by the job
#[derive(Debug)]
pub struct Resolver<T> {
    tx: Option<oneshot::Sender<T>>,
}

impl<T> Resolver<T> {
    /// Deliver the value. Returns false if already resolved or the ticket was dropped.
    pub fn resolve(&mut self, value: T) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.is_none()
    }
}

/// Receiving half, handed to the caller
#[derive(Debug)]
pub struct Ticket<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Ticket<T> {
    /// Take the value if it has arrived. Polling without a runtime is fine.
    pub fn try_take(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Wait for the value. `None` if the resolver was dropped unresolved.
    pub async fn wait(self) -> Option<T> {
        self.rx.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_once() {
        let (mut resolver, mut ticket) = ticket();
        assert!(ticket.try_take().is_none());
        assert!(resolver.resolve(1));
        assert!(!resolver.resolve(2));
        assert!(resolver.is_resolved());
        assert_eq!(ticket.try_take(), Some(1));
    }

    #[test]
    fn test_dropped_resolver_closes() {
        let (resolver, mut ticket) = ticket::<u32>();
        drop(resolver);
        assert!(ticket.try_take().is_none());
    }

    #[tokio::test]
    async fn test_wait_on_dropped_resolver() {
        let (resolver, ticket) = ticket::<u32>();
        drop(resolver);
        assert_eq!(ticket.wait().await, None);
    }

    #[tokio::test]
    async fn test_wait() {
        let (mut resolver, ticket) = ticket();
        resolver.resolve("done");
        assert_eq!(ticket.wait().await, Some("done"));
    }
}
