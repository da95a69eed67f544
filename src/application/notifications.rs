use crate::domain::trading::order::Order;
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use tracing::debug;

/// FIFO of order snapshots for the trading engine.
///
/// Producers are the caller thread (submit) and the session thread (execution
/// reports); the engine drains it with [`NotificationQueue::poll`].
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: Sender<Order>,
    rx: Receiver<Order>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn push(&self, order: Order) {
        debug!(
            "NotificationQueue: {} {} -> {}",
            order.id, order.symbol, order.status
        );
        // Both ends live in self, the channel cannot be disconnected here
        let _ = self.tx.send(order);
    }

    /// Next snapshot, or None immediately when the queue is empty
    pub fn poll(&self) -> Option<Order> {
        match self.rx.try_recv() {
            Ok(order) => Some(order),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::commission::FixCommission;
    use crate::domain::trading::order::OrderRequest;
    use crate::domain::trading::types::OrderStatus;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn order(id: &str) -> Order {
        Order::new(
            id.to_string(),
            OrderRequest::buy("X", dec!(1)),
            Arc::new(FixCommission),
        )
    }

    #[test]
    fn test_empty_poll_returns_none() {
        let queue = NotificationQueue::new();
        assert!(queue.poll().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let queue = NotificationQueue::new();
        queue.push(order("a"));
        queue.push(order("b"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.poll().unwrap().id, "a");
        assert_eq!(queue.poll().unwrap().id, "b");
        assert!(queue.poll().is_none());
    }

    #[test]
    fn test_snapshots_are_independent() {
        let queue = NotificationQueue::new();
        let mut live = order("a");
        queue.push(live.clone());
        live.status = OrderStatus::Canceled;

        assert_eq!(queue.poll().unwrap().status, OrderStatus::Submitted);
    }
}
