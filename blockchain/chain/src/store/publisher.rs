// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use flume::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;

/// Fan-out of values to subscribers over bounded channels. Publication never
/// blocks: a subscriber whose channel is full or closed is disconnected and
/// receives nothing further.
pub struct Publisher<T> {
    capacity: usize,
    senders: Mutex<Vec<Sender<T>>>,
}

impl<T: Clone> Publisher<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            senders: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new subscriber and returns its receiving end. Dropping
    /// the receiver disconnects the subscriber.
    pub fn subscribe(&self) -> Receiver<T> {
        let (sender, receiver) = flume::bounded(self.capacity);
        self.senders.lock().push(sender);
        receiver
    }

    /// Sends the value to every connected subscriber.
    pub fn publish(&self, msg: T) {
        self.senders.lock().retain(|s| match s.try_send(msg.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("dropping head change subscriber that fell behind");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_to_all_subscribers() {
        let publisher = Publisher::new(4);
        let rx1 = publisher.subscribe();
        let rx2 = publisher.subscribe();
        publisher.publish(7u64);
        assert_eq!(rx1.recv().unwrap(), 7);
        assert_eq!(rx2.recv().unwrap(), 7);
    }

    #[test]
    fn overflowing_subscriber_is_disconnected() {
        let publisher = Publisher::new(1);
        let slow = publisher.subscribe();
        let fast = publisher.subscribe();

        publisher.publish(1u64);
        // `slow` never drains; this publish overflows its channel
        publisher.publish(2u64);
        assert_eq!(publisher.subscriber_count(), 1);

        assert_eq!(fast.try_recv().ok(), Some(1));
        assert_eq!(fast.try_recv().ok(), Some(2));
        // the slow subscriber keeps its buffered value but is cut off
        assert_eq!(slow.try_recv().ok(), Some(1));
        assert!(slow.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let publisher = Publisher::new(4);
        let rx = publisher.subscribe();
        drop(rx);
        publisher.publish(1u64);
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
