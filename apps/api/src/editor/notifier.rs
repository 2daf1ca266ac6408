use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::models::resume::Resume;

/// Emitted once for every effective mutation of the live document.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub revision: u64,
    pub document: Resume,
}

/// Fans document changes out to explicit subscribers.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    revision: u64,
    subscribers: Vec<UnboundedSender<ChangeEvent>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> ChangeReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        ChangeReceiver { rx }
    }

    pub fn emit(&mut self, document: &Resume) {
        self.revision += 1;
        let event = ChangeEvent {
            revision: self.revision,
            document: document.clone(),
        };
        // Receivers that were dropped are pruned here.
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[derive(Debug)]
pub struct ChangeReceiver {
    rx: UnboundedReceiver<ChangeEvent>,
}

impl ChangeReceiver {
    /// Next pending event, if any. Never blocks.
    pub fn next_pending(&mut self) -> Option<ChangeEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let mut notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();

        let mut doc = Resume::default();
        notifier.emit(&doc);
        doc.skills.push("Rust".to_string());
        notifier.emit(&doc);

        let first = rx.next_pending().unwrap();
        let second = rx.next_pending().unwrap();
        assert_eq!(first.revision, 1);
        assert!(first.document.skills.is_empty());
        assert_eq!(second.revision, 2);
        assert_eq!(second.document.skills, vec!["Rust"]);
        assert!(rx.next_pending().is_none());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut notifier = ChangeNotifier::new();
        let rx = notifier.subscribe();
        let _kept = notifier.subscribe();
        drop(rx);

        notifier.emit(&Resume::default());
        assert_eq!(notifier.subscriber_count(), 1);
    }
}
