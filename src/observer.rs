//! Synchronous change subscribers

use crate::state::ProgressState;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&ProgressState) + Send>;

/// Registered callbacks, notified in registration order
#[derive(Default)]
pub(crate) struct ObserverSet {
    next_id: u64,
    observers: Vec<(SubscriptionId, Callback)>,
}

impl ObserverSet {
    pub(crate) fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ProgressState) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub(crate) fn notify(&mut self, state: &ProgressState) {
        for (_, callback) in self.observers.iter_mut() {
            callback(state);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}
