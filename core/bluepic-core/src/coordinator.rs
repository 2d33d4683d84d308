//! Publish/subscribe bus between the session engine and UI observers.
//!
//! Delivery is synchronous, in subscription order, on whichever thread drains
//! the main queue. Nothing is buffered: an outcome published while nobody is
//! subscribed is gone. Handlers only see `&LaunchOutcome`; follow-up work goes
//! through a [`crate::MainQueueHandle`] instead of re-entering the bus.

use crate::outcome::LaunchOutcome;

pub type OutcomeHandler = Box<dyn FnMut(&LaunchOutcome) + Send>;

/// Returned by [`NotificationCoordinator::subscribe`]; pass to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct NotificationCoordinator {
    handlers: Vec<(SubscriptionId, OutcomeHandler)>,
    next_id: u64,
}

impl NotificationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&LaunchOutcome) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn publish(&mut self, outcome: &LaunchOutcome) {
        tracing::debug!(
            outcome = outcome.name(),
            subscribers = self.handlers.len(),
            "Publishing launch outcome"
        );
        for (_, handler) in self.handlers.iter_mut() {
            handler(outcome);
        }
    }
}

impl std::fmt::Debug for NotificationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCoordinator")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
