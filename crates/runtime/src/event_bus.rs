use tracing::trace;

/// An emitted event tagged with its position in the emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<E> {
    pub sequence: u64,
    pub event: E,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Observer<E> = Box<dyn FnMut(&Envelope<E>) + Send>;

/// Synchronous observer fan-out.
///
/// Observers run inside `emit`, in subscription order. Events are not retained;
/// an event emitted with no observers is dropped.
pub struct EventBus<E> {
    observers: Vec<(SubscriptionId, Observer<E>)>,
    next_sequence: u64,
    next_subscription: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            next_sequence: 0,
            next_subscription: 0,
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

impl<E: std::fmt::Debug> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&Envelope<E>) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Notifies observers and returns the event's sequence number.
    pub fn emit(&mut self, event: E) -> u64 {
        let envelope = Envelope {
            sequence: self.next_sequence,
            event,
        };
        self.next_sequence += 1;
        trace!(sequence = envelope.sequence, event = ?envelope.event, "event emitted");
        for (_, observer) in &mut self.observers {
            observer(&envelope);
        }
        envelope.sequence
    }

    /// Number of events emitted so far.
    pub fn emitted(&self) -> u64 {
        self.next_sequence
    }
}
