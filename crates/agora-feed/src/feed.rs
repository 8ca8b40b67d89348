use tokio::sync::broadcast;

use agora_types::events::FeedEvent;

/// Fan-out hub for change events. Every connected client holds a broadcast
/// receiver; narrowing down to the conversation a client is watching happens
/// per connection, not here.
#[derive(Clone)]
pub struct ChangeFeed {
    broadcast_tx: broadcast::Sender<FeedEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self { broadcast_tx }
    }

    /// Subscribe to change events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Publish an event to all connections. A send error only means nobody
    /// is listening right now, so it is ignored.
    pub fn publish(&self, event: FeedEvent) {
        let _ = self.broadcast_tx.send(event);
    }
}
