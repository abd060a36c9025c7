use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out for cache-invalidation signals.
///
/// Every successful mutation announces the path whose cached rendering is now
/// stale. The presentation layer subscribes and recomputes on next access;
/// the signal carries no payload beyond the path itself.
#[derive(Clone)]
pub struct Revalidator {
    tx: broadcast::Sender<String>,
}

impl Revalidator {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn revalidate(&self, path: &str) {
        tracing::debug!(path, "emitting revalidation signal");
        // Nobody listening is fine; the signal is advisory.
        let _ = self.tx.send(path.to_string());
    }
}

impl Default for Revalidator {
    fn default() -> Self {
        Self::new()
    }
}
