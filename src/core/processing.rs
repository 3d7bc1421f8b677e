use tokio::sync::watch;

/// Whether a message is currently being sent or streamed in
///
/// Silent merges wait on this before touching the message list, so a page
/// swap never interleaves with a live streaming update.
#[derive(Debug, Clone)]
pub struct ChatProcessing {
    tx: watch::Sender<bool>,
}

impl Default for ChatProcessing {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatProcessing {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn is_processing(&self) -> bool {
        *self.tx.borrow()
    }

    /// Called by the chat layer when sending or streaming starts
    pub fn start(&self) {
        self.tx.send_replace(true);
    }

    /// Called by the chat layer when sending or streaming has finished
    pub fn finish(&self) {
        self.tx.send_replace(false);
    }

    /// Resolve once nothing is being processed
    pub async fn idle(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|processing| !*processing).await;
    }
}
