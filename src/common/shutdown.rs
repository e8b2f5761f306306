//! Shutdown coordination primitive.
//!
//! A `Shutdown` is shared between a coordinator and any number of tasks.
//! Tasks `wait()` on it inside `tokio::select!` loops; the coordinator
//! calls `shutdown()` exactly once to release all waiters.

use tokio::sync::watch;

/// One-shot, multi-consumer shutdown signal.
pub struct Shutdown {
    sender: watch::Sender<bool>,
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    /// create a new shutdown signal
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender,
            receiver,
        }
    }

    /// signal shutdown, releasing all current and future waiters
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
    }

    /// check whether shutdown has been signalled
    pub fn is_terminated(&self) -> bool {
        *self.receiver.borrow()
    }

    /// wait until shutdown is signalled
    ///
    /// Returns immediately if the signal was already sent.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.receiver.clone();
        async move {
            if *receiver.borrow() {
                return;
            }
            // The sender lives as long as self, so a closed channel only
            // happens after drop; treat it as terminated either way.
            let _ = receiver.wait_for(|terminated| *terminated).await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
