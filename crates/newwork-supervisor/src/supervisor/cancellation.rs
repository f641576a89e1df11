use tokio::sync::watch;

/// Owner side of a one-shot stop request for a background loop.
#[derive(Debug)]
pub struct StopSignal {
    sender: watch::Sender<bool>,
}

/// Loop side of a [`StopSignal`]. Cloneable; every clone observes the same request.
#[derive(Clone, Debug)]
pub struct StopListener {
    receiver: watch::Receiver<bool>,
}

pub fn stop_signal() -> (StopSignal, StopListener) {
    let (sender, receiver) = watch::channel(false);
    (StopSignal { sender }, StopListener { receiver })
}

impl StopSignal {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }
}

impl StopListener {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the signal fires, or when the owning [`StopSignal`] is dropped.
    pub async fn triggered(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                break;
            }
        }
    }
}
