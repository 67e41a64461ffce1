use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub fraction: f64,
    pub message: String,
}

/// Progress reporting for one analysis run. Fractions are clamped to
/// [0, 1] and never decrease; the receiving side may be dropped at any
/// time when the caller abandons the run.
#[derive(Debug)]
pub struct ProgressSender {
    tx: Option<UnboundedSender<ProgressEvent>>,
    last: AtomicU64,
}

impl ProgressSender {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx: Some(tx), last: AtomicU64::new(0) }
    }

    pub fn disabled() -> Self {
        Self { tx: None, last: AtomicU64::new(0) }
    }

    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, fraction: f64, message: &str) {
        let clamped = fraction.clamp(0.0, 1.0);
        let previous = f64::from_bits(self.last.load(Ordering::Acquire));
        let value = clamped.max(previous);
        self.last.store(value.to_bits(), Ordering::Release);
        if let Some(tx) = &self.tx {
            let _ = tx.send(ProgressEvent { fraction: value, message: message.to_string() });
        }
    }
}
