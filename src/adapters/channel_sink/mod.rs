// Channel sink adapter - Publishes session events onto an mpsc channel

use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::model::EncodeEvent;
use crate::ports::EventSink;

/// Event sink feeding an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EncodeEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EncodeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: EncodeEvent) {
        if let Err(unsent) = self.tx.send(event) {
            trace!(event = ?unsent.0, "event receiver gone");
        }
    }
}
