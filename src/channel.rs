//! Client and engine halves of the orchestrator's channels
//!
//! Operations flow client → engine, events flow engine → client. The client
//! half owns its event receiver, so there is exactly one reader of events per
//! [`EngineChannel`].

use tokio::sync::mpsc;

use crate::protocol::{Event, Op, Request, SubmissionId};

/// Engine half, consumed by the orchestrator
pub struct ChannelPair {
    pub op_rx: mpsc::UnboundedReceiver<Op>,
    pub event_tx: mpsc::UnboundedSender<Event>,
}

/// Client half: submits operations and reads their events
pub struct EngineChannel {
    op_tx: mpsc::UnboundedSender<Op>,
    event_rx: mpsc::UnboundedReceiver<Event>,
}

impl EngineChannel {
    /// Create connected client and engine halves
    pub fn new() -> (Self, ChannelPair) {
        let (op_tx, op_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        (Self { op_tx, event_rx }, ChannelPair { op_rx, event_tx })
    }

    pub fn send(&self, op: Op) -> Result<(), ChannelError> {
        self.op_tx.send(op).map_err(|_| ChannelError::Closed)
    }

    /// Queue a request and return the id its event will carry
    pub fn submit(&self, request: Request) -> Result<SubmissionId, ChannelError> {
        let sub_id = SubmissionId::new();
        self.send(Op::Interact { sub_id, request })?;
        Ok(sub_id)
    }

    /// Next queued event, if one is ready
    pub fn try_recv(&mut self) -> Option<Event> {
        self.event_rx.try_recv().ok()
    }

    /// Wait for the next event; `None` once the orchestrator has stopped
    pub async fn recv(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    /// Whether the orchestrator has dropped its operation receiver
    pub fn is_closed(&self) -> bool {
        self.op_tx.is_closed()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Orchestrator is no longer accepting operations")]
    Closed,
}
