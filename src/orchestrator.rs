//! Service loop - feeds submitted operations to the dispatcher

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::channel::{ChannelPair, EngineChannel};
use crate::dispatcher::Dispatcher;
use crate::error::AeosError;
use crate::protocol::{Event, Op, Request, SubmissionId};

/// The AEOS orchestrator
///
/// Owns the shared dispatcher and answers each operation with exactly one
/// event. Requests are independent and run concurrently.
pub struct Orchestrator {
    /// Shared, read-only dispatcher
    dispatcher: Arc<Dispatcher>,
    /// Channel for receiving operations
    op_rx: mpsc::UnboundedReceiver<Op>,
    /// Channel for sending events
    event_tx: mpsc::UnboundedSender<Event>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given channel pair
    pub fn new(dispatcher: Dispatcher, channels: ChannelPair) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            op_rx: channels.op_rx,
            event_tx: channels.event_tx,
        }
    }

    /// Create an orchestrator and return a channel for communication
    pub fn with_channel(dispatcher: Dispatcher) -> (Self, EngineChannel) {
        let (channel, pair) = EngineChannel::new();
        (Self::new(dispatcher, pair), channel)
    }

    /// Run the orchestrator event loop
    ///
    /// Stops on [`Op::Shutdown`] or when every client channel is dropped,
    /// after in-flight requests have answered.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<(), AeosError> {
        info!("Starting AEOS orchestrator");
        let mut in_flight = JoinSet::new();

        while let Some(op) = self.op_rx.recv().await {
            match op {
                Op::Interact { sub_id, request } => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let event_tx = self.event_tx.clone();
                    in_flight.spawn(async move {
                        let event = interact(&dispatcher, sub_id, &request).await;
                        let _ = event_tx.send(event);
                    });
                }
                Op::Describe { sub_id } => {
                    let _ = self.event_tx.send(Event::Descriptor {
                        sub_id,
                        descriptor: self.dispatcher.describe(),
                    });
                }
                Op::Shutdown => {
                    debug!("Shutdown requested");
                    break;
                }
            }

            // Reap finished requests so the set does not grow unbounded
            while let Some(joined) = in_flight.try_join_next() {
                if let Err(e) = joined {
                    error!(error = %e, "Request task panicked");
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Request task panicked");
            }
        }

        info!("AEOS orchestrator stopped");
        Ok(())
    }
}

/// Handle one request and turn the outcome into an event
async fn interact(dispatcher: &Dispatcher, sub_id: SubmissionId, request: &Request) -> Event {
    match dispatcher.handle(request).await {
        Ok(response) => Event::Response { sub_id, response },
        Err(e) => {
            warn!(sub_id = %sub_id, error = %e, "Request failed");
            Event::Failed {
                sub_id,
                message: e.to_string(),
                client_error: e.is_client_error(),
            }
        }
    }
}
