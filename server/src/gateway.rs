//! Outbound event delivery to viewer sessions

use crate::registry::SessionId;
use log::debug;
use shared::ServerEvent;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Pushes events to sessions. Delivery is fire-and-forget: a session whose
/// transport already went away is skipped, its disconnect arrives separately.
pub trait BroadcastGateway {
    fn broadcast(&mut self, event: &ServerEvent);
    fn send_to(&mut self, session: SessionId, event: &ServerEvent);
}

/// Gateway backed by one unbounded outbox per connection task.
///
/// The engine loop only enqueues; each connection task drains its own outbox
/// onto the socket, so a slow viewer never stalls a submission.
#[derive(Debug, Default)]
pub struct ChannelGateway {
    outboxes: HashMap<SessionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl ChannelGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, session: SessionId, outbox: mpsc::UnboundedSender<ServerEvent>) {
        self.outboxes.insert(session, outbox);
    }

    pub fn detach(&mut self, session: SessionId) {
        self.outboxes.remove(&session);
    }

    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }
}

impl BroadcastGateway for ChannelGateway {
    fn broadcast(&mut self, event: &ServerEvent) {
        for (session, outbox) in &self.outboxes {
            if outbox.send(event.clone()).is_err() {
                debug!("Session {} outbox closed, skipping broadcast", session);
            }
        }
    }

    fn send_to(&mut self, session: SessionId, event: &ServerEvent) {
        match self.outboxes.get(&session) {
            Some(outbox) => {
                if outbox.send(event.clone()).is_err() {
                    debug!("Session {} outbox closed, dropping event", session);
                }
            }
            None => debug!("No outbox for session {}", session),
        }
    }
}

/// Test double that records every delivery in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingGateway {
    pub broadcasts: Vec<ServerEvent>,
    pub direct: Vec<(SessionId, ServerEvent)>,
}

#[cfg(test)]
impl BroadcastGateway for RecordingGateway {
    fn broadcast(&mut self, event: &ServerEvent) {
        self.broadcasts.push(event.clone());
    }

    fn send_to(&mut self, session: SessionId, event: &ServerEvent) {
        self.direct.push((session, event.clone()));
    }
}
