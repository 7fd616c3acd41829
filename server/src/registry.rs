//! Connected viewer sessions and the online count derived from them
//!
//! The registry is the only owner of session membership. Every membership
//! change is followed by an online count broadcast, and a newly connected
//! session additionally receives the `init` snapshot.

use crate::gateway::BroadcastGateway;
use crate::grid::Snapshot;
use log::info;
use shared::{InitPayload, ServerEvent};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

/// Opaque handle identifying one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata about a connected viewer
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Remote address of the transport connection
    pub addr: SocketAddr,
    pub connected_at: Instant,
}

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the session, broadcasts the new count to everyone (the new
    /// session included) and sends the newcomer its `init` payload.
    ///
    /// Returns the online count after the change.
    pub fn on_connect<G: BroadcastGateway>(
        &mut self,
        session: Session,
        snapshot: Snapshot,
        cooldown_seconds: u64,
        gateway: &mut G,
    ) -> usize {
        let id = session.id;
        info!("Session {} connected from {}", id, session.addr);
        self.sessions.insert(id, session);

        let online_count = self.online_count();
        gateway.broadcast(&ServerEvent::OnlineCount(online_count));
        gateway.send_to(
            id,
            &ServerEvent::Init(InitPayload {
                grid: snapshot.grid,
                history: snapshot.history,
                online_count,
                cooldown_seconds,
            }),
        );
        online_count
    }

    /// Removes the session and rebroadcasts the count to the remaining ones.
    ///
    /// Unknown sessions are ignored so a duplicate close cannot skew the count.
    pub fn on_disconnect<G: BroadcastGateway>(
        &mut self,
        session: SessionId,
        gateway: &mut G,
    ) -> Option<usize> {
        let removed = self.sessions.remove(&session)?;
        info!(
            "Session {} disconnected after {:.1}s",
            removed.id,
            removed.connected_at.elapsed().as_secs_f32()
        );

        let online_count = self.online_count();
        gateway.broadcast(&ServerEvent::OnlineCount(online_count));
        Some(online_count)
    }

    pub fn online_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.sessions.contains_key(&session)
    }

    pub fn get(&self, session: SessionId) -> Option<&Session> {
        self.sessions.get(&session)
    }
}
