//! Composition root wiring the grid, the cooldown policy and the session
//! registry to a broadcast gateway.
//!
//! The engine is owned by exactly one task. Each call runs to completion
//! before the next one starts, which is what keeps readers from ever seeing a
//! half-applied move.

use crate::coordinator::SubmissionCoordinator;
use crate::cooldown::CooldownPolicy;
use crate::gateway::BroadcastGateway;
use crate::grid::GridStore;
use crate::registry::{ConnectionRegistry, Session, SessionId};
use shared::{SubmitAck, SubmitRequest};

pub struct Engine<G: BroadcastGateway> {
    coordinator: SubmissionCoordinator,
    registry: ConnectionRegistry,
    gateway: G,
}

impl<G: BroadcastGateway> Engine<G> {
    pub fn new(cooldown_seconds: u64, gateway: G) -> Self {
        Self {
            coordinator: SubmissionCoordinator::new(
                GridStore::new(),
                CooldownPolicy::new(cooldown_seconds),
            ),
            registry: ConnectionRegistry::new(),
            gateway,
        }
    }

    pub fn connect(&mut self, session: Session) -> usize {
        let snapshot = self.coordinator.snapshot();
        let cooldown_seconds = self.coordinator.cooldown().cooldown_seconds();
        self.registry
            .on_connect(session, snapshot, cooldown_seconds, &mut self.gateway)
    }

    pub fn disconnect(&mut self, session: SessionId) -> Option<usize> {
        self.registry.on_disconnect(session, &mut self.gateway)
    }

    pub fn submit(
        &mut self,
        session: SessionId,
        ack_id: Option<u64>,
        request: &SubmitRequest,
        now: u64,
    ) -> SubmitAck {
        self.coordinator
            .submit(session, ack_id, request, now, &mut self.gateway)
    }

    pub fn online_count(&self) -> usize {
        self.registry.online_count()
    }

    pub fn coordinator(&self) -> &SubmissionCoordinator {
        &self.coordinator
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }
}
