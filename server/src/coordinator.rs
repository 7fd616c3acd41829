//! End-to-end handling of one submission attempt
//!
//! Received -> Validated -> CooldownChecked -> Applied -> Acknowledged, with
//! an early exit to a rejection acknowledgement at any failing step. State is
//! only touched once every check has passed: the grid mutation comes first,
//! then the cooldown record, then the broadcast and the acknowledgement.

use crate::cooldown::{CooldownPolicy, Verdict};
use crate::gateway::BroadcastGateway;
use crate::grid::{GridStore, Snapshot};
use crate::registry::SessionId;
use log::{debug, error, info};
use serde_json::Value;
use shared::{AckPayload, Move, ServerEvent, SubmitAck, SubmitRequest, COLS, ROWS};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Invalid coordinates")]
    InvalidCoordinates,
    #[error("Character required")]
    CharacterRequired,
    #[error("playerId required")]
    PlayerIdRequired,
    #[error("On cooldown")]
    OnCooldown {
        retry_after_ms: Option<u64>,
        permanent: bool,
    },
    #[error("Server error")]
    Internal,
}

impl SubmitError {
    pub fn to_ack(&self) -> SubmitAck {
        let mut ack = SubmitAck::rejected(self.to_string());
        if let SubmitError::OnCooldown {
            retry_after_ms,
            permanent,
        } = self
        {
            ack.retry_after_ms = *retry_after_ms;
            if *permanent {
                ack.permanent = Some(true);
            }
        }
        ack
    }
}

/// A submission whose shape has been checked and normalised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub row: usize,
    pub col: usize,
    pub ch: String,
    pub player_id: String,
}

pub fn validate(request: &SubmitRequest) -> Result<ValidSubmission, SubmitError> {
    let row = coordinate(&request.row, ROWS).ok_or(SubmitError::InvalidCoordinates)?;
    let col = coordinate(&request.col, COLS).ok_or(SubmitError::InvalidCoordinates)?;

    let ch = request
        .ch
        .as_str()
        .and_then(first_grapheme)
        .ok_or(SubmitError::CharacterRequired)?;

    let player_id = request
        .player_id
        .as_str()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(SubmitError::PlayerIdRequired)?;

    Ok(ValidSubmission {
        row,
        col,
        ch: ch.to_string(),
        player_id: player_id.to_string(),
    })
}

/// Accepts JSON integers, and floats with no fractional part, below `bound`.
fn coordinate(value: &Value, bound: usize) -> Option<usize> {
    let index = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f.fract() != 0.0 || f < 0.0 || f >= bound as f64 {
                return None;
            }
            f as u64
        }
    };
    usize::try_from(index).ok().filter(|i| *i < bound)
}

fn first_grapheme(raw: &str) -> Option<&str> {
    raw.trim().graphemes(true).next()
}

/// Owns the grid and the cooldown state and is the only code that mutates them.
#[derive(Debug)]
pub struct SubmissionCoordinator {
    grid: GridStore,
    cooldown: CooldownPolicy,
}

impl SubmissionCoordinator {
    pub fn new(grid: GridStore, cooldown: CooldownPolicy) -> Self {
        Self { grid, cooldown }
    }

    /// Runs one submission to completion.
    ///
    /// On success the move is broadcast to every session as `update`. The
    /// acknowledgement, success or rejection, goes to `session` only and is
    /// also returned for the caller's logging.
    pub fn submit<G: BroadcastGateway>(
        &mut self,
        session: SessionId,
        ack_id: Option<u64>,
        request: &SubmitRequest,
        now: u64,
        gateway: &mut G,
    ) -> SubmitAck {
        let result = match self.process(request, now) {
            Ok(applied) => {
                let at = applied.at;
                gateway.broadcast(&ServerEvent::Update(applied));
                SubmitAck::accepted(at)
            }
            Err(e) => {
                debug!("Session {} submission rejected: {}", session, e);
                e.to_ack()
            }
        };

        gateway.send_to(
            session,
            &ServerEvent::Ack(AckPayload {
                ack: ack_id,
                result: result.clone(),
            }),
        );
        result
    }

    fn process(&mut self, request: &SubmitRequest, now: u64) -> Result<Move, SubmitError> {
        let submission = validate(request)?;

        // History timestamps never go backwards, even if the wall clock does
        let now = self.grid.last_timestamp().map_or(now, |last| now.max(last));

        if let Verdict::Deny {
            retry_after_ms,
            permanent,
        } = self.cooldown.evaluate(&submission.player_id, now)
        {
            return Err(SubmitError::OnCooldown {
                retry_after_ms,
                permanent,
            });
        }

        let applied = self
            .grid
            .apply_move(
                submission.row,
                submission.col,
                submission.ch,
                submission.player_id,
                now,
            )
            .map_err(|e| {
                error!("Grid rejected a validated move: {}", e);
                SubmitError::Internal
            })?;
        self.cooldown.record(&applied.by, applied.at);

        info!(
            "{} wrote {:?} at ({}, {})",
            applied.by, applied.ch, applied.row, applied.col
        );
        Ok(applied)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.grid.snapshot()
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn cooldown(&self) -> &CooldownPolicy {
        &self.cooldown
    }
}
