//! Per-player submission policy
//!
//! A cooldown of zero seconds means each player gets exactly one accepted move
//! for the lifetime of the process. Any other value gates players to one move
//! per window. Evaluation never records anything; only `record` does, and the
//! coordinator calls it after the grid mutation succeeded.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Deny {
        retry_after_ms: Option<u64>,
        permanent: bool,
    },
}

#[derive(Debug, Clone)]
pub struct CooldownPolicy {
    cooldown_seconds: u64,
    /// Player id -> timestamp of their most recent accepted move
    last_accepted: HashMap<String, u64>,
}

impl CooldownPolicy {
    pub fn new(cooldown_seconds: u64) -> Self {
        Self {
            cooldown_seconds,
            last_accepted: HashMap::new(),
        }
    }

    pub fn cooldown_seconds(&self) -> u64 {
        self.cooldown_seconds
    }

    fn window_ms(&self) -> u64 {
        self.cooldown_seconds.saturating_mul(1000)
    }

    pub fn evaluate(&self, player_id: &str, now: u64) -> Verdict {
        let last = match self.last_accepted.get(player_id) {
            Some(at) => *at,
            None => return Verdict::Admit,
        };

        if self.cooldown_seconds == 0 {
            return Verdict::Deny {
                retry_after_ms: None,
                permanent: true,
            };
        }

        let elapsed = now.saturating_sub(last);
        let window = self.window_ms();
        if elapsed >= window {
            Verdict::Admit
        } else {
            Verdict::Deny {
                retry_after_ms: Some(window - elapsed),
                permanent: false,
            }
        }
    }

    pub fn record(&mut self, player_id: &str, at: u64) {
        self.last_accepted.insert(player_id.to_string(), at);
    }

    pub fn last_accepted(&self, player_id: &str) -> Option<u64> {
        self.last_accepted.get(player_id).copied()
    }

    /// Number of players that have ever had a move accepted
    pub fn tracked_players(&self) -> usize {
        self.last_accepted.len()
    }
}
