//! Client-side mirror of the shared grid
//!
//! The viewer holds no authority: it replaces its grid on `init` and applies
//! each `update` as it arrives, in broadcast order.

use log::{debug, warn};
use shared::{empty_grid, Grid, Move, ServerEvent, SubmitAck, COLS, ROWS};

#[derive(Debug, Clone)]
pub struct ClientGridState {
    pub grid: Grid,
    pub moves_seen: usize,
    pub online_count: usize,
    pub cooldown_seconds: u64,
    pub initialized: bool,
    pub last_move: Option<Move>,
}

impl ClientGridState {
    pub fn new() -> Self {
        Self {
            grid: empty_grid(),
            moves_seen: 0,
            online_count: 0,
            cooldown_seconds: 0,
            initialized: false,
            last_move: None,
        }
    }

    /// Applies a server event. Returns true when the grid itself changed.
    pub fn apply_event(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::Init(init) => {
                self.grid = init.grid.clone();
                self.moves_seen = init.history.len();
                self.online_count = init.online_count;
                self.cooldown_seconds = init.cooldown_seconds;
                self.last_move = init.history.last().cloned();
                self.initialized = true;
                true
            }
            ServerEvent::Update(m) => self.apply_move(m),
            ServerEvent::OnlineCount(count) => {
                self.online_count = *count;
                false
            }
            ServerEvent::Ack(_) => false,
        }
    }

    fn apply_move(&mut self, m: &Move) -> bool {
        match self.grid.get_mut(m.row).and_then(|row| row.get_mut(m.col)) {
            Some(cell) => {
                *cell = m.ch.clone();
                self.moves_seen += 1;
                self.last_move = Some(m.clone());
                debug!("{} wrote {:?} at ({}, {})", m.by, m.ch, m.row, m.col);
                true
            }
            None => {
                warn!("Ignoring update outside the grid: ({}, {})", m.row, m.col);
                false
            }
        }
    }

    /// Renders the grid as text with row and column indices.
    pub fn render(&self) -> String {
        let mut out = String::from("   ");
        for col in 0..COLS {
            out.push_str(&format!(" {}", col));
        }
        out.push('\n');

        for (row, cells) in self.grid.iter().enumerate().take(ROWS) {
            out.push_str(&format!("{:>2} ", row));
            for cell in cells {
                out.push(' ');
                if cell.is_empty() {
                    out.push('.');
                } else {
                    out.push_str(cell);
                }
            }
            out.push('\n');
        }

        out.push_str(&format!(
            "online: {}  moves: {}",
            self.online_count, self.moves_seen
        ));
        out
    }

    pub fn policy_description(&self) -> String {
        match self.cooldown_seconds {
            0 => "You can place one character, ever.".to_string(),
            n => format!("You can place one character every {} seconds.", n),
        }
    }
}

impl Default for ClientGridState {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable outcome of a submission
pub fn describe_ack(ack: &SubmitAck) -> String {
    if ack.ok {
        return "Placed!".to_string();
    }

    let error = ack.error.as_deref().unwrap_or("Rejected");
    if ack.permanent == Some(true) {
        format!("{}: you have already used your move", error)
    } else if let Some(ms) = ack.retry_after_ms {
        format!("{}: try again in {:.1}s", error, ms as f64 / 1000.0)
    } else {
        error.to_string()
    }
}
