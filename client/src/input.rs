//! Command-line input parsing with ack sequencing

use shared::{ClientFrame, SubmitRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit { row: usize, col: usize, ch: String },
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "Commands: <row> <col> <char> | show | help | quit";

/// Parses one line typed by the user.
///
/// Only the shape is checked here. Bounds and character rules are enforced by
/// the server, whose rejection is shown to the user as-is.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    match line {
        "" | "show" => return Ok(Command::Show),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let mut parts = line.splitn(3, char::is_whitespace);
    let row = parts.next().unwrap_or_default();
    let col = parts.next().unwrap_or_default();
    let ch = parts.next().unwrap_or_default();

    let row = row
        .parse::<usize>()
        .map_err(|_| format!("Row must be a number, got {:?}", row))?;
    let col = col
        .parse::<usize>()
        .map_err(|_| format!("Column must be a number, got {:?}", col))?;
    if ch.trim().is_empty() {
        return Err("Missing character".to_string());
    }

    Ok(Command::Submit {
        row,
        col,
        ch: ch.trim().to_string(),
    })
}

/// Turns submit commands into frames with increasing ack ids
pub struct InputManager {
    player_id: String,
    next_ack: u64,
}

impl InputManager {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            next_ack: 1,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn submit_frame(&mut self, row: usize, col: usize, ch: &str) -> ClientFrame {
        let ack = self.next_ack;
        self.next_ack += 1;
        ClientFrame::submit(Some(ack), SubmitRequest::new(row, col, ch, &self.player_id))
    }
}
