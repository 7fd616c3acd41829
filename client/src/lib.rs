//! # Grid Viewer Library
//!
//! Headless terminal viewer for the shared grid server. It mirrors the
//! server's grid from `init` and `update` events, prints it after every
//! change, and submits characters typed as `<row> <col> <char>`.
//!
//! The viewer never predicts: a submission only shows up once the server
//! broadcasts the accepted move, and the acknowledgement is printed as a
//! short status line (placed, cooldown remaining, or the rejection reason).
//!
//! ## Module Organization
//!
//! - `game`: local mirror of the grid, text rendering, ack descriptions
//! - `input`: command parsing and submit frame construction
//! - `network`: WebSocket connection and the event/stdin loop

pub mod game;
pub mod input;
pub mod network;
