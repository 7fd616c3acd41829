//! # Shared Grid Server
//!
//! Authoritative server for a single 10x10 character grid that many viewers
//! edit at once. It owns the canonical grid, decides which submissions are
//! admitted, keeps a replayable history of every accepted move and pushes
//! each change to all connected viewers.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The grid and its append-only history live only here. Viewers render what
//! the server broadcasts; replaying the history over an empty grid always
//! reproduces the current grid.
//!
//! ### Submission Policy
//! Players are identified by a self-asserted token. A cooldown of `N > 0`
//! seconds admits one move per player per window; a cooldown of zero admits
//! exactly one move per player for the lifetime of the process. Rejected or
//! malformed submissions never consume a player's allowance.
//!
//! ### Session Management
//! Every connect and disconnect updates the online count, which is
//! rebroadcast to all sessions. New sessions receive an `init` snapshot with
//! the grid, the full history, the online count and the cooldown setting.
//!
//! ## Architecture Design
//!
//! ### Single Engine Loop
//! Connection tasks run on the multi-threaded tokio runtime but never touch
//! state. They forward decoded frames over one channel to the server loop,
//! which owns the [`engine::Engine`] and handles one message at a time to
//! completion: validate, check cooldown, mutate, broadcast, acknowledge.
//! Nothing awaits I/O in the middle of a mutation.
//!
//! ### WebSocket Transport
//! Sessions speak JSON over WebSockets. The upgrade handshake enforces the
//! configured origin allow-list before a session is registered. The same
//! port answers `GET /health` for liveness checks.
//!
//! ## Module Organization
//!
//! - `grid`: grid matrix, move history, replay
//! - `cooldown`: per-player admission policy
//! - `registry`: session membership and online count
//! - `coordinator`: the per-submission pipeline
//! - `gateway`: outbound delivery seam and its channel implementation
//! - `engine`: composition root used by the server loop
//! - `network`: listener, connection tasks, liveness probe, server loop
//! - `config` / `origin`: command-line and environment configuration
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::Config;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         cooldown_seconds: 5,
//!         ..Config::default()
//!     };
//!
//!     let mut server = Server::new(&config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cooldown;
pub mod coordinator;
pub mod engine;
pub mod gateway;
pub mod grid;
pub mod network;
pub mod origin;
pub mod registry;
pub mod utils;
