//! Shift Tac Toe - tic-tac-toe with a three token budget and sliding moves
//!
//! This crate provides the core game logic, including:
//! - Board geometry: 4-neighborhood adjacency, win lines, draw detection
//! - Rules engine that validates place, pickup, relocate and cancel moves
//! - Match state machine and best-of-N series scoring
//! - Local controller for offline play, with a pluggable computer opponent
//! - Sync protocol messages and a client-side mirror for networked play
//!
//! # Architecture
//!
//! The engine is platform-agnostic. It can be compiled to:
//! - Native Rust for the authoritative room server
//! - WebAssembly for client-side local and vs-computer play
//!
//! # Modules
//!
//! - [`board`]: Grid, marks and geometry
//! - [`actions`]: Move intents
//! - [`rules`]: Move validation and application
//! - [`game`]: Match state machine
//! - [`series`]: Best-of-N scoring
//! - [`bot`]: Computer opponent
//! - [`local`]: Offline controller
//! - [`protocol`]: Client/server messages
//! - [`mirror`]: Networked client view

pub mod actions;
pub mod board;
pub mod bot;
pub mod game;
pub mod local;
pub mod mirror;
pub mod protocol;
pub mod room_code;
pub mod rules;
pub mod series;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::Move;
pub use board::{adjacent_of, is_adjacent, Board, Mark, CELL_COUNT, TOKEN_BUDGET};
pub use bot::{Bot, Difficulty, MoveSelector};
pub use game::{MatchPhase, MatchState, Outcome};
pub use local::{ComputerTurn, LocalConfig, LocalController, LocalError, PlayMode, TurnOutcome};
pub use mirror::RemoteView;
pub use protocol::{ClientMessage, ConnectionId, PlayerInfo, RejectReason, ServerMessage};
pub use room_code::{RoomCode, RoomCodeError};
pub use rules::{legal_moves, RuleViolation};
pub use series::{SeriesError, SeriesLength, SeriesState};
