//! WebSocket protocol messages for networked play.
//!
//! Intents flow client to authority; snapshots flow authority to every client
//! in the room. Every broadcast carries full state rather than a delta, so a
//! client that missed one update is consistent again after the next.

use crate::actions::Move;
use crate::board::Mark;
use crate::game::MatchState;
use crate::room_code::RoomCode;
use crate::rules::RuleViolation;
use crate::series::{SeriesLength, SeriesState};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifies one client connection for its lifetime
pub type ConnectionId = Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a room; the creator plays X. Omitted length uses the server default.
    CreateRoom {
        #[serde(default)]
        series_length: Option<SeriesLength>,
    },

    /// Join an existing room as O. The code is checked by the authority, so
    /// a mistyped one is answered with `RoomNotFound`.
    JoinRoom { room_id: String },

    /// Signal readiness; the first match starts when both players are ready
    Ready,

    /// Submit a move for the current match
    Move(Move),

    /// Start the next match once the current one is over
    StartNextMatch,

    /// Restart the current match from an empty board
    ResetMatch,

    /// Leave the current room
    LeaveRoom,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Sent once on connect
    Welcome { connection_id: ConnectionId },

    /// Room created; the creator's mark
    RoomCreated { room_id: RoomCode, mark: Mark },

    /// Joined a room; the joiner's mark
    RoomJoined { room_id: RoomCode, mark: Mark },

    /// Roster changed (join, leave, ready)
    PlayersUpdated { roster: Vec<PlayerInfo> },

    /// First match of a series began
    MatchStarted {
        state: MatchState,
        series: SeriesState,
        roster: Vec<PlayerInfo>,
    },

    /// A move was accepted
    StateUpdated { state: MatchState },

    /// A match finished and the series score changed
    SeriesUpdated { series: SeriesState },

    /// The current match was restarted
    MatchRestarted { state: MatchState },

    /// The next match of the series (or a rematch series) began
    NextMatchStarted {
        state: MatchState,
        series: SeriesState,
    },

    /// A player left; the match in progress is abandoned
    PlayerLeft { remaining: usize },

    /// Left room successfully
    LeftRoom,

    /// An intent was refused; sent only to the connection that sent it
    Rejected { reason: RejectReason },

    /// Pong response
    Pong,
}

/// A room member as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: ConnectionId,
    pub mark: Mark,
    pub ready: bool,
}

/// Why the authority refused an intent
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum RejectReason {
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    #[error("Not in a room")]
    NotInRoom,

    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Server room limit reached")]
    RoomLimitReached,

    #[error("Match has not started")]
    MatchNotStarted,

    #[error("Current match is still in progress")]
    MatchInProgress,

    #[error("Match is already complete")]
    MatchComplete,

    #[error("Malformed intent: {0}")]
    MalformedIntent(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RejectReason {
    /// Whether this is ordinary user behaviour, as opposed to a server bug
    pub fn is_expected(&self) -> bool {
        !matches!(self, RejectReason::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_intent_wire_shape() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"Move","payload":{"kind":"pickup","from":2}}"#)
                .unwrap();
        assert_eq!(msg, ClientMessage::Move(Move::Pickup { from: 2 }));
    }

    #[test]
    fn test_create_room_length_optional() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"CreateRoom","payload":{}}"#).unwrap();
        assert_eq!(msg, ClientMessage::CreateRoom { series_length: None });

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"CreateRoom","payload":{"series_length":5}}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                series_length: Some(SeriesLength::Five)
            }
        );
    }

    #[test]
    fn test_unit_intents() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Ready"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ready);
    }

    #[test]
    fn test_mistyped_room_code_still_decodes() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"JoinRoom","payload":{"room_id":"zzzzz"}}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room_id: "zzzzz".into()
            }
        );
    }

    #[test]
    fn test_rejection_wire_shape() {
        let msg = ServerMessage::Rejected {
            reason: RuleViolation::NotYourTurn.into(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "Rejected");
        assert_eq!(value["payload"]["reason"]["kind"], "Rule");
        assert_eq!(value["payload"]["reason"]["detail"], "NotYourTurn");
    }

    #[test]
    fn test_internal_is_unexpected() {
        assert!(RejectReason::RoomFull.is_expected());
        assert!(RejectReason::MalformedIntent("eof".into()).is_expected());
        assert!(RejectReason::Rule(RuleViolation::GameOver).is_expected());
        assert!(!RejectReason::Internal("lost room".into()).is_expected());
    }
}
