//! Client-side view of a networked room.
//!
//! The authority is the only writer of match state in networked play. A
//! client never predicts: it sends intents and replaces its view wholesale
//! with each snapshot it receives.

use crate::actions::Move;
use crate::board::Mark;
use crate::game::MatchState;
use crate::protocol::{ClientMessage, ConnectionId, PlayerInfo, RejectReason, ServerMessage};
use crate::room_code::RoomCode;
use crate::series::SeriesState;

/// What a connected client knows about its room
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteView {
    connection_id: Option<ConnectionId>,
    room_id: Option<RoomCode>,
    mark: Option<Mark>,
    roster: Vec<PlayerInfo>,
    state: Option<MatchState>,
    series: Option<SeriesState>,
    last_rejection: Option<RejectReason>,
}

impl RemoteView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
    }

    pub fn room_id(&self) -> Option<&RoomCode> {
        self.room_id.as_ref()
    }

    /// Mark assigned to this client by the authority
    pub fn mark(&self) -> Option<Mark> {
        self.mark
    }

    pub fn roster(&self) -> &[PlayerInfo] {
        &self.roster
    }

    pub fn state(&self) -> Option<&MatchState> {
        self.state.as_ref()
    }

    pub fn series(&self) -> Option<&SeriesState> {
        self.series.as_ref()
    }

    /// The most recent rejection of one of this client's intents
    pub fn last_rejection(&self) -> Option<&RejectReason> {
        self.last_rejection.as_ref()
    }

    /// Whether the current snapshot says this client is to move
    pub fn is_my_turn(&self) -> bool {
        match (&self.state, self.mark) {
            (Some(state), Some(mark)) => !state.is_over() && state.active_mark() == mark,
            _ => false,
        }
    }

    /// Wrap a move as an intent; the view itself is not touched
    pub fn move_intent(&self, mv: Move) -> ClientMessage {
        ClientMessage::Move(mv)
    }

    /// Fold one authority event into the view
    pub fn apply(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::Welcome { connection_id } => {
                self.connection_id = Some(*connection_id);
            }
            ServerMessage::RoomCreated { room_id, mark }
            | ServerMessage::RoomJoined { room_id, mark } => {
                self.room_id = Some(room_id.clone());
                self.mark = Some(*mark);
                self.state = None;
                self.series = None;
            }
            ServerMessage::PlayersUpdated { roster } => {
                self.roster = roster.clone();
            }
            ServerMessage::MatchStarted {
                state,
                series,
                roster,
            } => {
                self.state = Some(*state);
                self.series = Some(*series);
                self.roster = roster.clone();
            }
            ServerMessage::StateUpdated { state } | ServerMessage::MatchRestarted { state } => {
                self.state = Some(*state);
            }
            ServerMessage::SeriesUpdated { series } => {
                self.series = Some(*series);
            }
            ServerMessage::NextMatchStarted { state, series } => {
                self.state = Some(*state);
                self.series = Some(*series);
            }
            ServerMessage::PlayerLeft { .. } => {
                self.state = None;
                self.series = None;
            }
            ServerMessage::LeftRoom => {
                *self = Self {
                    connection_id: self.connection_id,
                    ..Self::default()
                };
            }
            ServerMessage::Rejected { reason } => {
                self.last_rejection = Some(reason.clone());
            }
            ServerMessage::Pong => {}
        }
    }
}
