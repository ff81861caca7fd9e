//! Game room management.
//!
//! A room holds at most two connections. The first to arrive plays X, the
//! second O; if a player leaves, the next joiner takes the free mark. The
//! room owns the canonical match and series and is the only thing that
//! mutates them.

use shift_core::{
    ConnectionId, Mark, MatchState, Move, PlayerInfo, RejectReason, RoomCode, RuleViolation,
    SeriesLength, SeriesState,
};

/// Maximum connections per room
pub const MAX_PLAYERS: usize = 2;

/// A player in a game room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPlayer {
    pub id: ConnectionId,
    pub mark: Mark,
    pub ready: bool,
}

impl RoomPlayer {
    pub fn new(id: ConnectionId, mark: Mark) -> Self {
        Self {
            id,
            mark,
            ready: false,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            mark: self.mark,
            ready: self.ready,
        }
    }
}

/// Result of an accepted move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplied {
    pub state: MatchState,
    /// Present when the move finished the match
    pub series: Option<SeriesState>,
}

/// A game room for two players.
#[derive(Debug, Clone)]
pub struct GameRoom {
    pub id: RoomCode,
    /// Players in join order
    pub players: Vec<RoomPlayer>,
    pub series: SeriesState,
    /// The match in progress, `None` until both players are ready
    pub game: Option<MatchState>,
}

impl GameRoom {
    /// A room whose creator plays X
    pub fn new(id: RoomCode, creator: ConnectionId, series_length: SeriesLength) -> Self {
        Self {
            id,
            players: vec![RoomPlayer::new(creator, Mark::X)],
            series: SeriesState::new(series_length, Mark::X),
            game: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn mark_of(&self, player_id: ConnectionId) -> Option<Mark> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.mark)
    }

    pub fn roster(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(RoomPlayer::to_info).collect()
    }

    /// Admit a connection and return its mark
    pub fn add_player(&mut self, player_id: ConnectionId) -> Result<Mark, RejectReason> {
        if self.mark_of(player_id).is_some() {
            return Err(RejectReason::AlreadyInRoom);
        }
        if self.is_full() {
            return Err(RejectReason::RoomFull);
        }

        let mark = if self.players.iter().any(|p| p.mark == Mark::X) {
            Mark::O
        } else {
            Mark::X
        };
        self.players.push(RoomPlayer::new(player_id, mark));
        Ok(mark)
    }

    /// Remove a connection. Any match in progress is abandoned and the
    /// series starts over. Returns true if the room is now empty.
    pub fn remove_player(&mut self, player_id: ConnectionId) -> Result<bool, RejectReason> {
        if self.mark_of(player_id).is_none() {
            return Err(RejectReason::NotInRoom);
        }

        self.players.retain(|p| p.id != player_id);
        for player in &mut self.players {
            player.ready = false;
        }
        self.game = None;
        self.series = self.series.rematch();

        Ok(self.is_empty())
    }

    /// Mark a player ready. Returns true if this started the first match.
    pub fn set_ready(&mut self, player_id: ConnectionId) -> Result<bool, RejectReason> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(RejectReason::NotInRoom)?;
        player.ready = true;

        let all_ready = self.is_full() && self.players.iter().all(|p| p.ready);
        if all_ready && self.game.is_none() {
            self.game = Some(MatchState::new(self.series.current_starting_mark()));
            return Ok(true);
        }
        Ok(false)
    }

    pub fn apply_move(
        &mut self,
        player_id: ConnectionId,
        mv: Move,
    ) -> Result<MoveApplied, RejectReason> {
        let mark = self.mark_of(player_id).ok_or(RejectReason::NotInRoom)?;
        let game = self.game.as_mut().ok_or(RejectReason::MatchNotStarted)?;

        if game.is_over() {
            return Err(RuleViolation::GameOver.into());
        }
        // Check if it's this player's turn
        if game.active_mark() != mark {
            return Err(RuleViolation::NotYourTurn.into());
        }

        game.apply_move_as(mark, mv)?;
        let state = *game;

        let series = match state.outcome() {
            Some(outcome) => {
                self.series
                    .record(outcome)
                    .map_err(|e| RejectReason::Internal(e.to_string()))?;
                Some(self.series)
            }
            None => None,
        };

        Ok(MoveApplied { state, series })
    }

    /// Begin the next match of the series, or a rematch series once decided
    pub fn start_next_match(
        &mut self,
        player_id: ConnectionId,
    ) -> Result<(MatchState, SeriesState), RejectReason> {
        self.mark_of(player_id).ok_or(RejectReason::NotInRoom)?;
        let game = self.game.as_ref().ok_or(RejectReason::MatchNotStarted)?;
        if !game.is_over() {
            return Err(RejectReason::MatchInProgress);
        }

        let starting = if self.series.is_over() {
            self.series = self.series.rematch();
            self.series.current_starting_mark()
        } else {
            self.series
                .advance()
                .map_err(|e| RejectReason::Internal(e.to_string()))?
        };

        let state = MatchState::new(starting);
        self.game = Some(state);
        Ok((state, self.series))
    }

    /// Restart the match in progress from an empty board
    pub fn reset_match(&mut self, player_id: ConnectionId) -> Result<MatchState, RejectReason> {
        self.mark_of(player_id).ok_or(RejectReason::NotInRoom)?;
        let game = self.game.as_ref().ok_or(RejectReason::MatchNotStarted)?;
        if game.is_over() {
            return Err(RejectReason::MatchComplete);
        }

        let state = MatchState::new(self.series.current_starting_mark());
        self.game = Some(state);
        Ok(state)
    }
}
