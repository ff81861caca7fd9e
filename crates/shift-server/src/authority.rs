//! Room authority: the registry of live rooms and the dispatch of client
//! intents against them.
//!
//! The authority is a plain owned value with no interior locking. The server
//! runs exactly one of them on a single task and feeds it every event in
//! arrival order, so no two intents for the same room are ever validated at
//! the same time. Running several server processes requires routing all
//! traffic for a room to the same process.

use crate::config::ServerConfig;
use crate::room::GameRoom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shift_core::{
    ClientMessage, ConnectionId, Mark, Move, RejectReason, RoomCode, SeriesLength, ServerMessage,
};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// A message addressed to one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

impl Envelope {
    pub fn new(to: ConnectionId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Owns every room and which connection sits in which room
pub struct Authority {
    rooms: HashMap<RoomCode, GameRoom>,
    /// Mapping from connection ID to its room
    memberships: HashMap<ConnectionId, RoomCode>,
    default_series_length: SeriesLength,
    max_rooms: usize,
    rng: StdRng,
}

impl Authority {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &ServerConfig, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            default_series_length: config.default_series_length,
            max_rooms: config.max_rooms,
            rng,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, id: &RoomCode) -> Option<&GameRoom> {
        self.rooms.get(id)
    }

    /// Handle one client intent and return every message it produces.
    ///
    /// Rejections go to the sender only and leave all room state untouched.
    pub fn handle(&mut self, from: ConnectionId, msg: ClientMessage) -> Vec<Envelope> {
        let result = match msg {
            ClientMessage::CreateRoom { series_length } => self.create_room(from, series_length),
            ClientMessage::JoinRoom { room_id } => self.join_room(from, room_id),
            ClientMessage::Ready => self.ready(from),
            ClientMessage::Move(mv) => self.submit_move(from, mv),
            ClientMessage::StartNextMatch => self.start_next_match(from),
            ClientMessage::ResetMatch => self.reset_match(from),
            ClientMessage::LeaveRoom => self.leave(from),
            ClientMessage::Ping => Ok(vec![Envelope::new(from, ServerMessage::Pong)]),
        };

        match result {
            Ok(envelopes) => envelopes,
            Err(reason) => {
                if reason.is_expected() {
                    debug!(connection = %from, %reason, "intent rejected");
                } else {
                    error!(connection = %from, %reason, "internal invariant violated");
                }
                vec![Envelope::new(from, ServerMessage::Rejected { reason })]
            }
        }
    }

    /// A connection dropped: leave its room, telling whoever remains
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<Envelope> {
        if !self.memberships.contains_key(&connection) {
            return Vec::new();
        }

        match self.leave(connection) {
            Ok(envelopes) => envelopes
                .into_iter()
                .filter(|e| e.to != connection)
                .collect(),
            Err(reason) => {
                error!(%connection, %reason, "failed to remove disconnected player");
                Vec::new()
            }
        }
    }

    /// Drop every room; used on server shutdown
    pub fn shutdown(&mut self) -> usize {
        let dropped = self.rooms.len();
        self.rooms.clear();
        self.memberships.clear();
        dropped
    }

    fn create_room(
        &mut self,
        from: ConnectionId,
        series_length: Option<SeriesLength>,
    ) -> Result<Vec<Envelope>, RejectReason> {
        if self.memberships.contains_key(&from) {
            return Err(RejectReason::AlreadyInRoom);
        }
        if self.rooms.len() >= self.max_rooms {
            return Err(RejectReason::RoomLimitReached);
        }

        let room_id = self.fresh_code();
        let series_length = series_length.unwrap_or(self.default_series_length);
        let room = GameRoom::new(room_id.clone(), from, series_length);
        let roster = room.roster();

        self.rooms.insert(room_id.clone(), room);
        self.memberships.insert(from, room_id.clone());
        info!(room = %room_id, creator = %from, ?series_length, "room created");

        Ok(vec![
            Envelope::new(
                from,
                ServerMessage::RoomCreated {
                    room_id,
                    mark: Mark::X,
                },
            ),
            Envelope::new(from, ServerMessage::PlayersUpdated { roster }),
        ])
    }

    fn join_room(
        &mut self,
        from: ConnectionId,
        room_id: String,
    ) -> Result<Vec<Envelope>, RejectReason> {
        if self.memberships.contains_key(&from) {
            return Err(RejectReason::AlreadyInRoom);
        }
        // A code that cannot exist names no room
        let room_id = RoomCode::parse(&room_id).map_err(|_| RejectReason::RoomNotFound)?;
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RejectReason::RoomNotFound)?;

        let mark = room.add_player(from)?;
        self.memberships.insert(from, room_id.clone());
        info!(room = %room_id, player = %from, %mark, "player joined");

        let room = &self.rooms[&room_id];
        let mut out = vec![Envelope::new(
            from,
            ServerMessage::RoomJoined {
                room_id: room_id.clone(),
                mark,
            },
        )];
        broadcast(
            room,
            ServerMessage::PlayersUpdated {
                roster: room.roster(),
            },
            &mut out,
        );
        Ok(out)
    }

    fn ready(&mut self, from: ConnectionId) -> Result<Vec<Envelope>, RejectReason> {
        let room = self.room_mut(from)?;
        let started = room.set_ready(from)?;

        let mut out = Vec::new();
        broadcast(
            room,
            ServerMessage::PlayersUpdated {
                roster: room.roster(),
            },
            &mut out,
        );

        if started {
            let state = room
                .game
                .ok_or_else(|| RejectReason::Internal("match missing after start".into()))?;
            info!(room = %room.id, starting = %state.active_mark(), "match started");
            broadcast(
                room,
                ServerMessage::MatchStarted {
                    state,
                    series: room.series,
                    roster: room.roster(),
                },
                &mut out,
            );
        }
        Ok(out)
    }

    fn submit_move(&mut self, from: ConnectionId, mv: Move) -> Result<Vec<Envelope>, RejectReason> {
        let room = self.room_mut(from)?;
        let applied = room.apply_move(from, mv)?;
        debug!(room = %room.id, player = %from, %mv, "move accepted");

        let mut out = Vec::new();
        broadcast(
            room,
            ServerMessage::StateUpdated {
                state: applied.state,
            },
            &mut out,
        );

        if let Some(series) = applied.series {
            info!(room = %room.id, outcome = ?applied.state.outcome(), "match complete");
            if let Some(winner) = series.winner {
                info!(room = %room.id, outcome = ?winner, "series complete");
            }
            broadcast(room, ServerMessage::SeriesUpdated { series }, &mut out);
        }
        Ok(out)
    }

    fn start_next_match(&mut self, from: ConnectionId) -> Result<Vec<Envelope>, RejectReason> {
        let room = self.room_mut(from)?;
        let (state, series) = room.start_next_match(from)?;
        info!(room = %room.id, match_index = series.match_index, "next match started");

        let mut out = Vec::new();
        broadcast(room, ServerMessage::NextMatchStarted { state, series }, &mut out);
        Ok(out)
    }

    fn reset_match(&mut self, from: ConnectionId) -> Result<Vec<Envelope>, RejectReason> {
        let room = self.room_mut(from)?;
        let state = room.reset_match(from)?;
        debug!(room = %room.id, player = %from, "match reset");

        let mut out = Vec::new();
        broadcast(room, ServerMessage::MatchRestarted { state }, &mut out);
        Ok(out)
    }

    fn leave(&mut self, from: ConnectionId) -> Result<Vec<Envelope>, RejectReason> {
        let room_id = self
            .memberships
            .remove(&from)
            .ok_or(RejectReason::NotInRoom)?;
        let room = self.rooms.get_mut(&room_id).ok_or_else(|| {
            RejectReason::Internal(format!("connection mapped to missing room {room_id}"))
        })?;

        let is_empty = room.remove_player(from)?;
        info!(room = %room_id, player = %from, remaining = room.player_count(), "player left");

        let mut out = vec![Envelope::new(from, ServerMessage::LeftRoom)];
        if is_empty {
            self.rooms.remove(&room_id);
            info!(room = %room_id, "room destroyed");
        } else {
            broadcast(
                room,
                ServerMessage::PlayerLeft {
                    remaining: room.player_count(),
                },
                &mut out,
            );
            broadcast(
                room,
                ServerMessage::PlayersUpdated {
                    roster: room.roster(),
                },
                &mut out,
            );
        }
        Ok(out)
    }

    fn room_mut(&mut self, connection: ConnectionId) -> Result<&mut GameRoom, RejectReason> {
        let room_id = self
            .memberships
            .get(&connection)
            .ok_or(RejectReason::NotInRoom)?;
        self.rooms.get_mut(room_id).ok_or_else(|| {
            RejectReason::Internal(format!("connection mapped to missing room {room_id}"))
        })
    }

    fn fresh_code(&mut self) -> RoomCode {
        loop {
            let code = RoomCode::generate(&mut self.rng);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

/// Queue a message for every player in a room
fn broadcast(room: &GameRoom, msg: ServerMessage, out: &mut Vec<Envelope>) {
    for player in &room.players {
        out.push(Envelope::new(player.id, msg.clone()));
    }
}
