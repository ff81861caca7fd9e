//! Local controller for offline play.
//!
//! Runs a match and its series directly with no authority round-trip, either
//! for two players sharing a device or against the computer. In networked play
//! this type is not used; see [`mirror`](crate::mirror) instead.
//!
//! Computer moves are delayed by a think time. The controller never sleeps
//! itself: it hands out a [`ComputerTurn`] ticket, the host waits
//! `ticket.delay` on whatever timer it has, then calls
//! [`LocalController::run_computer_turn`]. Every state transition bumps an
//! internal generation counter, so a ticket issued before a move, reset, next
//! match or mode change is ignored when it finally fires.

use crate::actions::Move;
use crate::board::Mark;
use crate::bot::{Bot, Difficulty, MoveSelector};
use crate::game::MatchState;
use crate::rules::RuleViolation;
use crate::series::{SeriesError, SeriesLength, SeriesState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Default pause before the computer moves
pub const DEFAULT_THINK_TIME: Duration = Duration::from_millis(600);

/// Who is playing on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    /// Two humans taking turns on one device
    LocalPair,
    /// One human against the computer, which plays `computer`
    VsComputer { computer: Mark, difficulty: Difficulty },
}

impl PlayMode {
    /// The mark played by the computer, if any
    pub fn computer_mark(&self) -> Option<Mark> {
        match self {
            PlayMode::LocalPair => None,
            PlayMode::VsComputer { computer, .. } => Some(*computer),
        }
    }
}

/// Settings for a local session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalConfig {
    pub mode: PlayMode,
    pub series_length: SeriesLength,
    pub starting_mark: Mark,
    pub think_time: Duration,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            mode: PlayMode::LocalPair,
            series_length: SeriesLength::One,
            starting_mark: Mark::X,
            think_time: DEFAULT_THINK_TIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocalError {
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("Computer has no legal move")]
    NoLegalMove,

    #[error("Current match is already complete")]
    MatchComplete,
}

/// Permission for one delayed computer move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputerTurn {
    generation: u64,
    /// How long the host should wait before running the turn
    pub delay: Duration,
}

impl ComputerTurn {
    /// The delay in whole milliseconds, saturating at `i32::MAX` for JS timers
    pub fn delay_ms(&self) -> i32 {
        i32::try_from(self.delay.as_millis()).unwrap_or(i32::MAX)
    }
}

/// Result of firing a [`ComputerTurn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The computer's move was applied
    Applied(Move),
    /// The ticket was cancelled by a later transition; nothing happened
    Stale,
}

/// Owns the match and series for offline play
pub struct LocalController {
    config: LocalConfig,
    state: MatchState,
    series: SeriesState,
    selector: Box<dyn MoveSelector + Send>,
    generation: u64,
    scheduled: Option<ComputerTurn>,
}

impl LocalController {
    /// A controller using the bundled [`Bot`] for computer turns
    pub fn new(config: LocalConfig) -> Self {
        Self::with_selector(config, Box::new(Bot::new()))
    }

    pub fn with_selector(config: LocalConfig, selector: Box<dyn MoveSelector + Send>) -> Self {
        let series = SeriesState::new(config.series_length, config.starting_mark);
        let mut controller = Self {
            config,
            state: MatchState::new(series.current_starting_mark()),
            series,
            selector,
            generation: 0,
            scheduled: None,
        };
        controller.reschedule();
        controller
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn series(&self) -> &SeriesState {
        &self.series
    }

    pub fn mode(&self) -> PlayMode {
        self.config.mode
    }

    /// The computer turn waiting to be run, if it is the computer's move
    pub fn pending_computer_turn(&self) -> Option<ComputerTurn> {
        self.scheduled
    }

    /// Submit a human move.
    ///
    /// Against the computer, moves made while the computer is active are
    /// rejected with `NotYourTurn`.
    pub fn submit(&mut self, mv: Move) -> Result<&MatchState, LocalError> {
        let computer_to_move = self.config.mode.computer_mark() == Some(self.state.active_mark());
        if computer_to_move && !self.state.is_over() {
            return Err(RuleViolation::NotYourTurn.into());
        }

        let mover = self.state.active_mark();
        self.state.apply_move(mv)?;
        debug!(%mv, mark = %mover, "local move applied");
        self.after_move()?;
        Ok(&self.state)
    }

    /// Run a previously issued computer turn.
    ///
    /// A ticket invalidated by any later transition yields `Stale` and leaves
    /// the state alone.
    pub fn run_computer_turn(&mut self, ticket: ComputerTurn) -> Result<TurnOutcome, LocalError> {
        if self.scheduled != Some(ticket) || ticket.generation != self.generation {
            debug!(generation = ticket.generation, "discarding stale computer turn");
            return Ok(TurnOutcome::Stale);
        }
        self.scheduled = None;

        let PlayMode::VsComputer {
            computer,
            difficulty,
        } = self.config.mode
        else {
            return Ok(TurnOutcome::Stale);
        };

        let Some(mv) = self.selector.select_move(&self.state, computer, difficulty) else {
            warn!(%computer, "computer has no legal move");
            return Err(LocalError::NoLegalMove);
        };

        if let Err(violation) = self.state.apply_move_as(computer, mv) {
            error!(%mv, %violation, "move selector produced an illegal move");
            return Err(violation.into());
        }

        debug!(%mv, %computer, "computer move applied");
        self.after_move()?;
        Ok(TurnOutcome::Applied(mv))
    }

    /// Start the next match of the series, or a fresh series once it is decided
    pub fn start_next_match(&mut self) -> Result<&MatchState, LocalError> {
        if !self.state.is_over() {
            return Err(SeriesError::MatchUnfinished.into());
        }

        let starting = if self.series.is_over() {
            self.series = self.series.rematch();
            self.series.current_starting_mark()
        } else {
            self.series.advance()?
        };

        self.state = MatchState::new(starting);
        info!(match_index = self.series.match_index, %starting, "next match started");
        self.reschedule();
        Ok(&self.state)
    }

    /// Restart the current match from an empty board without recording it
    pub fn reset_match(&mut self) -> Result<&MatchState, LocalError> {
        if self.state.is_over() {
            return Err(LocalError::MatchComplete);
        }

        self.state = MatchState::new(self.series.current_starting_mark());
        debug!(match_index = self.series.match_index, "match reset");
        self.reschedule();
        Ok(&self.state)
    }

    /// Switch play mode; the series starts over
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.config.mode = mode;
        self.series = self.series.rematch();
        self.state = MatchState::new(self.series.current_starting_mark());
        info!(?mode, "play mode changed");
        self.reschedule();
    }

    /// Drop any pending computer turn
    pub fn cancel_computer_turn(&mut self) {
        self.generation += 1;
        self.scheduled = None;
    }

    fn after_move(&mut self) -> Result<(), LocalError> {
        if let Some(outcome) = self.state.outcome() {
            let decided = self.series.record(outcome)?;
            info!(?outcome, match_index = self.series.match_index, "match complete");
            if let Some(series_outcome) = decided {
                info!(outcome = ?series_outcome, "series complete");
            }
        }
        self.reschedule();
        Ok(())
    }

    fn reschedule(&mut self) {
        self.cancel_computer_turn();
        if self.state.is_over() {
            return;
        }
        if self.config.mode.computer_mark() == Some(self.state.active_mark()) {
            self.scheduled = Some(ComputerTurn {
                generation: self.generation,
                delay: self.config.think_time,
            });
        }
    }
}
