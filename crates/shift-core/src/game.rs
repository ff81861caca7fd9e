//! Match state machine.
//!
//! A match moves between three phases:
//!
//! - `AwaitingMove`: no token in hand; the active mark may place or pick up
//! - `TokenInHand`: a token was picked up; the same mark must relocate or return it
//! - `Complete`: terminal, reached by any move that produces a winner or draw
//!
//! All transitions go through [`rules::apply`](crate::rules::apply), which
//! either produces the next state or rejects the move without touching the
//! current one.

use crate::actions::Move;
use crate::board::{Board, Mark};
use crate::rules::{self, RuleViolation};
use serde::{Deserialize, Serialize};

/// How a finished match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "mark")]
pub enum Outcome {
    Winner(Mark),
    Draw,
}

impl Outcome {
    /// The winning mark, if the match was decisive
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::Winner(mark) => Some(*mark),
            Outcome::Draw => None,
        }
    }
}

/// Derived phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    AwaitingMove,
    TokenInHand { from: usize },
    Complete(Outcome),
}

/// The complete state of one match.
///
/// Fields are read-only outside the crate; the only way to change a match is
/// to submit a [`Move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub(crate) board: Board,
    pub(crate) active_mark: Mark,
    /// Origin of the token in hand, set strictly between a pickup and its relocation
    pub(crate) pending_pickup: Option<usize>,
    pub(crate) outcome: Option<Outcome>,
    /// Mirrors `outcome.is_some()`, kept on the wire for clients
    pub(crate) is_over: bool,
    /// Which mark moved first in this match
    pub(crate) starting_mark: Mark,
    /// Number of completed turns
    pub(crate) turns: u32,
}

impl MatchState {
    /// A fresh match: empty board, `starting_mark` to move
    pub fn new(starting_mark: Mark) -> Self {
        Self {
            board: Board::new(),
            active_mark: starting_mark,
            pending_pickup: None,
            outcome: None,
            is_over: false,
            starting_mark,
            turns: 0,
        }
    }

    /// A match resumed from an arbitrary position with `active_mark` to move.
    ///
    /// The outcome is evaluated from the board. Rejects positions that exceed
    /// the token budget.
    pub fn from_position(board: Board, active_mark: Mark) -> Result<Self, RuleViolation> {
        if Mark::ALL
            .iter()
            .any(|m| board.count(*m) > crate::board::TOKEN_BUDGET)
        {
            return Err(RuleViolation::TokenLimitReached);
        }

        let outcome = rules::evaluate(&board);
        Ok(Self {
            board,
            active_mark,
            pending_pickup: None,
            outcome,
            is_over: outcome.is_some(),
            starting_mark: active_mark,
            turns: 0,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The mark whose turn it is
    pub fn active_mark(&self) -> Mark {
        self.active_mark
    }

    pub fn pending_pickup(&self) -> Option<usize> {
        self.pending_pickup
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.is_over
    }

    pub fn starting_mark(&self) -> Mark {
        self.starting_mark
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Current phase derived from the state fields
    pub fn phase(&self) -> MatchPhase {
        match (self.outcome, self.pending_pickup) {
            (Some(outcome), _) => MatchPhase::Complete(outcome),
            (None, Some(from)) => MatchPhase::TokenInHand { from },
            (None, None) => MatchPhase::AwaitingMove,
        }
    }

    /// Apply a move for the active mark. On rejection `self` is untouched.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), RuleViolation> {
        *self = rules::apply(self, mv)?;
        Ok(())
    }

    /// Apply a move on behalf of `mark`, rejecting it if `mark` is not to move
    pub fn apply_move_as(&mut self, mark: Mark, mv: Move) -> Result<(), RuleViolation> {
        *self = rules::apply_as(self, mark, mv)?;
        Ok(())
    }

    /// Every move the active mark could legally make now
    pub fn legal_moves(&self) -> Vec<Move> {
        rules::legal_moves(self)
    }
}
