//! Best-of-N series scoring.
//!
//! A series is 1, 3 or 5 matches. Draws count as a played match but give no
//! one a win. The series ends as soon as one mark reaches a majority of the
//! configured length, or when every match has been played, in which case the
//! higher win count takes it and equal counts are a draw.

use crate::board::Mark;
use crate::game::Outcome;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from misusing the series coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SeriesError {
    #[error("Series length must be 1, 3 or 5, got {0}")]
    InvalidLength(u8),

    #[error("Series is already decided")]
    SeriesOver,

    #[error("Current match result was already recorded")]
    AlreadyRecorded,

    #[error("Current match has not finished")]
    MatchUnfinished,
}

/// Number of matches in a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SeriesLength {
    #[default]
    One,
    Three,
    Five,
}

impl SeriesLength {
    /// Total matches in the series
    pub const fn matches(self) -> u32 {
        match self {
            SeriesLength::One => 1,
            SeriesLength::Three => 3,
            SeriesLength::Five => 5,
        }
    }

    /// Wins needed to take the series outright: ceil(length / 2)
    pub const fn wins_needed(self) -> u32 {
        self.matches().div_ceil(2)
    }
}

impl TryFrom<u8> for SeriesLength {
    type Error = SeriesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SeriesLength::One),
            3 => Ok(SeriesLength::Three),
            5 => Ok(SeriesLength::Five),
            other => Err(SeriesError::InvalidLength(other)),
        }
    }
}

impl From<SeriesLength> for u8 {
    fn from(length: SeriesLength) -> u8 {
        length.matches() as u8
    }
}

/// Score and progress of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesState {
    pub length: SeriesLength,
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
    /// Matches whose result has been recorded
    pub matches_played: u32,
    /// 1-based index of the current match
    pub match_index: u32,
    /// Mark that moves first in odd-numbered matches
    pub starting_mark: Mark,
    pub winner: Option<Outcome>,
}

impl SeriesState {
    pub fn new(length: SeriesLength, starting_mark: Mark) -> Self {
        Self {
            length,
            x_wins: 0,
            o_wins: 0,
            draws: 0,
            matches_played: 0,
            match_index: 1,
            starting_mark,
            winner: None,
        }
    }

    /// Starting mark for the 1-based match `index`: odd keeps the series' mark, even flips it
    pub fn starting_mark_for(&self, index: u32) -> Mark {
        if index % 2 == 1 {
            self.starting_mark
        } else {
            self.starting_mark.opponent()
        }
    }

    /// Starting mark of the current match
    pub fn current_starting_mark(&self) -> Mark {
        self.starting_mark_for(self.match_index)
    }

    pub fn wins(&self, mark: Mark) -> u32 {
        match mark {
            Mark::X => self.x_wins,
            Mark::O => self.o_wins,
        }
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Whether the current match's result is already counted
    pub fn current_recorded(&self) -> bool {
        self.matches_played >= self.match_index
    }

    /// Count the current match's result and decide the series if it is settled.
    ///
    /// Returns the series outcome once decided.
    pub fn record(&mut self, outcome: Outcome) -> Result<Option<Outcome>, SeriesError> {
        if self.is_over() {
            return Err(SeriesError::SeriesOver);
        }
        if self.current_recorded() {
            return Err(SeriesError::AlreadyRecorded);
        }

        match outcome {
            Outcome::Winner(Mark::X) => self.x_wins += 1,
            Outcome::Winner(Mark::O) => self.o_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.matches_played += 1;
        self.winner = self.decide();

        Ok(self.winner)
    }

    /// Move to the next match and return who starts it
    pub fn advance(&mut self) -> Result<Mark, SeriesError> {
        if self.is_over() {
            return Err(SeriesError::SeriesOver);
        }
        if !self.current_recorded() {
            return Err(SeriesError::MatchUnfinished);
        }

        self.match_index += 1;
        Ok(self.current_starting_mark())
    }

    /// A fresh series with the same length and starting mark
    pub fn rematch(&self) -> Self {
        Self::new(self.length, self.starting_mark)
    }

    fn decide(&self) -> Option<Outcome> {
        let needed = self.length.wins_needed();
        if self.x_wins >= needed {
            return Some(Outcome::Winner(Mark::X));
        }
        if self.o_wins >= needed {
            return Some(Outcome::Winner(Mark::O));
        }
        if self.matches_played < self.length.matches() {
            return None;
        }

        Some(match self.x_wins.cmp(&self.o_wins) {
            std::cmp::Ordering::Greater => Outcome::Winner(Mark::X),
            std::cmp::Ordering::Less => Outcome::Winner(Mark::O),
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }
}
