//! Move intents a player can submit.
//!
//! Moves are transient: only their effect on the match state survives. On the
//! wire a move is a flat object tagged by `kind`, e.g. `{"kind":"place","to":4}`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// All possible moves a player can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Move {
    /// Occupy an empty cell with a new token
    Place { to: usize },
    /// Lift one of your own tokens; it stays in hand until relocated or returned
    Pickup { from: usize },
    /// Put the token in hand down on an adjacent empty cell
    Relocate { to: usize },
    /// Return the token in hand to where it was picked up (does not end the turn)
    CancelRelocate { from: usize },
}

impl Move {
    /// Whether this move completes a turn when accepted.
    ///
    /// A relocate onto its own pickup origin is the exception: the engine
    /// treats it as a cancel.
    pub fn ends_turn(&self) -> bool {
        matches!(self, Move::Place { .. } | Move::Relocate { .. })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place { to } => write!(f, "place@{to}"),
            Move::Pickup { from } => write!(f, "pickup@{from}"),
            Move::Relocate { to } => write!(f, "relocate@{to}"),
            Move::CancelRelocate { from } => write!(f, "cancel@{from}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_string(&Move::CancelRelocate { from: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"cancel_relocate","from":3}"#);

        let parsed: Move = serde_json::from_str(r#"{"kind":"relocate","to":5}"#).unwrap();
        assert_eq!(parsed, Move::Relocate { to: 5 });
    }

    #[test]
    fn test_missing_field_rejected() {
        assert!(serde_json::from_str::<Move>(r#"{"kind":"place"}"#).is_err());
    }
}
