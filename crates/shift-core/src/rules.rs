//! Rules engine.
//!
//! Pure functions from a [`MatchState`] and a [`Move`] to the next state.
//! Checks run in a fixed precedence: game over, index bounds, then the rules
//! of the specific move kind. A rejected move never partially applies.

use crate::actions::Move;
use crate::board::{is_adjacent, Board, Mark, CELL_COUNT, TOKEN_BUDGET};
use crate::game::{MatchState, Outcome};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a move was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RuleViolation {
    #[error("Match is over")]
    GameOver,

    #[error("Cell is already occupied")]
    CellOccupied,

    #[error("Cell is empty")]
    CellEmpty,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("All tokens are already on the board")]
    TokenLimitReached,

    #[error("Token has no empty neighbor to move to")]
    TokenImmobile,

    #[error("Destination is not adjacent to the picked up token")]
    NotAdjacent,

    #[error("No token in hand")]
    NoPendingPickup,

    #[error("A token is already in hand")]
    TokenInHand,

    #[error("Token belongs to the opponent")]
    NotOwnToken,

    #[error("Token in hand was not picked up from that cell")]
    NotPickupOrigin,

    #[error("Cell index out of range")]
    OutOfBounds,
}

/// Outcome implied by a board: a completed line wins over a full board
pub fn evaluate(board: &Board) -> Option<Outcome> {
    if let Some(mark) = board.winner() {
        Some(Outcome::Winner(mark))
    } else if board.is_draw() {
        Some(Outcome::Draw)
    } else {
        None
    }
}

/// Apply `mv` for the active mark and return the resulting state
pub fn apply(state: &MatchState, mv: Move) -> Result<MatchState, RuleViolation> {
    if state.is_over {
        return Err(RuleViolation::GameOver);
    }

    let target = match mv {
        Move::Place { to } | Move::Relocate { to } => to,
        Move::Pickup { from } | Move::CancelRelocate { from } => from,
    };
    if target >= CELL_COUNT {
        return Err(RuleViolation::OutOfBounds);
    }

    let mut next = *state;
    let mover = state.active_mark;

    match mv {
        Move::Place { to } => {
            if state.pending_pickup.is_some() {
                return Err(RuleViolation::TokenInHand);
            }
            if !state.board.is_empty_cell(to) {
                return Err(RuleViolation::CellOccupied);
            }
            if state.board.count(mover) >= TOKEN_BUDGET {
                return Err(RuleViolation::TokenLimitReached);
            }

            next.board.set(to, Some(mover));
            finish_turn(&mut next);
        }

        Move::Pickup { from } => {
            if state.pending_pickup.is_some() {
                return Err(RuleViolation::TokenInHand);
            }
            match state.board.get(from) {
                None => return Err(RuleViolation::CellEmpty),
                Some(mark) if mark != mover => return Err(RuleViolation::NotOwnToken),
                Some(_) => {}
            }
            if state.board.empty_neighbors(from).is_empty() {
                return Err(RuleViolation::TokenImmobile);
            }

            next.board.set(from, None);
            next.pending_pickup = Some(from);
        }

        Move::Relocate { to } => {
            let origin = state.pending_pickup.ok_or(RuleViolation::NoPendingPickup)?;
            if to == origin {
                // Dropping the token back where it came from is a cancel
                return cancel(state, origin);
            }
            if !state.board.is_empty_cell(to) {
                return Err(RuleViolation::CellOccupied);
            }
            if !is_adjacent(origin, to) {
                return Err(RuleViolation::NotAdjacent);
            }

            next.board.set(to, Some(mover));
            next.pending_pickup = None;
            finish_turn(&mut next);
        }

        Move::CancelRelocate { from } => {
            let origin = state.pending_pickup.ok_or(RuleViolation::NoPendingPickup)?;
            if from != origin {
                return Err(RuleViolation::NotPickupOrigin);
            }
            return cancel(state, origin);
        }
    }

    Ok(next)
}

/// Apply `mv` on behalf of `mark`, which must be the active mark
pub fn apply_as(state: &MatchState, mark: Mark, mv: Move) -> Result<MatchState, RuleViolation> {
    if state.is_over {
        return Err(RuleViolation::GameOver);
    }
    if mark != state.active_mark {
        return Err(RuleViolation::NotYourTurn);
    }
    apply(state, mv)
}

/// Check a move without producing the next state
pub fn validate(state: &MatchState, mv: Move) -> Result<(), RuleViolation> {
    apply(state, mv).map(|_| ())
}

/// Every move the active mark may make in `state`
pub fn legal_moves(state: &MatchState) -> Vec<Move> {
    if state.is_over {
        return Vec::new();
    }

    let board = &state.board;

    if let Some(origin) = state.pending_pickup {
        let mut moves: Vec<Move> = board
            .empty_neighbors(origin)
            .into_iter()
            .map(|to| Move::Relocate { to })
            .collect();
        moves.push(Move::CancelRelocate { from: origin });
        return moves;
    }

    let mover = state.active_mark;
    let mut moves = Vec::new();

    if board.count(mover) < TOKEN_BUDGET {
        moves.extend(board.empty_cells().into_iter().map(|to| Move::Place { to }));
    }

    moves.extend(
        board
            .positions_of(mover)
            .into_iter()
            .filter(|&from| !board.empty_neighbors(from).is_empty())
            .map(|from| Move::Pickup { from }),
    );

    moves
}

fn cancel(state: &MatchState, origin: usize) -> Result<MatchState, RuleViolation> {
    let mut next = *state;
    next.board.set(origin, Some(state.active_mark));
    next.pending_pickup = None;
    Ok(next)
}

fn finish_turn(next: &mut MatchState) {
    next.turns += 1;
    match evaluate(&next.board) {
        Some(outcome) => {
            next.outcome = Some(outcome);
            next.is_over = true;
        }
        None => next.active_mark = next.active_mark.opponent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MatchPhase;
    use pretty_assertions::assert_eq;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    fn position(cells: [Option<Mark>; 9], active: Mark) -> MatchState {
        MatchState::from_position(Board::from_cells(cells), active).unwrap()
    }

    #[test]
    fn test_place_toggles_turn() {
        let state = MatchState::new(Mark::X);
        let next = apply(&state, Move::Place { to: 4 }).unwrap();
        assert_eq!(next.board().get(4), Some(Mark::X));
        assert_eq!(next.active_mark(), Mark::O);
    }

    #[test]
    fn test_place_on_occupied_cell() {
        let state = position([X, E, E, E, E, E, E, E, E], Mark::O);
        assert_eq!(
            apply(&state, Move::Place { to: 0 }),
            Err(RuleViolation::CellOccupied)
        );
    }

    #[test]
    fn test_place_beyond_budget() {
        let state = position([X, E, O, E, X, X, O, E, E], Mark::X);
        assert_eq!(
            apply(&state, Move::Place { to: 1 }),
            Err(RuleViolation::TokenLimitReached)
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let state = MatchState::new(Mark::X);
        assert_eq!(
            apply(&state, Move::Place { to: 9 }),
            Err(RuleViolation::OutOfBounds)
        );
    }

    #[test]
    fn test_pickup_scenario() {
        let state = position([X, E, E, E, E, E, E, E, E], Mark::X);
        let next = apply(&state, Move::Pickup { from: 0 }).unwrap();

        assert_eq!(next.pending_pickup(), Some(0));
        assert_eq!(next.board().get(0), None);
        assert_eq!(next.active_mark(), Mark::X);
        assert_eq!(next.board().count(Mark::X), 0);
    }

    #[test]
    fn test_pickup_errors() {
        let state = position([X, O, E, O, E, E, E, E, E], Mark::X);
        assert_eq!(
            apply(&state, Move::Pickup { from: 4 }),
            Err(RuleViolation::CellEmpty)
        );
        assert_eq!(
            apply(&state, Move::Pickup { from: 1 }),
            Err(RuleViolation::NotOwnToken)
        );
        // X at 0 is boxed in by O at 1 and 3
        assert_eq!(
            apply(&state, Move::Pickup { from: 0 }),
            Err(RuleViolation::TokenImmobile)
        );
    }

    #[test]
    fn test_second_pickup_rejected() {
        let state = position([X, E, X, E, E, E, E, E, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 0 }).unwrap();
        assert_eq!(
            apply(&held, Move::Pickup { from: 2 }),
            Err(RuleViolation::TokenInHand)
        );
        assert_eq!(
            apply(&held, Move::Place { to: 4 }),
            Err(RuleViolation::TokenInHand)
        );
    }

    #[test]
    fn test_relocate_diagonal_rejected() {
        let state = position([X, E, E, E, E, E, E, E, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 0 }).unwrap();
        assert_eq!(
            apply(&held, Move::Relocate { to: 8 }),
            Err(RuleViolation::NotAdjacent)
        );
        assert_eq!(
            apply(&held, Move::Relocate { to: 4 }),
            Err(RuleViolation::NotAdjacent)
        );
    }

    #[test]
    fn test_relocate_completes_turn() {
        let state = position([X, E, E, E, O, E, E, E, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 0 }).unwrap();
        let next = apply(&held, Move::Relocate { to: 3 }).unwrap();

        assert_eq!(next.board().get(3), Some(Mark::X));
        assert_eq!(next.board().get(0), None);
        assert_eq!(next.pending_pickup(), None);
        assert_eq!(next.active_mark(), Mark::O);
    }

    #[test]
    fn test_relocate_without_pickup() {
        let state = MatchState::new(Mark::X);
        assert_eq!(
            apply(&state, Move::Relocate { to: 1 }),
            Err(RuleViolation::NoPendingPickup)
        );
        assert_eq!(
            apply(&state, Move::CancelRelocate { from: 1 }),
            Err(RuleViolation::NoPendingPickup)
        );
    }

    #[test]
    fn test_relocate_onto_occupied_neighbor() {
        let state = position([X, O, E, E, E, E, E, E, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 0 }).unwrap();
        assert_eq!(
            apply(&held, Move::Relocate { to: 1 }),
            Err(RuleViolation::CellOccupied)
        );
    }

    #[test]
    fn test_cancel_restores_exact_state() {
        let state = position([X, E, E, E, O, E, E, E, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 0 }).unwrap();
        let back = apply(&held, Move::CancelRelocate { from: 0 }).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_cancel_wrong_origin() {
        let state = position([X, E, E, E, E, E, E, E, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 0 }).unwrap();
        assert_eq!(
            apply(&held, Move::CancelRelocate { from: 1 }),
            Err(RuleViolation::NotPickupOrigin)
        );
    }

    #[test]
    fn test_relocate_onto_origin_acts_as_cancel() {
        let state = position([X, E, E, E, E, E, E, E, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 0 }).unwrap();
        let back = apply(&held, Move::Relocate { to: 0 }).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_relocate_can_win() {
        // X slides 7 to 6, completing the left column
        let state = position([X, O, E, X, O, E, E, X, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 3 }).unwrap();
        let held = apply(&held, Move::CancelRelocate { from: 3 }).unwrap();
        let held = apply(&held, Move::Pickup { from: 7 }).unwrap();
        let next = apply(&held, Move::Relocate { to: 6 }).unwrap();

        assert_eq!(next.outcome(), Some(Outcome::Winner(Mark::X)));
        assert_eq!(next.phase(), MatchPhase::Complete(Outcome::Winner(Mark::X)));
        assert_eq!(next.active_mark(), Mark::X);
    }

    #[test]
    fn test_apply_as_checks_turn_first() {
        let state = MatchState::new(Mark::X);
        assert_eq!(
            apply_as(&state, Mark::O, Move::Place { to: 0 }),
            Err(RuleViolation::NotYourTurn)
        );
        assert!(apply_as(&state, Mark::X, Move::Place { to: 0 }).is_ok());
    }

    #[test]
    fn test_legal_moves_opening() {
        let moves = legal_moves(&MatchState::new(Mark::X));
        assert_eq!(moves.len(), 9);
        assert!(moves.iter().all(|m| matches!(m, Move::Place { .. })));
    }

    #[test]
    fn test_legal_moves_at_budget() {
        let state = position([X, O, X, O, X, E, E, O, E], Mark::X);
        let moves = legal_moves(&state);
        // X at 0 is boxed in; 2 and 4 can still reach 5
        assert_eq!(moves, vec![Move::Pickup { from: 2 }, Move::Pickup { from: 4 }]);
    }

    #[test]
    fn test_legal_moves_with_token_in_hand() {
        let state = position([E, E, E, E, X, E, E, O, E], Mark::X);
        let held = apply(&state, Move::Pickup { from: 4 }).unwrap();
        let moves = legal_moves(&held);
        assert_eq!(
            moves,
            vec![
                Move::Relocate { to: 1 },
                Move::Relocate { to: 3 },
                Move::Relocate { to: 5 },
                Move::CancelRelocate { from: 4 },
            ]
        );
    }

    #[test]
    fn test_every_legal_move_applies() {
        let state = position([X, O, E, E, X, E, O, E, E], Mark::X);
        for mv in legal_moves(&state) {
            assert!(validate(&state, mv).is_ok(), "{mv}");
        }
    }
}
