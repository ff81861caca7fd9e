//! Computer opponent.
//!
//! The rest of the crate only talks to the opponent through [`MoveSelector`],
//! so any move-selection strategy can be plugged in. [`Bot`] is the bundled one:
//! - Easy: random legal move
//! - Medium: takes a winning turn, otherwise avoids handing the opponent one
//! - Hard: Medium, then prefers strong cells and open two-in-a-rows
//!
//! A "turn" may span two moves (pickup then relocate). The bot plans whole
//! turns and returns the first move of the chosen plan; when called again with
//! a token in hand it re-plans from that position.

use crate::actions::Move;
use crate::board::{Board, Mark, WIN_LINES};
use crate::game::{MatchState, Outcome};
use crate::rules;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Anything that can pick a move for the computer side.
///
/// Must return a move the rules engine accepts for `state`, or `None` when
/// `mark` has nothing legal to do.
pub trait MoveSelector {
    fn select_move(&mut self, state: &MatchState, mark: Mark, difficulty: Difficulty)
        -> Option<Move>;
}

/// A complete turn: the move to submit now and the position after the turn
#[derive(Debug, Clone, Copy)]
struct Plan {
    first: Move,
    result: MatchState,
}

/// The bundled computer opponent
pub struct Bot {
    rng: StdRng,
}

impl Bot {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a move for the active mark of `state`
    pub fn choose_move(&mut self, state: &MatchState, difficulty: Difficulty) -> Option<Move> {
        let plans = turn_plans(state);
        if plans.is_empty() {
            return None;
        }

        match difficulty {
            Difficulty::Easy => plans.choose(&mut self.rng).map(|p| p.first),
            Difficulty::Medium => self.choose_medium(state.active_mark(), &plans),
            Difficulty::Hard => self.choose_hard(state.active_mark(), &plans),
        }
    }

    fn choose_medium(&mut self, mark: Mark, plans: &[Plan]) -> Option<Move> {
        if let Some(win) = plans.iter().find(|p| wins(p, mark)) {
            return Some(win.first);
        }

        let safe = safe_plans(mark, plans);
        let pool = if safe.is_empty() {
            plans.to_vec()
        } else {
            safe
        };
        pool.choose(&mut self.rng).map(|p| p.first)
    }

    fn choose_hard(&mut self, mark: Mark, plans: &[Plan]) -> Option<Move> {
        if let Some(win) = plans.iter().find(|p| wins(p, mark)) {
            return Some(win.first);
        }

        let safe = safe_plans(mark, plans);
        let pool = if safe.is_empty() {
            plans.to_vec()
        } else {
            safe
        };

        let best = pool
            .iter()
            .map(|p| position_score(p.result.board(), mark))
            .max()?;
        let top: Vec<&Plan> = pool
            .iter()
            .filter(|p| position_score(p.result.board(), mark) == best)
            .collect();
        top.choose(&mut self.rng).map(|p| p.first)
    }
}

impl Default for Bot {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveSelector for Bot {
    fn select_move(
        &mut self,
        state: &MatchState,
        mark: Mark,
        difficulty: Difficulty,
    ) -> Option<Move> {
        if state.is_over() || state.active_mark() != mark {
            return None;
        }
        self.choose_move(state, difficulty)
    }
}

/// Every complete turn available to the active mark
fn turn_plans(state: &MatchState) -> Vec<Plan> {
    let mut plans = Vec::new();

    for mv in rules::legal_moves(state) {
        match mv {
            Move::Pickup { .. } => {
                let Ok(held) = rules::apply(state, mv) else {
                    continue;
                };
                for follow in rules::legal_moves(&held) {
                    if !follow.ends_turn() {
                        continue;
                    }
                    if let Ok(result) = rules::apply(&held, follow) {
                        plans.push(Plan { first: mv, result });
                    }
                }
            }
            Move::CancelRelocate { .. } => {}
            Move::Place { .. } | Move::Relocate { .. } => {
                if let Ok(result) = rules::apply(state, mv) {
                    plans.push(Plan { first: mv, result });
                }
            }
        }
    }

    plans
}

fn wins(plan: &Plan, mark: Mark) -> bool {
    plan.result.outcome() == Some(Outcome::Winner(mark))
}

/// Plans after which the opponent has no immediately winning turn
fn safe_plans(mark: Mark, plans: &[Plan]) -> Vec<Plan> {
    let opponent = mark.opponent();
    plans
        .iter()
        .filter(|p| {
            p.result.is_over() || !turn_plans(&p.result).iter().any(|r| wins(r, opponent))
        })
        .copied()
        .collect()
}

/// Cell weights favour the center, then corners
const CELL_WEIGHTS: [i32; 9] = [2, 1, 2, 1, 3, 1, 2, 1, 2];

fn position_score(board: &Board, mark: Mark) -> i32 {
    let placement: i32 = board
        .positions_of(mark)
        .into_iter()
        .map(|i| CELL_WEIGHTS[i])
        .sum();

    let open_pairs = WIN_LINES
        .iter()
        .filter(|line| {
            let mine = line.iter().filter(|&&i| board.get(i) == Some(mark)).count();
            let empty = line.iter().filter(|&&i| board.is_empty_cell(i)).count();
            mine == 2 && empty == 1
        })
        .count() as i32;

    placement + 2 * open_pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    fn position(cells: [Option<Mark>; 9], active: Mark) -> MatchState {
        MatchState::from_position(Board::from_cells(cells), active).unwrap()
    }

    #[test]
    fn test_every_difficulty_returns_legal_move() {
        let state = position([X, O, E, E, X, E, O, E, E], Mark::X);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let mut bot = Bot::with_seed(7);
            let mv = bot.select_move(&state, Mark::X, difficulty).unwrap();
            assert!(rules::validate(&state, mv).is_ok(), "{difficulty:?}: {mv}");
        }
    }

    #[test]
    fn test_medium_takes_win() {
        let state = position([X, X, E, O, O, E, E, E, E], Mark::X);
        let mut bot = Bot::with_seed(1);
        assert_eq!(
            bot.select_move(&state, Mark::X, Difficulty::Medium),
            Some(Move::Place { to: 2 })
        );
    }

    #[test]
    fn test_medium_blocks_placement_threat() {
        // O threatens 5; X can block by placing there or by sliding 8 up
        let state = position([X, E, E, O, O, E, E, E, X], Mark::X);
        for seed in 0..10 {
            let mut bot = Bot::with_seed(seed);
            let mv = bot.select_move(&state, Mark::X, Difficulty::Medium);
            assert!(
                matches!(mv, Some(Move::Place { to: 5 }) | Some(Move::Pickup { from: 8 })),
                "seed {seed}: {mv:?}"
            );
        }
    }

    #[test]
    fn test_hard_prefers_center_on_empty_board() {
        let state = MatchState::new(Mark::O);
        let mut bot = Bot::with_seed(3);
        assert_eq!(
            bot.select_move(&state, Mark::O, Difficulty::Hard),
            Some(Move::Place { to: 4 })
        );
    }

    #[test]
    fn test_completes_turn_with_token_in_hand() {
        let state = position([X, X, E, O, O, E, X, E, E], Mark::X);
        let held = rules::apply(&state, Move::Pickup { from: 6 }).unwrap();
        let mut bot = Bot::with_seed(5);
        let mv = bot.select_move(&held, Mark::X, Difficulty::Medium).unwrap();
        assert!(matches!(mv, Move::Relocate { .. }));
    }

    #[test]
    fn test_wrong_mark_or_finished_match() {
        let mut bot = Bot::with_seed(0);
        let state = MatchState::new(Mark::X);
        assert_eq!(bot.select_move(&state, Mark::O, Difficulty::Easy), None);

        let won = position([X, X, X, O, O, E, E, E, E], Mark::O);
        assert_eq!(bot.select_move(&won, Mark::O, Difficulty::Easy), None);
    }

    #[test]
    fn test_plans_are_whole_turns() {
        let state = position([X, O, E, E, X, E, O, E, E], Mark::X);
        let plans = turn_plans(&state);
        assert!(!plans.is_empty());
        for plan in plans {
            assert!(matches!(plan.first, Move::Place { .. } | Move::Pickup { .. }));
            assert_eq!(plan.result.pending_pickup(), None);
            assert!(plan.result.turns() > state.turns());
        }
    }
}
