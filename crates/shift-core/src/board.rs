//! Board representation and grid geometry.
//!
//! The board is a 3x3 grid addressed by row-major indices 0-8:
//!
//! ```text
//!  0 | 1 | 2
//! ---+---+---
//!  3 | 4 | 5
//! ---+---+---
//!  6 | 7 | 8
//! ```
//!
//! Adjacency is the 4-neighborhood (up, down, left, right). Diagonal cells are
//! never adjacent, even though diagonals still count as winning lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cells on the board
pub const CELL_COUNT: usize = 9;

/// Grid side length
pub const SIDE: usize = 3;

/// Maximum number of cells a single mark may occupy at once
pub const TOKEN_BUDGET: usize = 3;

/// The 8 winning lines, checked in this order: rows, columns, diagonals
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A player's symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Both marks, X first
    pub const ALL: [Mark; 2] = [Mark::X, Mark::O];

    /// The other mark
    pub const fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// Orthogonal neighbors of `index` that exist on the grid.
///
/// Corners have 2 neighbors, edges 3 and the center 4. Out-of-range indices
/// have none.
pub fn adjacent_of(index: usize) -> Vec<usize> {
    if index >= CELL_COUNT {
        return Vec::new();
    }

    let row = index / SIDE;
    let col = index % SIDE;
    let mut neighbors = Vec::with_capacity(4);

    if row > 0 {
        neighbors.push(index - SIDE);
    }
    if row + 1 < SIDE {
        neighbors.push(index + SIDE);
    }
    if col > 0 {
        neighbors.push(index - 1);
    }
    if col + 1 < SIDE {
        neighbors.push(index + 1);
    }

    neighbors
}

/// Whether `b` is an orthogonal neighbor of `a`
pub fn is_adjacent(a: usize, b: usize) -> bool {
    adjacent_of(a).contains(&b)
}

/// The game board: nine cells, each empty or holding a mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    /// An empty board
    pub const fn new() -> Self {
        Self {
            cells: [None; CELL_COUNT],
        }
    }

    /// Build a board from explicit cell values
    pub const fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    /// Cell contents, `None` if empty or out of range
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    /// Whether `index` is on the board and unoccupied
    pub fn is_empty_cell(&self, index: usize) -> bool {
        index < CELL_COUNT && self.cells[index].is_none()
    }

    pub(crate) fn set(&mut self, index: usize, value: Option<Mark>) {
        self.cells[index] = value;
    }

    /// Number of cells occupied by `mark`
    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|c| **c == Some(mark)).count()
    }

    /// Indices occupied by `mark`
    pub fn positions_of(&self, mark: Mark) -> Vec<usize> {
        (0..CELL_COUNT)
            .filter(|&i| self.cells[i] == Some(mark))
            .collect()
    }

    /// Indices that are empty
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELL_COUNT).filter(|&i| self.cells[i].is_none()).collect()
    }

    /// Empty orthogonal neighbors of `index`
    pub fn empty_neighbors(&self, index: usize) -> Vec<usize> {
        adjacent_of(index)
            .into_iter()
            .filter(|&n| self.cells[n].is_none())
            .collect()
    }

    /// Whether every cell is occupied
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The mark completing the first full line, checked rows, columns, diagonals
    pub fn winner(&self) -> Option<Mark> {
        WIN_LINES.iter().find_map(|[a, b, c]| {
            let mark = self.cells[*a]?;
            (self.cells[*b] == Some(mark) && self.cells[*c] == Some(mark)).then_some(mark)
        })
    }

    /// Full board with no winning line
    pub fn is_draw(&self) -> bool {
        self.is_full() && self.winner().is_none()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIDE {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..SIDE {
                match self.cells[row * SIDE + col] {
                    Some(mark) => write!(f, "{mark}")?,
                    None => f.write_str(".")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    #[test]
    fn test_neighbor_counts() {
        let counts: Vec<usize> = (0..CELL_COUNT).map(|i| adjacent_of(i).len()).collect();
        assert_eq!(counts, vec![2, 3, 2, 3, 4, 3, 2, 3, 2]);
    }

    #[test]
    fn test_center_neighbors() {
        let mut n = adjacent_of(4);
        n.sort_unstable();
        assert_eq!(n, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_no_row_wraparound() {
        // 2 and 3 are consecutive indices on different rows
        assert!(!is_adjacent(2, 3));
        assert!(!is_adjacent(5, 6));
    }

    #[test]
    fn test_diagonals_not_adjacent() {
        assert!(!is_adjacent(0, 4));
        assert!(!is_adjacent(0, 8));
        assert!(!is_adjacent(2, 4));
    }

    #[test]
    fn test_adjacency_symmetric() {
        for i in 0..CELL_COUNT {
            for j in 0..CELL_COUNT {
                assert_eq!(is_adjacent(i, j), is_adjacent(j, i), "({i}, {j})");
            }
        }
    }

    #[test]
    fn test_out_of_range_has_no_neighbors() {
        assert!(adjacent_of(9).is_empty());
        assert!(!is_adjacent(8, 9));
    }

    #[test]
    fn test_row_winner() {
        let board = Board::from_cells([X, X, X, E, O, E, E, E, E]);
        assert_eq!(board.winner(), Some(Mark::X));
    }

    #[test]
    fn test_column_and_diagonal_winners() {
        let column = Board::from_cells([E, O, E, X, O, E, X, O, E]);
        assert_eq!(column.winner(), Some(Mark::O));

        let diagonal = Board::from_cells([E, E, X, O, X, E, X, O, E]);
        assert_eq!(diagonal.winner(), Some(Mark::X));
    }

    #[test]
    fn test_no_winner() {
        let board = Board::from_cells([X, O, X, E, E, E, O, X, O]);
        assert_eq!(board.winner(), None);
        assert!(!board.is_draw());
    }

    #[test]
    fn test_draw_requires_full_board() {
        let full = Board::from_cells([X, O, X, X, O, O, O, X, X]);
        assert!(full.is_draw());

        let won = Board::from_cells([X, X, X, O, O, X, O, X, O]);
        assert!(won.is_full());
        assert!(!won.is_draw());
    }

    #[test]
    fn test_counts_and_positions() {
        let board = Board::from_cells([X, E, O, E, X, E, E, E, O]);
        assert_eq!(board.count(Mark::X), 2);
        assert_eq!(board.count(Mark::O), 2);
        assert_eq!(board.positions_of(Mark::O), vec![2, 8]);
        assert_eq!(board.empty_neighbors(0), vec![3, 1]);
    }

    #[test]
    fn test_display() {
        let board = Board::from_cells([X, E, O, E, X, E, E, E, O]);
        assert_eq!(board.to_string(), "X.O\n.X.\n..O");
    }

    #[test]
    fn test_serializes_as_cell_array() {
        let board = Board::from_cells([X, E, E, E, O, E, E, E, E]);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);
    }
}
