//! Abstract battle board
//!
//! No terrain is modelled here; the board only bounds positions and defines
//! the two edges formations withdraw through.

use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::core::SimulationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub width: u32,
    pub height: u32,
}

impl Board {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.board_width, config.board_height)
    }

    fn max_q(&self) -> i32 {
        self.width as i32 - 1
    }

    fn max_r(&self) -> i32 {
        self.height as i32 - 1
    }

    /// Check if coordinate is within board bounds
    pub fn in_bounds(&self, coord: HexCoord) -> bool {
        coord.q >= 0 && coord.r >= 0 && coord.q <= self.max_q() && coord.r <= self.max_r()
    }

    /// Pull an out-of-board coordinate back onto the board
    pub fn clamp(&self, coord: HexCoord) -> HexCoord {
        HexCoord::new(
            coord.q.clamp(0, self.max_q()),
            coord.r.clamp(0, self.max_r()),
        )
    }

    /// Is this coordinate on either withdrawal edge (column 0 or the last column)?
    pub fn is_edge(&self, coord: HexCoord) -> bool {
        coord.q == 0 || coord.q == self.max_q()
    }

    /// The closest edge hex in the same row. Ties go to column 0.
    pub fn nearest_edge(&self, coord: HexCoord) -> HexCoord {
        let coord = self.clamp(coord);
        if coord.q <= self.max_q() - coord.q {
            HexCoord::new(0, coord.r)
        } else {
            HexCoord::new(self.max_q(), coord.r)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pulls_back_onto_board() {
        let board = Board::new(10, 3);
        assert_eq!(board.clamp(HexCoord::new(-4, 7)), HexCoord::new(0, 2));
        assert_eq!(board.clamp(HexCoord::new(12, 1)), HexCoord::new(9, 1));
        assert_eq!(board.clamp(HexCoord::new(5, 1)), HexCoord::new(5, 1));
    }

    #[test]
    fn test_edges() {
        let board = Board::new(10, 1);
        assert!(board.is_edge(HexCoord::new(0, 0)));
        assert!(board.is_edge(HexCoord::new(9, 0)));
        assert!(!board.is_edge(HexCoord::new(5, 0)));
    }

    #[test]
    fn test_nearest_edge() {
        let board = Board::new(10, 1);
        assert_eq!(board.nearest_edge(HexCoord::new(2, 0)), HexCoord::new(0, 0));
        assert_eq!(board.nearest_edge(HexCoord::new(7, 0)), HexCoord::new(9, 0));
    }

    #[test]
    fn test_zero_size_board_is_one_hex() {
        let board = Board::new(0, 0);
        assert!(board.in_bounds(HexCoord::new(0, 0)));
        assert!(board.is_edge(HexCoord::new(0, 0)));
    }
}
