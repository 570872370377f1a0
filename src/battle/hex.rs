//! Hex coordinates for the abstract battle board (axial coordinates)
//!
//! Uses axial coordinates (q, r); q runs between the two board edges.

use serde::{Deserialize, Serialize};

/// Axial hex coordinate on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Distance in hexes
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Hexes in a line from self to other (inclusive)
    pub fn line_to(&self, other: &Self) -> Vec<HexCoord> {
        let n = self.distance(other) as i32;
        if n == 0 {
            return vec![*self];
        }

        let mut results = Vec::with_capacity((n + 1) as usize);
        for i in 0..=n {
            let t = i as f32 / n as f32;
            let q = self.q as f32 + (other.q - self.q) as f32 * t;
            let r = self.r as f32 + (other.r - self.r) as f32 * t;
            results.push(Self::round(q, r));
        }
        results
    }

    /// The hex reached after moving at most `steps` hexes toward `other`
    pub fn step_toward(&self, other: &Self, steps: u32) -> HexCoord {
        let line = self.line_to(other);
        let index = (steps as usize).min(line.len() - 1);
        line[index]
    }

    /// Round floating point hex to nearest integer hex
    fn round(q: f32, r: f32) -> Self {
        let s = -q - r;
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_along_row() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(7, 0);
        assert_eq!(a.distance(&b), 7);
        assert_eq!(b.distance(&a), 7);
    }

    #[test]
    fn test_distance_is_zero_to_self() {
        let a = HexCoord::new(4, 2);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_line_includes_both_ends() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(3, 0);
        let line = a.line_to(&b);
        assert_eq!(line.len(), 4);
        assert_eq!(line[0], a);
        assert_eq!(line[3], b);
    }

    #[test]
    fn test_step_toward_stops_at_destination() {
        let a = HexCoord::new(2, 0);
        let b = HexCoord::new(5, 0);
        assert_eq!(a.step_toward(&b, 2), HexCoord::new(4, 0));
        assert_eq!(a.step_toward(&b, 10), b);
        assert_eq!(a.step_toward(&a, 3), a);
    }
}
