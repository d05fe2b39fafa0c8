//! Grid-shaped environment capability.
use crate::{EnvSpace, TabularEnv};
use serde::{Deserialize, Serialize};

/// A `width` x `height` grid where each cell is a state.
///
/// State `s` lies at column `s / height` and row `s % height`. Four actions
/// are defined: `0` left, `1` up, `2` down and `3` right; moves leaving the
/// grid are not allowed. States outside the grid, including every state of
/// an empty grid, have no allowed actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpace {
    width: usize,
    height: usize,
}

impl GridSpace {
    /// Number of actions of a grid.
    pub const NUMBER_OF_ACTIONS: usize = 4;

    /// Creates a grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Width of the grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid.
    pub fn height(&self) -> usize {
        self.height
    }

    fn stox(&self, s: usize) -> usize {
        s / self.height
    }

    fn stoy(&self, s: usize) -> usize {
        s % self.height
    }
}

impl EnvSpace for GridSpace {
    fn number_of_states(&self) -> usize {
        self.width * self.height
    }

    fn number_of_actions(&self) -> usize {
        Self::NUMBER_OF_ACTIONS
    }
}

impl TabularEnv for GridSpace {
    fn allowed_actions(&self, s: usize) -> Vec<usize> {
        if s >= self.number_of_states() {
            return Vec::new();
        }
        let (x, y) = (self.stox(s), self.stoy(s));
        let mut allowed = Vec::with_capacity(Self::NUMBER_OF_ACTIONS);
        if x > 0 {
            allowed.push(0);
        }
        if y > 0 {
            allowed.push(1);
        }
        if y + 1 < self.height {
            allowed.push(2);
        }
        if x + 1 < self.width {
            allowed.push(3);
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::GridSpace;
    use crate::{EnvSpace, TabularEnv};

    #[test]
    fn test_allowed_actions_at_borders() {
        let grid = GridSpace::new(3, 2);
        assert_eq!(grid.number_of_states(), 6);
        assert_eq!(grid.number_of_actions(), 4);

        // (x, y) = (0, 0)
        assert_eq!(grid.allowed_actions(0), vec![2, 3]);
        // (0, 1)
        assert_eq!(grid.allowed_actions(1), vec![1, 3]);
        // (1, 0)
        assert_eq!(grid.allowed_actions(2), vec![0, 2, 3]);
        // (2, 1)
        assert_eq!(grid.allowed_actions(5), vec![0, 1]);
    }

    #[test]
    fn test_single_cell_has_no_moves() {
        let grid = GridSpace::new(1, 1);
        assert!(grid.allowed_actions(0).is_empty());
    }

    #[test]
    fn test_empty_grid_has_no_moves() {
        assert!(GridSpace::new(3, 0).allowed_actions(0).is_empty());
        assert!(GridSpace::new(0, 3).allowed_actions(1).is_empty());
        assert!(GridSpace::new(2, 2).allowed_actions(4).is_empty());
    }
}
