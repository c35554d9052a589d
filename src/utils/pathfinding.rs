//! # Pathfinding Algorithms
//!
//! Weighted 8-directional pathfinding over a per-cell cost grid.
//!
//! A cost of zero marks a cell impassable. Entering a cell costs its grid
//! value times 2 for a cardinal step or times 3 for a diagonal step, so
//! actors prefer straight runs and route around expensive (crowded) cells
//! instead of refusing to move.

use crate::game::Position;
use ::pathfinding::prelude::astar;

const CARDINAL_COST: u32 = 2;
const DIAGONAL_COST: u32 = 3;

/// Dense grid of movement costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostGrid {
    width: i32,
    height: i32,
    costs: Vec<u32>,
}

impl CostGrid {
    /// Creates a grid where every cell is impassable.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            costs: vec![0; (width * height) as usize],
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }

    /// Cost of entering `pos`; zero when impassable or out of bounds.
    pub fn cost(&self, pos: Position) -> u32 {
        self.index(pos).map(|i| self.costs[i]).unwrap_or(0)
    }

    pub fn set_cost(&mut self, pos: Position, cost: u32) {
        if let Some(i) = self.index(pos) {
            self.costs[i] = cost;
        }
    }

    /// Adds a penalty to a passable cell. Impassable cells stay impassable.
    pub fn add_penalty(&mut self, pos: Position, penalty: u32) {
        if let Some(i) = self.index(pos) {
            if self.costs[i] > 0 {
                self.costs[i] += penalty;
            }
        }
    }

    /// Finds the cheapest path from `start` to `goal`.
    ///
    /// The returned path excludes `start` and ends on `goal`. Returns `None`
    /// when the goal is impassable or unreachable.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{CostGrid, Position};
    ///
    /// let mut grid = CostGrid::new(5, 1);
    /// for x in 0..5 {
    ///     grid.set_cost(Position::new(x, 0), 1);
    /// }
    /// let path = grid.find_path(Position::new(0, 0), Position::new(4, 0)).unwrap();
    /// assert_eq!(path.len(), 4);
    /// assert_eq!(path.last(), Some(&Position::new(4, 0)));
    /// ```
    pub fn find_path(&self, start: Position, goal: Position) -> Option<Vec<Position>> {
        if start == goal || self.cost(goal) == 0 {
            return None;
        }

        let (mut path, _cost) = astar(
            &start,
            |pos| self.successors(*pos),
            |pos| pos.chebyshev_distance(goal) * CARDINAL_COST,
            |pos| *pos == goal,
        )?;

        path.remove(0);
        Some(path)
    }

    fn successors(&self, pos: Position) -> Vec<(Position, u32)> {
        pos.adjacent_positions()
            .into_iter()
            .filter_map(|next| {
                let cost = self.cost(next);
                if cost == 0 {
                    return None;
                }
                let step = if next.x != pos.x && next.y != pos.y {
                    DIAGONAL_COST
                } else {
                    CARDINAL_COST
                };
                Some((next, cost * step))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: i32, height: i32) -> CostGrid {
        let mut grid = CostGrid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                grid.set_cost(Position::new(x, y), 1);
            }
        }
        grid
    }

    #[test]
    fn test_diagonal_path_in_open_room() {
        let grid = open_grid(6, 6);
        let path = grid
            .find_path(Position::new(0, 0), Position::new(3, 3))
            .expect("open room should be traversable");
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Position::new(1, 1));
    }

    #[test]
    fn test_walls_block_and_unreachable_goal() {
        let mut grid = open_grid(5, 5);
        for y in 0..5 {
            grid.set_cost(Position::new(2, y), 0);
        }
        assert!(grid.find_path(Position::new(0, 2), Position::new(4, 2)).is_none());
        assert!(grid.find_path(Position::new(0, 2), Position::new(2, 2)).is_none());
    }

    #[test]
    fn test_penalty_routes_around_crowd() {
        let mut grid = open_grid(5, 3);
        grid.add_penalty(Position::new(2, 1), 10);
        let path = grid
            .find_path(Position::new(0, 1), Position::new(4, 1))
            .expect("path exists");
        assert!(!path.contains(&Position::new(2, 1)));
        assert_eq!(path.last(), Some(&Position::new(4, 1)));
    }

    #[test]
    fn test_penalty_does_not_open_walls() {
        let mut grid = CostGrid::new(3, 3);
        grid.add_penalty(Position::new(1, 1), 10);
        assert_eq!(grid.cost(Position::new(1, 1)), 0);
        assert_eq!(grid.cost(Position::new(-1, 1)), 0);
    }
}
