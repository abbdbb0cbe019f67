use grid_util::point::Point;

use crate::solver::{manhattan_distance, GridSolver};
use crate::DEFAULT_HEURISTIC_WEIGHT;

/// A* with a Manhattan heuristic. The cost of entering a cell is its base
/// cost; modifiers are not charged.
#[derive(Clone, Debug)]
pub struct AstarSolver {
    pub heuristic_weight: f64,
}

impl Default for AstarSolver {
    fn default() -> Self {
        AstarSolver::new()
    }
}

impl AstarSolver {
    pub fn new() -> AstarSolver {
        AstarSolver {
            heuristic_weight: DEFAULT_HEURISTIC_WEIGHT,
        }
    }
    pub fn with_weight(heuristic_weight: f64) -> AstarSolver {
        AstarSolver { heuristic_weight }
    }
}

impl GridSolver for AstarSolver {
    fn edge_cost(&self, base_cost: f64, _cost_modifier: f64) -> f64 {
        base_cost
    }

    /// Manhattan distance times the heuristic weight. A weight above 1 inflates the
    /// estimate, trading optimality for fewer expansions.
    fn heuristic(&self, from: &Point, goal: &Point) -> f64 {
        manhattan_distance(from, goal) as f64 * self.heuristic_weight
    }
}
