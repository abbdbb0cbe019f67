use grid_util::point::Point;

use crate::solver::GridSolver;

/// Uniform-cost search: the cost of entering a cell includes its modifier
/// and there is no heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct DijkstraSolver;

impl GridSolver for DijkstraSolver {
    fn edge_cost(&self, base_cost: f64, cost_modifier: f64) -> f64 {
        base_cost * cost_modifier
    }

    fn heuristic(&self, _: &Point, _: &Point) -> f64 {
        0.0
    }
}
