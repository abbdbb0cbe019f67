use grid_util::point::Point;

use crate::error::{PathfindingError, Result};
use crate::grid::Grid;
use crate::search::{PathResult, Search};

pub mod astar;
pub mod dijkstra;

pub use astar::AstarSolver;
pub use dijkstra::DijkstraSolver;

/// Solver selected at runtime, e.g. from [SearchSettings](crate::SearchSettings).
pub type BoxedSolver = Box<dyn GridSolver + Send + Sync>;

/// Selects the cost model of a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
}

impl Algorithm {
    /// Builds the solver for this algorithm. The weight only affects [Algorithm::AStar] but
    /// is validated for both.
    pub fn solver(self, heuristic_weight: f64) -> Result<BoxedSolver> {
        if !heuristic_weight.is_finite() || heuristic_weight < 0.0 {
            return Err(PathfindingError::InvalidHeuristicWeight(heuristic_weight));
        }
        Ok(match self {
            Algorithm::Dijkstra => Box::new(DijkstraSolver),
            Algorithm::AStar => Box::new(AstarSolver::with_weight(heuristic_weight)),
        })
    }
}

/// A cost model for the shared frontier search. The search charges
/// `edge_cost` for entering a cell and orders the frontier on `g + heuristic`.
pub trait GridSolver {
    /// Cost of entering a cell with the given base cost and modifier.
    fn edge_cost(&self, base_cost: f64, cost_modifier: f64) -> f64;

    /// Estimated remaining cost from `from` to `goal`.
    fn heuristic(&self, from: &Point, goal: &Point) -> f64;

    /// Runs a search from `start` to `goal` to completion.
    fn find_path<H>(&self, grid: &Grid<H>, start: Point, goal: Point) -> Result<PathResult>
    where
        Self: Sized,
    {
        Search::new(grid, self, start, goal)?.run(grid)
    }
}

impl<S: GridSolver + ?Sized> GridSolver for &S {
    fn edge_cost(&self, base_cost: f64, cost_modifier: f64) -> f64 {
        (**self).edge_cost(base_cost, cost_modifier)
    }
    fn heuristic(&self, from: &Point, goal: &Point) -> f64 {
        (**self).heuristic(from, goal)
    }
}

impl<S: GridSolver + ?Sized> GridSolver for Box<S> {
    fn edge_cost(&self, base_cost: f64, cost_modifier: f64) -> f64 {
        (**self).edge_cost(base_cost, cost_modifier)
    }
    fn heuristic(&self, from: &Point, goal: &Point) -> f64 {
        (**self).heuristic(from, goal)
    }
}

/// Manhattan distance between two grid points, the only admissible
/// estimate on a 4-connected grid with unit costs.
pub fn manhattan_distance(a: &Point, b: &Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_weights() {
        for w in [-0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Algorithm::AStar.solver(w),
                Err(PathfindingError::InvalidHeuristicWeight(_))
            ));
        }
        assert!(Algorithm::Dijkstra.solver(0.0).is_ok());
    }

    #[test]
    fn boxed_solver_delegates() {
        let solver = Algorithm::AStar.solver(2.0).unwrap();
        assert_eq!(solver.heuristic(&Point::new(0, 0), &Point::new(2, 3)), 10.0);
        assert_eq!(solver.edge_cost(3.0, 2.0), 3.0);
    }

    #[test]
    fn manhattan_is_symmetric() {
        let a = Point::new(-1, 4);
        let b = Point::new(3, 1);
        assert_eq!(manhattan_distance(&a, &b), 7);
        assert_eq!(manhattan_distance(&b, &a), 7);
    }
}
