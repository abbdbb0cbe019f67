//! # tactics_pathfinding
//!
//! Least-cost movement on the 4-connected grids of turn-based tactics games. Cells carry a
//! base cost, a cost modifier and a blocked flag; paths are found with
//! [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm) or
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) with a (optionally inflated)
//! Manhattan heuristic.
//!
//! A search can run to completion in one call ([Pathfinder::find_path]) or be paced one
//! iteration at a time by a [SteppingController], which is how a visualizer shows the
//! frontier growing. [MovementEngine] wraps both behind a single-flight request API for
//! the input and animation layers of a game.
//!
//! ```
//! use grid_util::point::Point;
//! use tactics_pathfinding::{Algorithm, CellType, Grid, Pathfinder};
//!
//! let mut grid = Grid::new(3, 3).unwrap();
//! grid.set_cell_type(Point::new(1, 1), CellType::Blocked).unwrap();
//! grid.connect_neighbors();
//! let result = Pathfinder::find_path(&grid, Point::new(0, 0), Point::new(2, 2), Algorithm::AStar, 1.0)
//!     .unwrap();
//! assert_eq!(result.path().unwrap().cost(), 4.0);
//! ```
pub mod cell;
pub mod engine;
pub mod error;
pub mod grid;
pub mod search;
pub mod solver;
pub mod stepping;
pub mod turn;

use grid_util::point::Point;

pub use crate::cell::{Cell, CellType};
pub use crate::engine::{CompletedMove, EngineEvent, MovementEngine};
pub use crate::error::{PathfindingError, Result};
pub use crate::grid::Grid;
pub use crate::search::{CellCosts, Path, PathResult, Search, SearchStep};
pub use crate::solver::{Algorithm, AstarSolver, DijkstraSolver, GridSolver};
pub use crate::stepping::{CancelToken, SearchProgress, StepMode, StepSignal, SteppingController};
pub use crate::turn::TurnOrder;

/// Heuristic weight that keeps A* admissible.
pub const DEFAULT_HEURISTIC_WEIGHT: f64 = 1.0;

/// How searches are run: which cost model, how strongly A* trusts its heuristic, and how
/// iterations are paced.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchSettings {
    pub algorithm: Algorithm,
    /// Multiplies the Manhattan estimate; values above 1 trade optimality for speed.
    pub heuristic_weight: f64,
    pub step_mode: StepMode,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            algorithm: Algorithm::Dijkstra,
            heuristic_weight: DEFAULT_HEURISTIC_WEIGHT,
            step_mode: StepMode::Immediate,
        }
    }
}

/// Entry point for one-shot searches.
pub struct Pathfinder;

impl Pathfinder {
    /// Computes the least-cost path from `start` to `goal`. An unreachable goal is a
    /// normal [PathResult::Unreachable]; errors are reserved for bad input.
    pub fn find_path<H>(
        grid: &Grid<H>,
        start: Point,
        goal: Point,
        algorithm: Algorithm,
        heuristic_weight: f64,
    ) -> Result<PathResult> {
        algorithm
            .solver(heuristic_weight)?
            .find_path(grid, start, goal)
    }

    /// [find_path](Self::find_path) with the algorithm and weight taken from `settings`.
    /// The step mode is ignored; use a [SteppingController] to pace a search.
    pub fn find_path_with<H>(
        grid: &Grid<H>,
        start: Point,
        goal: Point,
        settings: &SearchSettings,
    ) -> Result<PathResult> {
        Pathfinder::find_path(
            grid,
            start,
            goal,
            settings.algorithm,
            settings.heuristic_weight,
        )
    }
}
