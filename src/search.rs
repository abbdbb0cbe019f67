//! This module implements the frontier search shared by every [GridSolver]. It is a variant
//! of [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html)
//! that exposes one iteration at a time, so a scheduler can pace the search, and that
//! keeps blocked cells in the frontier until they are popped and discarded.
use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info, trace, warn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{PathfindingError, Result};
use crate::grid::Grid;
use crate::solver::{manhattan_distance, GridSolver};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Per-run scratch state of a cell. Cells the current run has not touched read as
/// [CellCosts::default], i.e. infinitely far away with no predecessor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellCosts {
    /// Cost from the start.
    pub g_cost: f64,
    /// Heuristic estimate to the goal.
    pub h_cost: f64,
    /// `g_cost + h_cost`, the frontier priority.
    pub final_cost: f64,
    /// Predecessor on the best known path.
    pub previous: Option<Point>,
}

impl Default for CellCosts {
    fn default() -> Self {
        CellCosts {
            g_cost: 0.0,
            h_cost: 0.0,
            final_cost: f64::INFINITY,
            previous: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Membership {
    Frontier,
    Visited,
}

#[derive(Clone, Copy, Debug)]
struct Record {
    costs: CellCosts,
    membership: Membership,
}

struct SmallestCostHolder {
    estimated_cost: f64,
    sequence: u64,
    index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest estimated cost first, then earliest insertion
        match other.estimated_cost.total_cmp(&self.estimated_cost) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            s => s,
        }
    }
}

/// An ordered route from the start cell to the goal cell, both inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    steps: Vec<Point>,
    cost: f64,
}

impl Path {
    pub fn steps(&self) -> &[Point] {
        &self.steps
    }
    pub fn into_steps(self) -> Vec<Point> {
        self.steps
    }
    /// Accumulated `g_cost` of the goal.
    pub fn cost(&self) -> f64 {
        self.cost
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
    pub fn start(&self) -> Point {
        self.steps[0]
    }
    /// Where the unit ends up; callers apply this to their unit.
    pub fn destination(&self) -> Point {
        self.steps[self.steps.len() - 1]
    }
    /// True if every consecutive pair of steps is 4-adjacent.
    pub fn is_contiguous(&self) -> bool {
        self.steps
            .iter()
            .tuple_windows()
            .all(|(a, b)| manhattan_distance(a, b) == 1)
    }
}

/// Outcome of a completed search.
#[derive(Clone, Debug, PartialEq)]
pub enum PathResult {
    Found(Path),
    /// The frontier emptied without reaching the goal.
    Unreachable,
}

impl PathResult {
    pub fn is_reachable(&self) -> bool {
        matches!(self, PathResult::Found(_))
    }
    pub fn path(&self) -> Option<&Path> {
        match self {
            PathResult::Found(path) => Some(path),
            PathResult::Unreachable => None,
        }
    }
    pub fn into_path(self) -> Option<Path> {
        match self {
            PathResult::Found(path) => Some(path),
            PathResult::Unreachable => None,
        }
    }
}

/// What a single call to [Search::step] did.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchStep {
    /// The cell was popped and its neighbours relaxed.
    Expanded(Point),
    /// A blocked cell was popped and thrown away.
    Discarded(Point),
    /// The search is over; further calls keep returning the same result.
    Complete(PathResult),
}

/// One pathfinding run. All scratch state lives here rather than on the grid, so a new
/// [Search] always starts from a clean slate and nothing outside it can disturb the
/// frontier between steps.
pub struct Search<S> {
    solver: S,
    start: Point,
    goal: Point,
    to_see: BinaryHeap<SmallestCostHolder>,
    records: FxIndexMap<Point, Record>,
    sequence: u64,
    iterations: usize,
    outcome: Option<PathResult>,
}

impl<S: GridSolver> Search<S> {
    /// Prepares a run from `start` to `goal`. Both must lie on `grid`, whose neighbours
    /// must already be connected.
    pub fn new<H>(grid: &Grid<H>, solver: S, start: Point, goal: Point) -> Result<Search<S>> {
        for p in [start, goal] {
            if !grid.in_bounds(p) {
                return Err(PathfindingError::OutOfBounds(p));
            }
        }
        if !grid.neighbors_connected() {
            return Err(PathfindingError::NeighborsNotConnected);
        }
        debug!(
            "Searching from ({}, {}) to ({}, {})",
            start.x, start.y, goal.x, goal.y
        );
        let mut search = Search {
            solver,
            start,
            goal,
            to_see: BinaryHeap::new(),
            records: FxIndexMap::default(),
            sequence: 0,
            iterations: 0,
            outcome: None,
        };
        let costs = CellCosts {
            final_cost: 0.0,
            ..CellCosts::default()
        };
        let (index, _) = search.records.insert_full(
            start,
            Record {
                costs,
                membership: Membership::Frontier,
            },
        );
        search.push(0.0, index);
        Ok(search)
    }

    pub fn start(&self) -> Point {
        self.start
    }
    pub fn goal(&self) -> Point {
        self.goal
    }
    /// Number of cells popped so far, blocked ones included.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }
    pub fn outcome(&self) -> Option<&PathResult> {
        self.outcome.as_ref()
    }
    /// Cells discovered but not yet expanded.
    pub fn frontier_len(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.membership == Membership::Frontier)
            .count()
    }
    pub fn visited_count(&self) -> usize {
        self.records.len() - self.frontier_len()
    }
    pub fn is_visited(&self, point: &Point) -> bool {
        self.records
            .get(point)
            .is_some_and(|r| r.membership == Membership::Visited)
    }
    pub fn in_frontier(&self, point: &Point) -> bool {
        self.records
            .get(point)
            .is_some_and(|r| r.membership == Membership::Frontier)
    }
    /// Scratch costs of `point` in this run.
    pub fn costs_at(&self, point: &Point) -> CellCosts {
        self.records
            .get(point)
            .map(|r| r.costs)
            .unwrap_or_default()
    }

    fn push(&mut self, estimated_cost: f64, index: usize) {
        self.to_see.push(SmallestCostHolder {
            estimated_cost,
            sequence: self.sequence,
            index,
        });
        self.sequence += 1;
    }

    fn finish(&mut self, result: PathResult) -> SearchStep {
        self.outcome = Some(result.clone());
        SearchStep::Complete(result)
    }

    /// Pops the cheapest frontier cell and handles it: discards it if blocked, finishes if
    /// it is the goal, and relaxes its unvisited neighbours otherwise.
    pub fn step<H>(&mut self, grid: &Grid<H>) -> SearchStep {
        if let Some(outcome) = &self.outcome {
            return SearchStep::Complete(outcome.clone());
        }
        // We may have pushed a cell several times if we found a cheaper way to reach it.
        // Only the entry matching its current cost is live.
        let (index, point, current) = loop {
            let Some(SmallestCostHolder {
                estimated_cost,
                index,
                ..
            }) = self.to_see.pop()
            else {
                info!(
                    "({}, {}) is not reachable from ({}, {})",
                    self.goal.x, self.goal.y, self.start.x, self.start.y
                );
                return self.finish(PathResult::Unreachable);
            };
            let Some((point, record)) = self.records.get_index(index) else {
                warn!("Frontier entry {} has no record", index);
                continue;
            };
            if record.membership == Membership::Visited
                || estimated_cost > record.costs.final_cost
            {
                continue;
            }
            break (index, *point, record.costs);
        };
        self.iterations += 1;
        if let Some((_, record)) = self.records.get_index_mut(index) {
            record.membership = Membership::Visited;
        }

        let Some(cell) = grid.get(point) else {
            warn!("Popped ({}, {}) which is not on the grid", point.x, point.y);
            return SearchStep::Discarded(point);
        };
        if cell.is_blocked() {
            trace!("Discarding blocked ({}, {})", point.x, point.y);
            return SearchStep::Discarded(point);
        }
        if point == self.goal {
            let path = self.backtrace(point, current.g_cost);
            info!(
                "Path found after {} iterations, {} cells, cost {}",
                self.iterations,
                path.len(),
                path.cost()
            );
            return self.finish(PathResult::Found(path));
        }

        for &neighbor in cell.neighbors() {
            let Some(n_cell) = grid.get(neighbor) else {
                continue;
            };
            let g_cost = current.g_cost
                + self
                    .solver
                    .edge_cost(n_cell.base_cost(), n_cell.cost_modifier());
            let h_cost = self.solver.heuristic(&neighbor, &self.goal);
            let costs = CellCosts {
                g_cost,
                h_cost,
                final_cost: g_cost + h_cost,
                previous: Some(point),
            };
            let n = match self.records.entry(neighbor) {
                Vacant(e) => {
                    let n = e.index();
                    e.insert(Record {
                        costs,
                        membership: Membership::Frontier,
                    });
                    n
                }
                Occupied(mut e) => {
                    let record = e.get_mut();
                    if record.membership == Membership::Visited
                        || costs.final_cost >= record.costs.final_cost
                    {
                        continue;
                    }
                    record.costs = costs;
                    e.index()
                }
            };
            self.push(costs.final_cost, n);
        }
        trace!("Expanded ({}, {})", point.x, point.y);
        SearchStep::Expanded(point)
    }

    /// Drives the search until it completes.
    pub fn run<H>(mut self, grid: &Grid<H>) -> Result<PathResult> {
        loop {
            if let SearchStep::Complete(result) = self.step(grid) {
                return Ok(result);
            }
        }
    }

    /// Follows `previous` links from the goal back to the start, inclusive.
    fn backtrace(&self, goal: Point, cost: f64) -> Path {
        let mut steps: Vec<Point> = std::iter::successors(Some(goal), |p| {
            if *p == self.start {
                None
            } else {
                self.records.get(p).and_then(|r| r.costs.previous)
            }
        })
        .collect();
        steps.reverse();
        Path { steps, cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellType;
    use crate::solver::{AstarSolver, DijkstraSolver};

    fn open_grid(columns: i32, rows: i32) -> Grid {
        let mut grid = Grid::new(columns, rows).unwrap();
        grid.connect_neighbors();
        grid
    }

    #[test]
    fn frontier_orders_by_cost_then_insertion() {
        let mut heap = BinaryHeap::new();
        for (sequence, (cost, index)) in [(2.0, 0), (1.0, 1), (1.0, 2), (3.0, 3)].iter().enumerate() {
            heap.push(SmallestCostHolder {
                estimated_cost: *cost,
                sequence: sequence as u64,
                index: *index,
            });
        }
        let order = std::iter::from_fn(|| heap.pop().map(|h| h.index)).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 2, 0, 3]);
    }

    #[test]
    fn fresh_search_reads_as_reset() {
        let grid = open_grid(3, 3);
        let search = Search::new(&grid, DijkstraSolver, Point::new(0, 0), Point::new(2, 2)).unwrap();
        let untouched = search.costs_at(&Point::new(1, 1));
        assert_eq!(untouched.final_cost, f64::INFINITY);
        assert_eq!(untouched.previous, None);
        assert_eq!(search.costs_at(&Point::new(0, 0)).final_cost, 0.0);
        assert_eq!(search.frontier_len(), 1);
    }

    #[test]
    fn rejects_out_of_bounds_and_unwired_grids() {
        let grid = open_grid(2, 2);
        let outside = Point::new(2, 0);
        assert_eq!(
            Search::new(&grid, DijkstraSolver, Point::new(0, 0), outside).err(),
            Some(PathfindingError::OutOfBounds(outside))
        );
        let unwired = Grid::new(2, 2).unwrap();
        assert_eq!(
            Search::new(&unwired, DijkstraSolver, Point::new(0, 0), Point::new(1, 1)).err(),
            Some(PathfindingError::NeighborsNotConnected)
        );
    }

    #[test]
    fn first_step_expands_start_and_relaxes_neighbours() {
        let grid = open_grid(3, 3);
        let mut search =
            Search::new(&grid, DijkstraSolver, Point::new(1, 1), Point::new(2, 2)).unwrap();
        assert_eq!(search.step(&grid), SearchStep::Expanded(Point::new(1, 1)));
        assert_eq!(search.frontier_len(), 4);
        assert!(search.is_visited(&Point::new(1, 1)));
        let north = search.costs_at(&Point::new(1, 2));
        assert_eq!(north.final_cost, 1.0);
        assert_eq!(north.previous, Some(Point::new(1, 1)));
        // Ties resolve in neighbour order: north was inserted first
        assert_eq!(search.step(&grid), SearchStep::Expanded(Point::new(1, 2)));
    }

    #[test]
    fn blocked_cells_are_queued_then_discarded() {
        let mut grid = open_grid(2, 1);
        grid.set_cell_type(Point::new(1, 0), CellType::Blocked).unwrap();
        let mut search =
            Search::new(&grid, DijkstraSolver, Point::new(0, 0), Point::new(1, 0)).unwrap();
        assert_eq!(search.step(&grid), SearchStep::Expanded(Point::new(0, 0)));
        assert!(search.in_frontier(&Point::new(1, 0)));
        assert_eq!(search.step(&grid), SearchStep::Discarded(Point::new(1, 0)));
        assert_eq!(search.step(&grid), SearchStep::Complete(PathResult::Unreachable));
        assert_eq!(search.step(&grid), SearchStep::Complete(PathResult::Unreachable));
    }

    #[test]
    fn expensive_cell_is_avoided() {
        // Entering (1, 0) costs 10, going round through the top row costs 4.
        let mut grid = open_grid(3, 2);
        grid.set_base_cost(Point::new(1, 0), 10.0).unwrap();
        let goal = Point::new(2, 0);
        let result = DijkstraSolver
            .find_path(&grid, Point::new(0, 0), goal)
            .unwrap();
        let path = result.path().unwrap();
        assert_eq!(path.cost(), 4.0);
        assert_eq!(
            path.steps(),
            &[
                Point::new(0, 0),
                Point::new(0, 1),
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(2, 0)
            ]
        );
    }

    #[test]
    fn astar_records_split_costs() {
        let grid = open_grid(4, 1);
        let mut search = Search::new(
            &grid,
            AstarSolver::with_weight(2.0),
            Point::new(0, 0),
            Point::new(3, 0),
        )
        .unwrap();
        search.step(&grid);
        let east = search.costs_at(&Point::new(1, 0));
        assert_eq!(east.g_cost, 1.0);
        assert_eq!(east.h_cost, 4.0);
        assert_eq!(east.final_cost, 5.0);
    }

    #[test]
    fn live_block_is_seen_by_running_search() {
        let mut grid = open_grid(3, 1);
        let mut search =
            Search::new(&grid, DijkstraSolver, Point::new(0, 0), Point::new(2, 0)).unwrap();
        search.step(&grid);
        grid.set_cell_type(Point::new(1, 0), CellType::Blocked).unwrap();
        assert_eq!(search.step(&grid), SearchStep::Discarded(Point::new(1, 0)));
        assert_eq!(search.step(&grid), SearchStep::Complete(PathResult::Unreachable));
    }
}
