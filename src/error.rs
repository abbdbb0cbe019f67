//! Error types for grid construction and path requests.

use grid_util::point::Point;
use thiserror::Error;

/// Result type alias using [`PathfindingError`].
pub type Result<T> = std::result::Result<T, PathfindingError>;

/// Failures surfaced by the grid, the search and the movement engine.
///
/// An unreachable destination is not an error: it is reported as
/// [`PathResult::Unreachable`](crate::PathResult::Unreachable).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathfindingError {
    /// Grid built with a non-positive number of columns or rows.
    #[error("Invalid grid dimensions: {columns} columns x {rows} rows")]
    InvalidDimensions {
        /// Requested column count.
        columns: i32,
        /// Requested row count.
        rows: i32,
    },

    /// Coordinate outside the grid extents.
    #[error("Coordinate ({}, {}) is out of bounds", .0.x, .0.y)]
    OutOfBounds(Point),

    /// A path request arrived while another one is in flight.
    #[error("A pathfinding run is already in progress")]
    AlreadyRunning,

    /// The animator reported a consumed path but none was handed out.
    #[error("No path is waiting to be consumed")]
    NoPathInFlight,

    /// Search attempted before the grid adjacency was wired.
    #[error("Grid neighbors have not been connected")]
    NeighborsNotConnected,

    /// Negative or non-finite movement cost.
    #[error("Invalid cost {cost} for cell ({}, {})", .point.x, .point.y)]
    InvalidCost {
        /// Cell the cost was meant for.
        point: Point,
        /// Rejected value.
        cost: f64,
    },

    /// Negative or non-finite heuristic weight.
    #[error("Invalid heuristic weight: {0}")]
    InvalidHeuristicWeight(f64),
}
