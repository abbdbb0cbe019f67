use grid_util::point::Point;
use smallvec::SmallVec;

use crate::error::{PathfindingError, Result};

/// Fixed neighbor order used when wiring the grid: north, west, east, south.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(0, 1), (-1, 0), (1, 0), (0, -1)];

/// Whether a unit may stand on a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellType {
    #[default]
    Traversable,
    Blocked,
}

impl CellType {
    pub fn is_blocked(self) -> bool {
        matches!(self, CellType::Blocked)
    }

    /// The other type; used by the map-editing tool.
    pub fn toggled(self) -> CellType {
        match self {
            CellType::Traversable => CellType::Blocked,
            CellType::Blocked => CellType::Traversable,
        }
    }
}

/// A single addressable location of a [Grid](crate::Grid).
///
/// The handle `H` is whatever the caller's cell factory produced (a scene node, an
/// entity id, or `()` for a purely logical grid). The grid stores it untouched.
#[derive(Clone, Debug)]
pub struct Cell<H = ()> {
    pub(crate) coordinates: Point,
    pub(crate) cell_type: CellType,
    pub(crate) base_cost: f64,
    pub(crate) cost_modifier: f64,
    pub(crate) neighbors: SmallVec<[Point; 4]>,
    pub handle: H,
}

impl<H: Default> Default for Cell<H> {
    fn default() -> Self {
        Cell::new(H::default())
    }
}

impl<H> Cell<H> {
    /// A traversable cell with base cost 1 and no modifier.
    pub fn new(handle: H) -> Cell<H> {
        Cell {
            coordinates: Point::new(0, 0),
            cell_type: CellType::Traversable,
            base_cost: 1.0,
            cost_modifier: 1.0,
            neighbors: SmallVec::new(),
            handle,
        }
    }
    pub fn with_type(mut self, cell_type: CellType) -> Self {
        self.cell_type = cell_type;
        self
    }
    pub fn with_base_cost(mut self, base_cost: f64) -> Self {
        self.base_cost = base_cost;
        self
    }
    pub fn with_cost_modifier(mut self, cost_modifier: f64) -> Self {
        self.cost_modifier = cost_modifier;
        self
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }
    pub fn coordinates(&self) -> Point {
        self.coordinates
    }
    pub fn base_cost(&self) -> f64 {
        self.base_cost
    }
    pub fn cost_modifier(&self) -> f64 {
        self.cost_modifier
    }
    /// Adjacent cells in north, west, east, south order. Empty until
    /// [connect_neighbors](crate::Grid::connect_neighbors) has run.
    pub fn neighbors(&self) -> &[Point] {
        &self.neighbors
    }
    pub fn is_blocked(&self) -> bool {
        self.cell_type.is_blocked()
    }

    pub fn set_base_cost(&mut self, base_cost: f64) -> Result<()> {
        self.base_cost = validate_cost(self.coordinates, base_cost)?;
        Ok(())
    }
    pub fn set_cost_modifier(&mut self, cost_modifier: f64) -> Result<()> {
        self.cost_modifier = validate_cost(self.coordinates, cost_modifier)?;
        Ok(())
    }

    /// Checks both cost fields; run on every factory-produced cell.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_cost(self.coordinates, self.base_cost)?;
        validate_cost(self.coordinates, self.cost_modifier)?;
        Ok(())
    }
}

fn validate_cost(point: Point, cost: f64) -> Result<f64> {
    if cost.is_finite() && cost >= 0.0 {
        Ok(cost)
    } else {
        Err(PathfindingError::InvalidCost { point, cost })
    }
}
