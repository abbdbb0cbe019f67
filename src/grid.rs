use core::fmt;
use grid_util::point::Point;
use log::{debug, info};
use petgraph::unionfind::UnionFind;

use crate::cell::{Cell, CellType, NEIGHBOR_OFFSETS};
use crate::error::{PathfindingError, Result};
use crate::solver::GridSolver;

/// [Grid] owns a rectangular block of [Cell]s, `columns` wide and `rows` tall, stored row by
/// row. It maintains information about connected components using a [UnionFind] structure so
/// callers can cheaply tell whether a destination is worth searching for.
#[derive(Clone, Debug)]
pub struct Grid<H = ()> {
    columns: i32,
    rows: i32,
    cells: Vec<Cell<H>>,
    neighbors_connected: bool,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl Grid<()> {
    /// A uniform grid: every cell traversable with base cost 1.
    pub fn new(columns: i32, rows: i32) -> Result<Grid<()>> {
        Grid::build(columns, rows, |_| Cell::new(()))
    }
}

impl<H> Grid<H> {
    /// Allocates `columns * rows` cells through `factory`, which receives the coordinates of
    /// the cell it is creating. Cells are created row by row and keep the coordinates they
    /// were created for.
    pub fn build<F>(columns: i32, rows: i32, mut factory: F) -> Result<Grid<H>>
    where
        F: FnMut(Point) -> Cell<H>,
    {
        if columns <= 0 || rows <= 0 {
            return Err(PathfindingError::InvalidDimensions { columns, rows });
        }
        let mut cells = Vec::with_capacity(columns as usize * rows as usize);
        for y in 0..rows {
            for x in 0..columns {
                let point = Point::new(x, y);
                let mut cell = factory(point);
                cell.coordinates = point;
                cell.neighbors.clear();
                cell.validate()?;
                cells.push(cell);
            }
        }
        info!("Built {}x{} grid", columns, rows);
        Ok(Grid {
            columns,
            rows,
            cells,
            neighbors_connected: false,
            components: UnionFind::new(columns as usize * rows as usize),
            components_dirty: true,
        })
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }
    pub fn rows(&self) -> i32 {
        self.rows
    }
    pub fn neighbors_connected(&self) -> bool {
        self.neighbors_connected
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.y >= 0 && point.x < self.columns && point.y < self.rows
    }
    /// Row-major index of an in-bounds point.
    pub(crate) fn get_ix_point(&self, point: &Point) -> usize {
        point.y as usize * self.columns as usize + point.x as usize
    }
    pub(crate) fn get(&self, point: Point) -> Option<&Cell<H>> {
        if self.in_bounds(point) {
            self.cells.get(self.get_ix_point(&point))
        } else {
            None
        }
    }

    /// Bounds-checked lookup.
    pub fn cell_at(&self, point: Point) -> Result<&Cell<H>> {
        self.get(point).ok_or(PathfindingError::OutOfBounds(point))
    }
    /// Bounds-checked mutable lookup. Coordinates, neighbors and the cell type stay
    /// read-only; the type is edited through [set_cell_type](Self::set_cell_type) so the
    /// components stay in sync.
    pub fn cell_at_mut(&mut self, point: Point) -> Result<&mut Cell<H>> {
        if !self.in_bounds(point) {
            return Err(PathfindingError::OutOfBounds(point));
        }
        let ix = self.get_ix_point(&point);
        Ok(&mut self.cells[ix])
    }
    /// All cells in row order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell<H>> {
        self.cells.iter()
    }

    /// Wires every cell to its in-bounds north, west, east and south neighbours. Existing
    /// wiring is cleared first, so calling this again yields the same adjacency.
    pub fn connect_neighbors(&mut self) {
        let (columns, rows) = (self.columns, self.rows);
        for cell in self.cells.iter_mut() {
            let p = cell.coordinates;
            cell.neighbors.clear();
            cell.neighbors.extend(
                NEIGHBOR_OFFSETS
                    .iter()
                    .map(|(dx, dy)| Point::new(p.x + dx, p.y + dy))
                    .filter(|n| n.x >= 0 && n.y >= 0 && n.x < columns && n.y < rows),
            );
        }
        self.neighbors_connected = true;
        self.generate_components();
    }

    /// Neighbours of an in-bounds point; empty for anything else.
    pub fn neighbors(&self, point: Point) -> &[Point] {
        self.get(point).map(|c| c.neighbors()).unwrap_or(&[])
    }

    /// Updates the traversability of a cell. Joins newly connected components and flags the
    /// components as dirty if they are (potentially) broken apart into multiple.
    pub fn set_cell_type(&mut self, point: Point, cell_type: CellType) -> Result<()> {
        let previous = self.cell_at(point)?.cell_type();
        if previous == cell_type {
            return Ok(());
        }
        debug!("Cell ({}, {}) -> {:?}", point.x, point.y, cell_type);
        let ix = self.get_ix_point(&point);
        self.cells[ix].cell_type = cell_type;
        if cell_type.is_blocked() {
            self.components_dirty = true;
        } else if !self.components_dirty {
            let open = self
                .neighbors(point)
                .iter()
                .filter(|n| self.get(**n).is_some_and(|c| !c.is_blocked()))
                .map(|n| self.get_ix_point(n))
                .collect::<Vec<usize>>();
            for n_ix in open {
                self.components.union(ix, n_ix);
            }
        }
        Ok(())
    }

    /// Flips a cell between traversable and blocked and returns its new type.
    pub fn toggle_cell_type(&mut self, point: Point) -> Result<CellType> {
        let toggled = self.cell_at(point)?.cell_type().toggled();
        self.set_cell_type(point, toggled)?;
        Ok(toggled)
    }

    pub fn set_cost_modifier(&mut self, point: Point, cost_modifier: f64) -> Result<()> {
        self.cell_at_mut(point)?.set_cost_modifier(cost_modifier)
    }
    pub fn set_base_cost(&mut self, point: Point, base_cost: f64) -> Result<()> {
        self.cell_at_mut(point)?.set_base_cost(base_cost)
    }

    /// Total cost of walking `path` as charged by `solver`; the first cell is free.
    pub fn path_cost<S: GridSolver + ?Sized>(&self, path: &[Point], solver: &S) -> Result<f64> {
        path.iter().skip(1).try_fold(0.0, |acc, p| -> Result<f64> {
            let cell = self.cell_at(*p)?;
            Ok(acc + solver.edge_cost(cell.base_cost, cell.cost_modifier))
        })
    }

    /// Retrieves the component id a given [Point] belongs to.
    pub fn get_component(&self, point: &Point) -> Result<usize> {
        if !self.in_bounds(*point) {
            return Err(PathfindingError::OutOfBounds(*point));
        }
        Ok(self.components.find(self.get_ix_point(point)))
    }
    /// Checks if start and goal are open cells on the same connected component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }
    /// Checks if start and goal are not on the same component. Out-of-bounds and blocked
    /// endpoints are always unreachable.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        match (self.get(*start), self.get(*goal)) {
            (Some(s), Some(g)) if !s.is_blocked() && !g.is_blocked() => !self
                .components
                .equiv(self.get_ix_point(start), self.get_ix_point(goal)),
            _ => true,
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up open neighbours to the same
    /// components. Only the east and north neighbour need checking per cell.
    pub fn generate_components(&mut self) {
        self.components = UnionFind::new(self.cells.len());
        self.components_dirty = false;
        for y in 0..self.rows {
            for x in 0..self.columns {
                let point = Point::new(x, y);
                let parent_ix = self.get_ix_point(&point);
                if self.cells[parent_ix].is_blocked() {
                    continue;
                }
                [Point::new(x, y + 1), Point::new(x + 1, y)]
                    .into_iter()
                    .filter(|p| self.get(*p).is_some_and(|c| !c.is_blocked()))
                    .map(|p| self.get_ix_point(&p))
                    .collect::<Vec<usize>>()
                    .into_iter()
                    .for_each(|ix| {
                        self.components.union(parent_ix, ix);
                    });
            }
        }
    }
}

impl<H> fmt::Display for Grid<H> {
    /// Top row first, `#` for blocked cells.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in (0..self.rows).rev() {
            let row = (0..self.columns)
                .map(|x| match self.get(Point::new(x, y)) {
                    Some(c) if c.is_blocked() => '#',
                    _ => '.',
                })
                .collect::<String>();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_dimensions() {
        for (c, r) in [(0, 3), (3, 0), (-1, 2)] {
            assert_eq!(
                Grid::new(c, r).unwrap_err(),
                PathfindingError::InvalidDimensions { columns: c, rows: r }
            );
        }
    }

    #[test]
    fn factory_sees_every_coordinate_once() {
        let mut seen = Vec::new();
        let grid = Grid::build(3, 2, |p| {
            seen.push((p.x, p.y));
            Cell::new(p.x * 10 + p.y)
        })
        .unwrap();
        assert_eq!(seen, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        let cell = grid.cell_at(Point::new(2, 1)).unwrap();
        assert_eq!(cell.handle, 21);
        assert_eq!(cell.coordinates(), Point::new(2, 1));
    }

    #[test]
    fn factory_cost_is_validated() {
        let result = Grid::build(2, 2, |p| {
            Cell::new(()).with_base_cost(if p.x == 1 { -2.0 } else { 1.0 })
        });
        assert!(matches!(result, Err(PathfindingError::InvalidCost { .. })));
    }

    #[test]
    fn cell_lookup_is_bounds_checked() {
        let grid = Grid::new(2, 3).unwrap();
        assert!(grid.cell_at(Point::new(1, 2)).is_ok());
        for p in [Point::new(2, 0), Point::new(0, 3), Point::new(-1, 0)] {
            assert_eq!(grid.cell_at(p).unwrap_err(), PathfindingError::OutOfBounds(p));
        }
    }

    #[test]
    fn neighbors_follow_north_west_east_south() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.connect_neighbors();
        assert_eq!(
            grid.neighbors(Point::new(1, 1)),
            &[
                Point::new(1, 2),
                Point::new(0, 1),
                Point::new(2, 1),
                Point::new(1, 0)
            ]
        );
        assert_eq!(
            grid.neighbors(Point::new(0, 0)),
            &[Point::new(0, 1), Point::new(1, 0)]
        );
    }

    #[test]
    fn connecting_twice_does_not_duplicate() {
        let mut grid = Grid::new(4, 2).unwrap();
        grid.connect_neighbors();
        let first = grid.cells().map(|c| c.neighbors().to_vec()).collect::<Vec<_>>();
        grid.connect_neighbors();
        let second = grid.cells().map(|c| c.neighbors().to_vec()).collect::<Vec<_>>();
        assert_eq!(first, second);
        assert!(grid.cells().all(|c| c.neighbors().len() <= 4));
    }

    #[test]
    fn editing_type_keeps_wiring() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.connect_neighbors();
        let center = Point::new(1, 1);
        assert_eq!(grid.toggle_cell_type(center).unwrap(), CellType::Blocked);
        assert_eq!(grid.neighbors(center).len(), 4);
        assert_eq!(grid.neighbors(Point::new(1, 0)).len(), 3);
        assert_eq!(grid.toggle_cell_type(center).unwrap(), CellType::Traversable);
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // |.#.|
        // |.#.|
        let mut grid = Grid::new(3, 2).unwrap();
        grid.set_cell_type(Point::new(1, 0), CellType::Blocked).unwrap();
        grid.set_cell_type(Point::new(1, 1), CellType::Blocked).unwrap();
        grid.connect_neighbors();
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(0, 1)));
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(2, 0)));
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(1, 1)));
    }

    #[test]
    fn components_follow_live_edits() {
        let mut grid = Grid::new(3, 1).unwrap();
        grid.connect_neighbors();
        let (a, b) = (Point::new(0, 0), Point::new(2, 0));
        grid.set_cell_type(Point::new(1, 0), CellType::Blocked).unwrap();
        assert!(grid.components_dirty);
        grid.update();
        assert!(grid.unreachable(&a, &b));
        // Reopening joins components eagerly
        grid.set_cell_type(Point::new(1, 0), CellType::Traversable).unwrap();
        assert!(!grid.components_dirty);
        assert!(grid.reachable(&a, &b));
    }

    #[test]
    fn component_lookup_is_bounds_checked() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.connect_neighbors();
        assert_eq!(
            grid.get_component(&Point::new(0, 0)).unwrap(),
            grid.get_component(&Point::new(2, 2)).unwrap()
        );
        for p in [Point::new(5, 5), Point::new(-1, 0), Point::new(0, 3)] {
            assert_eq!(grid.get_component(&p), Err(PathfindingError::OutOfBounds(p)));
        }
    }

    /// Every way of editing a cell keeps `reachable` in agreement with the search.
    #[test]
    fn components_agree_with_search_after_edits() {
        use crate::solver::DijkstraSolver;
        use crate::GridSolver;

        let mut grid = Grid::new(3, 1).unwrap();
        grid.connect_neighbors();
        let (a, b) = (Point::new(0, 0), Point::new(2, 0));
        let middle = Point::new(1, 0);
        let check = |grid: &Grid| {
            let found = DijkstraSolver.find_path(grid, a, b).unwrap().is_reachable();
            assert_eq!(grid.reachable(&a, &b), found);
        };
        grid.cell_at_mut(middle).unwrap().set_cost_modifier(4.0).unwrap();
        grid.update();
        check(&grid);
        grid.toggle_cell_type(middle).unwrap();
        grid.update();
        assert_eq!(grid.cell_at(middle).unwrap().cell_type(), CellType::Blocked);
        check(&grid);
        grid.set_cell_type(middle, CellType::Traversable).unwrap();
        grid.update();
        check(&grid);
    }

    #[test]
    fn index_beyond_i32_range() {
        // Only the arithmetic is under test, so the cells are not allocated
        let grid: Grid = Grid {
            columns: 50_000,
            rows: 50_000,
            cells: Vec::new(),
            neighbors_connected: false,
            components: UnionFind::new(0),
            components_dirty: true,
        };
        assert_eq!(grid.get_ix_point(&Point::new(49_999, 49_999)), 2_499_999_999);
        assert!(grid.cell_at(Point::new(49_999, 49_999)).is_err());
    }

    #[test]
    fn display_marks_blocked_cells() {
        let mut grid = Grid::new(3, 2).unwrap();
        grid.set_cell_type(Point::new(0, 1), CellType::Blocked).unwrap();
        assert_eq!(grid.to_string(), "#..\n...\n");
    }
}
