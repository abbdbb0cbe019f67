use grid_util::point::Point;
use tactics_pathfinding::{Algorithm, CellType, Grid, Pathfinder};

// In this example a path is found on a 3x3 grid with shape
//  ___
// |  E|
// | # |
// |S  |
//  ___
// where
// - # marks an obstacle
// - S marks the start
// - E marks the end
//
// Nodes have a 4-neighborhood

fn main() {
    env_logger::init();
    let mut grid = Grid::new(3, 3).unwrap();
    grid.set_cell_type(Point::new(1, 1), CellType::Blocked)
        .unwrap();
    grid.connect_neighbors();
    println!("{}", grid);
    let start = Point::new(0, 0);
    let end = Point::new(2, 2);
    let path = Pathfinder::find_path(&grid, start, end, Algorithm::Dijkstra, 1.0)
        .unwrap()
        .into_path()
        .unwrap();
    println!("Path (cost {}):", path.cost());
    for p in path.steps() {
        println!("{:?}", p);
    }
}
