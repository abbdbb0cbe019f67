use grid_util::point::Point;
use tactics_pathfinding::{Algorithm, CellType, Grid, Search};

// The heuristic weight scales the Manhattan estimate, causing cells that are closer to the goal
// (ignoring obstacles) to be expanded sooner than in normal operation. This is called Weighted A*
// and it can cut the number of expanded cells considerably, at the price of optimality.

fn main() {
    env_logger::init();
    const N: i32 = 30;
    let mut grid = Grid::new(N, N).unwrap();
    for i in 4..N - 4 {
        grid.set_cell_type(Point::new(i, N / 2), CellType::Blocked)
            .unwrap();
        grid.set_cell_type(Point::new(N / 3, i), CellType::Blocked)
            .unwrap();
    }
    grid.connect_neighbors();
    println!("{}", grid);
    let start = Point::new(1, 1);
    let end = Point::new(N - 3, N - 3);
    for (algorithm, weight) in [
        (Algorithm::Dijkstra, 1.0),
        (Algorithm::AStar, 1.0),
        (Algorithm::AStar, 11.0),
    ] {
        let solver = algorithm.solver(weight).unwrap();
        let mut search = Search::new(&grid, solver, start, end).unwrap();
        while !search.is_complete() {
            search.step(&grid);
        }
        let cost = search
            .outcome()
            .and_then(|r| r.path())
            .map(|p| p.cost())
            .unwrap_or(f64::INFINITY);
        println!(
            "{:?} (weight {}): {} iterations, path cost {}",
            algorithm,
            weight,
            search.iterations(),
            cost
        );
    }
}
