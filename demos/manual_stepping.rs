use grid_util::point::Point;
use std::time::{Duration, Instant};
use tactics_pathfinding::{
    Algorithm, EngineEvent, Grid, MovementEngine, SearchSettings, StepMode, TurnOrder,
};

// Two units take turns on an 8x8 map. The search is paced manually: a separate thread plays the
// part of the player pressing the step key, and the main loop plays the part of the game loop,
// animating each finished path before handing the turn on.

#[derive(Clone, Debug)]
struct Unit {
    name: &'static str,
    position: Point,
}

fn main() {
    env_logger::init();
    let settings = SearchSettings {
        algorithm: Algorithm::AStar,
        heuristic_weight: 1.0,
        step_mode: StepMode::Manual,
    };
    let mut engine: MovementEngine<(), usize> =
        MovementEngine::new(Grid::new(8, 8).unwrap(), settings).unwrap();
    for y in 1..7 {
        engine.toggle_cell_type(Point::new(4, y)).unwrap();
    }
    println!("{}", engine.grid());

    let mut turns = TurnOrder::new(vec![
        Unit {
            name: "knight",
            position: Point::new(0, 0),
        },
        Unit {
            name: "archer",
            position: Point::new(7, 7),
        },
    ])
    .unwrap();
    let goals = [Point::new(7, 3), Point::new(1, 4)];

    let signal = engine.step_signal();
    let presser = std::thread::spawn(move || {
        for _ in 0..200 {
            std::thread::sleep(Duration::from_millis(2));
            signal.signal();
        }
    });

    for goal in goals {
        let unit = turns.current().clone();
        engine
            .request_path(turns.current_index(), unit.position, goal)
            .unwrap();
        let event = loop {
            if let Some(event) = engine.advance(Instant::now()) {
                break event;
            }
            std::thread::sleep(Duration::from_millis(1));
        };
        match event {
            EngineEvent::PathReady { path, .. } => {
                for p in path.steps() {
                    println!("{} steps onto {:?}", unit.name, p);
                }
                let done = engine.on_path_consumed().unwrap();
                turns.current_mut().position = done.destination;
            }
            other => println!("{} cannot move: {:?}", unit.name, other),
        }
        turns.select_next();
    }
    presser.join().unwrap();
    for unit in turns.units() {
        println!("{} ends at {:?}", unit.name, unit.position);
    }
}
