use grid_util::point::Point;
use log::{debug, info, warn};
use std::fmt::Debug;
use std::time::Instant;

use crate::cell::CellType;
use crate::error::{PathfindingError, Result};
use crate::grid::Grid;
use crate::search::{Path, PathResult, Search};
use crate::solver::BoxedSolver;
use crate::stepping::{SearchProgress, StepSignal, SteppingController};
use crate::SearchSettings;

/// Something the input, animation or turn layer has to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent<U> {
    /// A path is ready; the animator walks `unit` along it and then calls
    /// [MovementEngine::on_path_consumed].
    PathReady { unit: U, path: Path },
    /// No route exists. The engine is idle again.
    Unreachable { unit: U, goal: Point },
    /// Returned by [MovementEngine::cancel]. The engine is idle again.
    Cancelled { unit: U },
}

/// A move the animator has finished. The caller applies `destination` to the unit and
/// hands the turn on.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedMove<U> {
    pub unit: U,
    pub destination: Point,
}

enum Phase<U> {
    Idle,
    Searching {
        unit: U,
        goal: Point,
        controller: SteppingController<BoxedSolver>,
    },
    Animating {
        unit: U,
        path: Path,
    },
}

/// Owns a [Grid] and serves one unit's path request at a time. A request is in flight
/// from [request_path](Self::request_path) until the search fails, is cancelled, or its
/// path has been consumed by the animator.
pub struct MovementEngine<H, U> {
    grid: Grid<H>,
    settings: SearchSettings,
    step_signal: StepSignal,
    phase: Phase<U>,
}

impl<H, U: Clone + Debug> MovementEngine<H, U> {
    /// Wraps `grid`, wiring its neighbours if that has not happened yet.
    pub fn new(mut grid: Grid<H>, settings: SearchSettings) -> Result<Self> {
        settings.algorithm.solver(settings.heuristic_weight)?;
        if !grid.neighbors_connected() {
            grid.connect_neighbors();
        }
        Ok(MovementEngine {
            grid,
            settings,
            step_signal: StepSignal::new(),
            phase: Phase::Idle,
        })
    }

    pub fn grid(&self) -> &Grid<H> {
        &self.grid
    }
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }
    /// Takes effect from the next request on.
    pub fn set_settings(&mut self, settings: SearchSettings) -> Result<()> {
        settings.algorithm.solver(settings.heuristic_weight)?;
        self.settings = settings;
        Ok(())
    }

    /// The button that advances a manually stepped search.
    pub fn step_signal(&self) -> StepSignal {
        self.step_signal.clone()
    }

    /// True while a search runs or its path is being animated.
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// The search in progress, for drawing its frontier and costs.
    pub fn active_search(&self) -> Option<&Search<BoxedSolver>> {
        match &self.phase {
            Phase::Searching { controller, .. } => Some(controller.search()),
            _ => None,
        }
    }

    /// Starts a search for `unit` standing on `from`. Rejected while another request
    /// is in flight.
    pub fn request_path(&mut self, unit: U, from: Point, goal: Point) -> Result<()> {
        if self.is_running() {
            warn!("Rejected path request for {:?}: already running", unit);
            return Err(PathfindingError::AlreadyRunning);
        }
        let solver = self
            .settings
            .algorithm
            .solver(self.settings.heuristic_weight)?;
        let search = Search::new(&self.grid, solver, from, goal)?;
        // Presses made while idle or animating belong to no search
        let stale = self.step_signal.take();
        if stale > 0 {
            debug!("Dropping {} step presses made between searches", stale);
        }
        let schedule = self.settings.step_mode.schedule(&self.step_signal);
        info!(
            "{:?} requests path from ({}, {}) to ({}, {}) using {:?}",
            unit, from.x, from.y, goal.x, goal.y, self.settings.algorithm
        );
        self.phase = Phase::Searching {
            unit,
            goal,
            controller: SteppingController::new(search, schedule),
        };
        Ok(())
    }

    /// Lets the running search make whatever progress its schedule allows.
    pub fn advance(&mut self, now: Instant) -> Option<EngineEvent<U>> {
        let Phase::Searching { controller, .. } = &mut self.phase else {
            return None;
        };
        let progress = controller.advance(&self.grid, now);
        if progress == SearchProgress::Pending {
            return None;
        }
        let Phase::Searching { unit, goal, .. } = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return None;
        };
        match progress {
            SearchProgress::Complete(PathResult::Found(path)) => {
                self.phase = Phase::Animating {
                    unit: unit.clone(),
                    path: path.clone(),
                };
                Some(EngineEvent::PathReady { unit, path })
            }
            SearchProgress::Complete(PathResult::Unreachable) => {
                Some(EngineEvent::Unreachable { unit, goal })
            }
            SearchProgress::Cancelled | SearchProgress::Pending => {
                Some(EngineEvent::Cancelled { unit })
            }
        }
    }

    /// Aborts the running search. The engine is idle again as soon as this returns, so a
    /// new request may follow right away. Returns the [EngineEvent::Cancelled] event, or
    /// `None` if no search was running.
    pub fn cancel(&mut self) -> Option<EngineEvent<U>> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Searching {
                unit, controller, ..
            } => {
                info!(
                    "Cancelled search for {:?} after {} iterations",
                    unit,
                    controller.search().iterations()
                );
                Some(EngineEvent::Cancelled { unit })
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Called by the animator once the unit has walked the whole path.
    pub fn on_path_consumed(&mut self) -> Result<CompletedMove<U>> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Animating { unit, path } => Ok(CompletedMove {
                unit,
                destination: path.destination(),
            }),
            other => {
                self.phase = other;
                Err(PathfindingError::NoPathInFlight)
            }
        }
    }

    /// Map-editing tool. Allowed at any time; a running search sees the new type when it
    /// next pops the cell.
    pub fn toggle_cell_type(&mut self, point: Point) -> Result<CellType> {
        let cell_type = self.grid.toggle_cell_type(point)?;
        self.grid.update();
        Ok(cell_type)
    }

    pub fn set_cost_modifier(&mut self, point: Point, cost_modifier: f64) -> Result<()> {
        self.grid.set_cost_modifier(point, cost_modifier)
    }
}
