/// Round-robin roster of the units taking turns. After a move completes the caller
/// selects the next unit, wrapping around at the end.
#[derive(Clone, Debug)]
pub struct TurnOrder<U> {
    units: Vec<U>,
    current: usize,
}

impl<U> TurnOrder<U> {
    /// `None` if there is nobody to take a turn.
    pub fn new(units: Vec<U>) -> Option<TurnOrder<U>> {
        if units.is_empty() {
            None
        } else {
            Some(TurnOrder { units, current: 0 })
        }
    }

    pub fn current(&self) -> &U {
        &self.units[self.current]
    }
    pub fn current_mut(&mut self) -> &mut U {
        &mut self.units[self.current]
    }
    pub fn current_index(&self) -> usize {
        self.current
    }
    pub fn units(&self) -> &[U] {
        &self.units
    }

    /// Hands the turn to the next unit.
    pub fn select_next(&mut self) -> &U {
        self.current = (self.current + 1) % self.units.len();
        &self.units[self.current]
    }
}
