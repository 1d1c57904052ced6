//! Three-tap moving average on the drive branch output.

/// History of the two previous averaged outputs (pre floor clamp).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterState {
    pub previous_1: f32,
    pub previous_2: f32,
}

impl FilterState {
    /// History as if `value` had been output on the two previous ticks.
    pub fn settled_at(value: f32) -> Self {
        Self {
            previous_1: value,
            previous_2: value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSmoother {
    state: FilterState,
    floor_a: f32,
}

impl OutputSmoother {
    pub fn new(floor_a: f32) -> Self {
        Self::with_state(floor_a, FilterState::default())
    }

    pub fn with_state(floor_a: f32, state: FilterState) -> Self {
        Self { state, floor_a }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Average `requested` with the two previous outputs and shift history.
    ///
    /// Results with magnitude below the authority floor become `-floor`,
    /// never zero. History keeps the unclamped average.
    pub fn smooth(&mut self, requested: f32) -> f32 {
        let avg = (requested + self.state.previous_1 + self.state.previous_2) / 3.0;
        self.state.previous_2 = self.state.previous_1;
        self.state.previous_1 = avg;
        if avg.abs() < self.floor_a {
            -self.floor_a
        } else {
            avg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_with_history_and_shifts() {
        let mut s = OutputSmoother::new(1.0);
        assert_eq!(s.smooth(30.0), 10.0);
        assert_eq!(
            s.state(),
            FilterState {
                previous_1: 10.0,
                previous_2: 0.0
            }
        );
        assert_eq!(s.smooth(30.0), (30.0 + 10.0) / 3.0);
        assert_eq!(s.state().previous_2, 10.0);
    }

    #[test]
    fn underflow_is_forced_to_negative_floor() {
        let mut s = OutputSmoother::new(1.0);
        assert_eq!(s.smooth(1.5), -1.0);
        // History holds the real average, not the clamped output.
        assert_eq!(s.state().previous_1, 0.5);
    }

    #[test]
    fn settled_history_reproduces_constant_input() {
        let mut s = OutputSmoother::with_state(1.0, FilterState::settled_at(14.5));
        assert_eq!(s.smooth(14.5), 14.5);
        assert_eq!(s.smooth(14.5), 14.5);
    }
}
