/// Endpoint health state (§4.A). Transitions are driven purely by consecutive
/// success/failure counts from the pool so a single flaky call can't flap an
/// endpoint between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Degraded,
    Down,
}

#[derive(Clone, Debug)]
pub struct HealthTracker {
    state: HealthState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    degrade_after: u32,
    down_after: u32,
    recover_after: u32,
}

impl HealthTracker {
    pub fn new(degrade_after: u32, down_after: u32, recover_after: u32) -> Self {
        Self {
            state: HealthState::Healthy,
            consecutive_failures: 0,
            consecutive_successes: 0,
            degrade_after,
            down_after,
            recover_after,
        }
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.consecutive_successes += 1;
        if self.state != HealthState::Healthy && self.consecutive_successes >= self.recover_after {
            self.state = HealthState::Healthy;
        }
    }

    pub fn record_failure(&mut self) {
        self.consecutive_successes = 0;
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.down_after {
            self.state = HealthState::Down;
        } else if self.consecutive_failures >= self.degrade_after {
            self.state = HealthState::Degraded;
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(3, 6, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrades_then_goes_down_on_sustained_failures() {
        let mut h = HealthTracker::new(2, 4, 2);
        assert_eq!(h.state(), HealthState::Healthy);
        h.record_failure();
        assert_eq!(h.state(), HealthState::Healthy);
        h.record_failure();
        assert_eq!(h.state(), HealthState::Degraded);
        h.record_failure();
        h.record_failure();
        assert_eq!(h.state(), HealthState::Down);
    }

    #[test]
    fn recovers_after_consecutive_successes() {
        let mut h = HealthTracker::new(1, 2, 2);
        h.record_failure();
        h.record_failure();
        assert_eq!(h.state(), HealthState::Down);
        h.record_success();
        assert_eq!(h.state(), HealthState::Down);
        h.record_success();
        assert_eq!(h.state(), HealthState::Healthy);
    }
}
