use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::model::BlinkConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Stopped,
    /// Seconds until the next blink.
    Waiting(f64),
    /// Seconds until the eyes open again.
    Closed(f64),
}

/// A repeating blink schedule: wait a random interval, close the eyes for a
/// short hold, repeat.
///
/// The timer only moves when [BlinkTimer::advance] is called, so a stopped or
/// dropped timer can never fire into a rig that has been swapped out.
#[derive(Debug)]
pub struct BlinkTimer {
    state: State,
    config: BlinkConfig,
    rng: StdRng,
}

impl BlinkTimer {
    pub fn new(config: BlinkConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: BlinkConfig, rng: StdRng) -> Self {
        Self {
            state: State::Stopped,
            config,
            rng,
        }
    }

    pub fn start(&mut self) {
        if self.state == State::Stopped {
            self.state = State::Waiting(self.next_interval());
        }
    }

    pub fn stop(&mut self) {
        if self.state != State::Stopped {
            debug!("Blink timer stopped");
        }

        self.state = State::Stopped;
    }

    pub fn is_running(&self) -> bool {
        self.state != State::Stopped
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.state, State::Closed(_))
    }

    /// Move the schedule forward by `delta` seconds. Returns `true` when a blink
    /// started during this step.
    pub fn advance(&mut self, delta: f64) -> bool {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };

        match self.state {
            State::Stopped => false,
            State::Waiting(remaining) if remaining <= delta => {
                self.state = State::Closed(self.config.hold_ms as f64 / 1000.0);
                true
            }
            State::Waiting(remaining) => {
                self.state = State::Waiting(remaining - delta);
                false
            }
            State::Closed(remaining) if remaining <= delta => {
                self.state = State::Waiting(self.next_interval());
                false
            }
            State::Closed(remaining) => {
                self.state = State::Closed(remaining - delta);
                false
            }
        }
    }

    fn next_interval(&mut self) -> f64 {
        let min = self.config.min_interval_ms.min(self.config.max_interval_ms);
        let max = self.config.min_interval_ms.max(self.config.max_interval_ms);

        self.rng.gen_range(min..=max) as f64 / 1000.0
    }
}
