//! Timer ticks in wall-clock terms
//!
//! The firmware only ever deals in raw timer ticks. These helpers translate
//! them to [`Duration`]s and replay a whole sweep on a timeline, which is what
//! host-side previews and tests look at.

use embassy_time::{Duration, Instant};

use crate::animation::{AnimationEngine, Direction};
use crate::scheduler::TriggerOffset;

/// One tick of the step timer (8 MHz / 1024)
pub const STEP_TICK_US: u64 = 128;

/// One tick of the second timer (8 MHz / 256)
pub const SECOND_TICK_US: u64 = 32;

/// Time spent at one position for a compare period
///
/// The timer runs in clear-on-compare mode, so a period of `p` lasts `p + 1` ticks.
#[allow(clippy::cast_lossless)]
pub const fn step_interval(period: u16) -> Duration {
    Duration::from_micros((period as u64 + 1) * STEP_TICK_US)
}

/// Moment within each second at which the second timer fires
#[allow(clippy::cast_lossless)]
pub const fn offset_in_second(offset: TriggerOffset) -> Option<Duration> {
    match offset {
        TriggerOffset::Disabled => None,
        TriggerOffset::At(ticks) => Some(Duration::from_micros(ticks as u64 * SECOND_TICK_US)),
    }
}

/// One step of a replayed sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStep {
    /// When the step is shown
    pub at: Instant,
    pub position: u8,
    pub duty: u8,
    /// How long the step stays on the bar
    pub interval: Duration,
}

/// Replays a sweep from its trigger to idle
///
/// # Usage
///
/// ```ignore
/// for step in SweepTimeline::new(Direction::Forward, Instant::from_millis(0)) {
///     preview.draw(step.position, step.duty, step.at);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SweepTimeline {
    engine: AnimationEngine,
    at: Instant,
}

impl SweepTimeline {
    pub fn new(direction: Direction, start: Instant) -> Self {
        let mut engine = AnimationEngine::new();
        engine.set_direction(direction);
        engine.trigger();
        Self { engine, at: start }
    }

    /// Time at which the sweep ends, once the timeline is exhausted
    pub const fn now(&self) -> Instant {
        self.at
    }
}

impl Iterator for SweepTimeline {
    type Item = SweepStep;

    fn next(&mut self) -> Option<SweepStep> {
        let state = self.engine.state();
        if !state.is_active() {
            return None;
        }

        let step = SweepStep {
            at: self.at,
            position: state.position,
            duty: state.duty,
            interval: step_interval(state.period),
        };
        self.at += step.interval;
        self.engine.step();
        Some(step)
    }
}
