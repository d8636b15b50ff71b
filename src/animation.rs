//! Falling star sweep
//!
//! The sweep is advanced by the step timer's compare interrupt. Each step
//! shortens the next compare period along a fixed integer curve and, past
//! the first third of the bar, halves the PWM duty every third step.

/// Position reported while no sweep is running
pub const POSITION_IDLE: u8 = 33;

/// Step timer compare period loaded by [`AnimationEngine::trigger`]
pub const START_PERIOD: u16 = 0x0100;

/// PWM duty loaded by [`AnimationEngine::trigger`]
pub const START_DUTY: u8 = 0x80;

const BASE_STEP: u16 = 0x2;
const MID_STEP: u16 = 0x4;
const LATE_STEP: u16 = 0xC;
/// The late step is only taken while the period is above this value
const LATE_FLOOR: u16 = 0x1F;

const MID_AFTER: u8 = 10;
const LATE_AFTER: u8 = 20;
const DIM_AFTER: u8 = 9;
const DIM_EVERY: u8 = 3;

/// Direction the star travels along the bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// Direction encoded by a single random bit
    pub const fn from_bit(bit: bool) -> Self {
        if bit { Self::Forward } else { Self::Backward }
    }
}

/// Snapshot of the sweep, as seen by the scan driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    /// Step index, `0..POSITION_IDLE` while active
    pub position: u8,
    pub direction: Direction,
    /// PWM duty applied to the LED channel
    pub duty: u8,
    /// Step timer compare period for the next step
    pub period: u16,
}

impl AnimationState {
    pub const fn idle() -> Self {
        Self {
            position: POSITION_IDLE,
            direction: Direction::Forward,
            duty: START_DUTY,
            period: START_PERIOD,
        }
    }

    pub const fn is_active(&self) -> bool {
        self.position < POSITION_IDLE
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Result of a single step interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No sweep was running
    Idle,
    /// The sweep moved one position forward
    Advanced,
    /// The sweep reached its last position and is now idle
    Finished,
}

/// Sweep state machine, driven by the step timer interrupt
#[derive(Debug, Clone, Default)]
pub struct AnimationEngine {
    state: AnimationState,
}

impl AnimationEngine {
    pub const fn new() -> Self {
        Self {
            state: AnimationState::idle(),
        }
    }

    pub const fn state(&self) -> AnimationState {
        self.state
    }

    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.state.direction = direction;
    }

    /// Restart the sweep from the first position
    ///
    /// Any sweep in progress is abandoned.
    pub fn trigger(&mut self) {
        self.state.position = 0;
        self.state.duty = START_DUTY;
        self.state.period = START_PERIOD;
    }

    /// Advance the sweep by one step
    ///
    /// Runs in the step timer interrupt, so it only does integer arithmetic.
    pub fn step(&mut self) -> StepOutcome {
        let state = &mut self.state;
        if !state.is_active() {
            return StepOutcome::Idle;
        }

        let position = state.position;
        state.period = state.period.saturating_sub(BASE_STEP);
        if position % DIM_EVERY == DIM_EVERY - 1 && position > DIM_AFTER {
            state.duty >>= 1;
        }
        if position > MID_AFTER {
            state.period = state.period.saturating_sub(MID_STEP);
            if position > LATE_AFTER && state.period > LATE_FLOOR {
                state.period -= LATE_STEP;
            }
        }

        state.position += 1;
        if state.is_active() {
            StepOutcome::Advanced
        } else {
            StepOutcome::Finished
        }
    }
}
