//! Randomized sweep scheduling
//!
//! The scheduler keeps a countdown in seconds until the next automatic sweep.
//! A second timer fires once per second at a random sub-second offset, so
//! consecutive sweeps never line up with a strict 1 Hz grid.

use crate::animation::Direction;
use crate::random::RandomSource;

/// Top of the second timer (31250 Hz clock, one period per second)
pub const SECOND_TIMER_TOP: u16 = 31250;

/// Comparator value that never matches, used to stop automatic sweeps
pub const OFFSET_DISABLED: u16 = 40_000;

const OFFSET_MASK: u32 = 0x7FFF;
const OFFSET_FOLD: u16 = 0x7FFF - (SECOND_TIMER_TOP - 1);
const SECONDS_SHIFT: u32 = 15;

/// Seconds added to the countdown by every line protocol byte
pub const NUDGE_SECONDS: u16 = 2;

/// Operating mode of the automatic trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Only bus commands start a sweep
    Manual = 0,
    FixedBackward = 1,
    FixedForward = 2,
    /// Direction is drawn together with the delay
    Random = 3,
}

impl Mode {
    /// Decode a raw mode byte
    ///
    /// Every unknown non-zero value selects random direction.
    pub const fn from_raw(value: u8) -> Self {
        match value {
            0 => Self::Manual,
            1 => Self::FixedBackward,
            2 => Self::FixedForward,
            _ => Self::Random,
        }
    }

    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Range of seconds between automatic sweeps
///
/// Always satisfies `max > min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    min: u16,
    max: u16,
}

impl Bounds {
    /// Create bounds, repairing `max <= min` to `max = min + 1`
    pub const fn new(min: u16, max: u16) -> Self {
        let min = if min == u16::MAX { u16::MAX - 1 } else { min };
        let max = if max <= min { min + 1 } else { max };
        Self { min, max }
    }

    pub const fn min(self) -> u16 {
        self.min
    }

    pub const fn max(self) -> u16 {
        self.max
    }

    pub const fn with_min(self, min: u16) -> Self {
        Self::new(min, self.max)
    }

    pub const fn with_max(self, max: u16) -> Self {
        Self::new(self.min, max)
    }

    /// Number of distinct countdown values, at least 1
    pub const fn span(self) -> u16 {
        self.max - self.min
    }
}

/// Sub-second comparator of the second timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOffset {
    Disabled,
    /// Timer ticks into the second, always below [`SECOND_TIMER_TOP`]
    At(u16),
}

impl TriggerOffset {
    /// Value to load into the comparator register
    pub const fn compare_value(self) -> u16 {
        match self {
            Self::Disabled => OFFSET_DISABLED,
            Self::At(ticks) => ticks,
        }
    }

    /// Fold a 15-bit draw into the timer range
    ///
    /// Draws past the top are shifted down instead of redrawn, so the result
    /// is always available in a single step.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_draw(draw: u32) -> Self {
        let ticks = (draw & OFFSET_MASK) as u16;
        if ticks >= SECOND_TIMER_TOP {
            Self::At(ticks - OFFSET_FOLD)
        } else {
            Self::At(ticks)
        }
    }
}

/// Copy of the scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    /// Seconds until the next automatic sweep
    pub countdown: u16,
    pub bounds: Bounds,
    pub mode: Mode,
    pub offset: TriggerOffset,
    /// Direction pinned for the next automatic sweep
    pub direction: Direction,
}

/// Result of a second tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondTick {
    /// The countdown moved one second closer
    Counting,
    /// The countdown has elapsed and a sweep should start
    Fire,
    /// The countdown has elapsed but the enable line is released
    Held,
}

/// Automatic trigger scheduler
#[derive(Debug, Clone)]
pub struct Scheduler<R> {
    state: ScheduleState,
    random: R,
}

impl<R: RandomSource> Scheduler<R> {
    /// Create an unarmed scheduler
    ///
    /// Call [`Scheduler::reset_random`] to arm it.
    pub const fn new(mode: Mode, bounds: Bounds, random: R) -> Self {
        Self {
            state: ScheduleState {
                countdown: 0,
                bounds,
                mode,
                offset: TriggerOffset::Disabled,
                direction: Direction::Forward,
            },
            random,
        }
    }

    pub const fn state(&self) -> ScheduleState {
        self.state
    }

    pub const fn countdown(&self) -> u16 {
        self.state.countdown
    }

    pub const fn bounds(&self) -> Bounds {
        self.state.bounds
    }

    pub const fn mode(&self) -> Mode {
        self.state.mode
    }

    pub const fn offset(&self) -> TriggerOffset {
        self.state.offset
    }

    pub const fn direction(&self) -> Direction {
        self.state.direction
    }

    /// Draw the next automatic sweep
    ///
    /// Returns the direction pinned for that sweep, or `None` in manual mode,
    /// where automatic sweeps are switched off instead.
    pub fn reset_random(&mut self) -> Option<Direction> {
        if self.state.mode == Mode::Manual {
            self.state.offset = TriggerOffset::Disabled;
            return None;
        }

        let draw = self.random.next_u32();
        self.state.offset = TriggerOffset::from_draw(draw);

        let bounds = self.state.bounds;
        let seconds = (draw >> SECONDS_SHIFT) % u32::from(bounds.span());
        // `seconds < span`, so the sum stays below `max`
        #[allow(clippy::cast_possible_truncation)]
        {
            self.state.countdown = bounds.min() + seconds as u16;
        }

        self.state.direction = match self.state.mode {
            Mode::FixedBackward => Direction::Backward,
            Mode::FixedForward => Direction::Forward,
            Mode::Manual | Mode::Random => Direction::from_bit(draw & 1 == 1),
        };
        Some(self.state.direction)
    }

    /// Stop automatic sweeps until the next [`Scheduler::reset_random`]
    pub fn disable(&mut self) {
        self.state.offset = TriggerOffset::Disabled;
    }

    /// Handle the once-per-second comparator match
    pub fn on_second(&mut self, enabled: bool) -> SecondTick {
        if self.state.offset == TriggerOffset::Disabled {
            return SecondTick::Held;
        }
        if self.state.countdown > 0 {
            self.state.countdown -= 1;
            SecondTick::Counting
        } else if enabled {
            SecondTick::Fire
        } else {
            SecondTick::Held
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.state.mode = mode;
    }

    /// Replace the bounds, clamping the live countdown into them
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.state.bounds = bounds;
        self.state.countdown = self.state.countdown.min(bounds.max());
    }

    /// Push the next automatic sweep away from a manual command
    pub fn nudge(&mut self) {
        self.state.countdown = self
            .state
            .countdown
            .saturating_add(NUDGE_SECONDS)
            .min(self.state.bounds.max());
    }
}
