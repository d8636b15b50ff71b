//! Shift register scan driver
//!
//! Runs in the main loop. For every animation step it shifts a full frame into
//! the register chain, waits for the PWM timer to overflow and pulses the
//! latch, so each step is latched exactly once and never half written.
//!
//! The star is three lit bits. The leading bit is always on; the two trailing
//! bits are switched by a display cycle counter that wraps every
//! [`CYCLE_LEN`] frames, which makes the tail glow fainter than the head.

use heapless::Vec;

use crate::animation::{AnimationState, Direction};
use crate::{Actuator, SharedState, SweepHardware};
use crate::random::RandomSource;

/// Number of outputs in the register chain
pub const DISPLAY_LEN: usize = 32;

/// Frames per display cycle
pub const CYCLE_LEN: u8 = 33;

const HEAD_LEN: i16 = 3;
/// Register index of the head when the sweep starts
const FORWARD_ORIGIN: i16 = 29;

/// Bits of one frame, in shift order
pub type Frame = Vec<bool, DISPLAY_LEN>;

/// Build the frame for a step
///
/// Bits pushed past either end of the chain are dropped, so the star slides
/// off the bar over the last steps.
pub fn frame(position: u8, direction: Direction, cycle: u8) -> Frame {
    let head = match direction {
        Direction::Forward => [true, cycle <= 2, cycle == 0],
        Direction::Backward => [cycle == 0, cycle <= 2, true],
    };
    let start = match direction {
        Direction::Forward => FORWARD_ORIGIN - i16::from(position),
        Direction::Backward => i16::from(position),
    };

    let mut frame = Frame::new();
    for index in 0..DISPLAY_LEN {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let offset = index as i16 - start;
        let lit = (0..HEAD_LEN).contains(&offset) && head[offset.unsigned_abs() as usize];
        let _ = frame.push(lit);
    }
    frame
}

/// Main loop driver of the register chain
#[derive(Debug)]
pub struct ScanDriver<A> {
    actuator: A,
    cycle: u8,
}

impl<A: Actuator> ScanDriver<A> {
    pub const fn new(actuator: A) -> Self {
        Self { actuator, cycle: 0 }
    }

    /// Current display cycle index, `0..CYCLE_LEN`
    pub const fn cycle(&self) -> u8 {
        self.cycle
    }

    /// Render the current step of `shared`, if a sweep is running
    pub fn poll<R: RandomSource, H: SweepHardware>(&mut self, shared: &SharedState<R, H>) -> bool {
        self.render(shared.snapshot())
    }

    /// Shift and latch one frame for `state`
    ///
    /// Returns `false` without touching the lines when no sweep is running.
    pub fn render(&mut self, state: AnimationState) -> bool {
        if !state.is_active() {
            return false;
        }

        for bit in frame(state.position, state.direction, self.cycle) {
            self.actuator.shift_bit(bit);
        }
        self.actuator.set_data(false);

        self.actuator.wait_for_pwm_overflow();
        self.actuator.pulse_latch();

        self.cycle += 1;
        if self.cycle >= CYCLE_LEN {
            self.cycle = 0;
        }
        true
    }

    pub const fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn into_inner(self) -> A {
        self.actuator
    }
}
