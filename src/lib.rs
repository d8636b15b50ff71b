#![no_std]

pub mod animation;
pub mod bus;
pub mod command;
pub mod config;
pub mod random;
pub mod scan;
pub mod scheduler;
pub mod shared;
pub mod timing;

pub use animation::{AnimationEngine, AnimationState, Direction, POSITION_IDLE, StepOutcome};
pub use bus::line::LineDecoder;
pub use bus::two_wire::{BusEvent, TriggerDirection, TwoWireDecoder};
pub use bus::{BusDecoder, BusPort, Decoded};
pub use command::Command;
pub use config::{ConfigStore, DeviceConfig, NvStorage, RamStorage};
pub use random::{RandomSource, SeededRandom};
pub use scan::ScanDriver;
pub use scheduler::{Bounds, Mode, Scheduler, TriggerOffset};
pub use shared::SharedState;
pub use embassy_time::{Duration, Instant};

/// Shift register lines of the LED bar
///
/// Implement this trait for the board's data, clock and latch pins.
pub trait Actuator {
    /// Set the level of the data line
    fn set_data(&mut self, level: bool);

    /// Pulse the shift clock once
    fn pulse_clock(&mut self);

    /// Pulse the latch, copying the shifted bits to the outputs
    fn pulse_latch(&mut self);

    /// Spin until the PWM timer overflows
    fn wait_for_pwm_overflow(&mut self);

    /// Shift a single bit into the chain
    fn shift_bit(&mut self, value: bool) {
        self.set_data(value);
        self.pulse_clock();
    }
}

/// Timer registers driven by the sweep and the scheduler
pub trait SweepHardware {
    /// Compare period of the step timer
    fn set_step_period(&mut self, ticks: u16);

    /// PWM duty of the LED channel
    fn set_duty(&mut self, duty: u8);

    /// Sub-second comparator of the second timer
    fn set_trigger_offset(&mut self, compare: u16);

    /// Drive the shared "sweep active" line
    ///
    /// Only one board variant has this line; the default does nothing.
    fn set_active_indicator(&mut self, _active: bool) {}
}
