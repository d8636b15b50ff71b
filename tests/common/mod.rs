//! Shared mocks for the integration tests

#![allow(dead_code)] // Each test file uses a different subset

use meteor_bar::config::CONFIG_LEN;
use meteor_bar::{
    Actuator, Bounds, BusDecoder, BusPort, ConfigStore, DeviceConfig, Mode, RamStorage,
    RandomSource, SharedState, SweepHardware,
};

/// Timer registers as last written
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MockTimers {
    pub period: u16,
    pub duty: u8,
    pub offset: u16,
    pub active: bool,
}

impl SweepHardware for MockTimers {
    fn set_step_period(&mut self, ticks: u16) {
        self.period = ticks;
    }

    fn set_duty(&mut self, duty: u8) {
        self.duty = duty;
    }

    fn set_trigger_offset(&mut self, compare: u16) {
        self.offset = compare;
    }

    fn set_active_indicator(&mut self, active: bool) {
        self.active = active;
    }
}

/// Random source replaying a fixed list of draws
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: heapless::Vec<u32, 16>,
    next: usize,
}

impl ScriptedRandom {
    pub fn new(draws: &[u32]) -> Self {
        let mut script = heapless::Vec::new();
        script.extend_from_slice(draws).unwrap();
        Self {
            draws: script,
            next: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_u32(&mut self) -> u32 {
        let draw = self.draws[self.next % self.draws.len()];
        self.next += 1;
        draw
    }
}

/// Line event recorded by [`MockActuator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOp {
    Clock(bool),
    Wait,
    Latch,
}

/// Shift register lines that record every operation
#[derive(Debug, Default)]
pub struct MockActuator {
    data: bool,
    pub ops: Vec<LineOp>,
}

impl MockActuator {
    /// Bits shifted since the previous latch, per latched frame
    pub fn frames(&self) -> Vec<Vec<bool>> {
        let mut frames = Vec::new();
        let mut current = Vec::new();
        for op in &self.ops {
            match op {
                LineOp::Clock(bit) => current.push(*bit),
                LineOp::Latch => frames.push(std::mem::take(&mut current)),
                LineOp::Wait => {}
            }
        }
        frames
    }
}

impl Actuator for MockActuator {
    fn set_data(&mut self, level: bool) {
        self.data = level;
    }

    fn pulse_clock(&mut self) {
        self.ops.push(LineOp::Clock(self.data));
    }

    fn pulse_latch(&mut self) {
        self.ops.push(LineOp::Latch);
    }

    fn wait_for_pwm_overflow(&mut self) {
        self.ops.push(LineOp::Wait);
    }
}

pub type Storage = RamStorage<CONFIG_LEN>;

pub fn config(address: u8, mode: Mode, min: u16, max: u16) -> DeviceConfig {
    DeviceConfig {
        address,
        mode,
        bounds: Bounds::new(min, max),
    }
}

pub fn shared<R: RandomSource>(config: &DeviceConfig, random: R) -> SharedState<R, MockTimers> {
    SharedState::new(config, random, MockTimers::default())
}

pub fn port<D: BusDecoder>(decoder: D) -> BusPort<D, Storage> {
    BusPort::new(decoder, ConfigStore::new(Storage::new()))
}
