//! Interrupt-shared state
//!
//! The sweep, the schedule, the bus address and the timer hardware are touched
//! from the step timer, second timer, pin change and bus receive interrupts as
//! well as from the main loop. Every access goes through a critical section,
//! so the 16-bit countdown and bound fields can never be observed half written.

use core::cell::{Cell, RefCell};

use critical_section::{CriticalSection, Mutex};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::SweepHardware;
use crate::animation::{AnimationEngine, AnimationState, Direction, StepOutcome};
use crate::command::Command;
use crate::config::{ConfigField, ConfigStore, DeviceConfig, NvStorage};
use crate::random::RandomSource;
use crate::scheduler::{Bounds, ScheduleState, Scheduler, SecondTick};

/// State shared between the interrupt handlers and the main loop
pub struct SharedState<R, H> {
    animation: Mutex<RefCell<AnimationEngine>>,
    schedule: Mutex<RefCell<Scheduler<R>>>,
    address: Mutex<Cell<u8>>,
    hardware: Mutex<RefCell<H>>,
}

impl<R: RandomSource, H: SweepHardware> SharedState<R, H> {
    /// Build the shared state from the loaded configuration and arm the schedule
    pub fn new(config: &DeviceConfig, random: R, hardware: H) -> Self {
        let shared = Self {
            animation: Mutex::new(RefCell::new(AnimationEngine::new())),
            schedule: Mutex::new(RefCell::new(Scheduler::new(
                config.mode,
                config.bounds,
                random,
            ))),
            address: Mutex::new(Cell::new(config.address)),
            hardware: Mutex::new(RefCell::new(hardware)),
        };
        shared.reset_random();
        shared
    }

    /// Copy of the sweep for the scan driver
    pub fn snapshot(&self) -> AnimationState {
        critical_section::with(|cs| self.animation.borrow(cs).borrow().state())
    }

    /// Copy of the scheduling state
    pub fn schedule(&self) -> ScheduleState {
        critical_section::with(|cs| self.schedule.borrow(cs).borrow().state())
    }

    pub fn address(&self) -> u8 {
        critical_section::with(|cs| self.address.borrow(cs).get())
    }

    /// Run `f` with exclusive access to the timer hardware
    pub fn with_hardware<T>(&self, f: impl FnOnce(&mut H) -> T) -> T {
        critical_section::with(|cs| f(&mut self.hardware.borrow(cs).borrow_mut()))
    }

    /// Start a sweep, overriding the pinned direction if given
    pub fn trigger(&self, direction: Option<Direction>) {
        critical_section::with(|cs| self.trigger_in(cs, direction));
    }

    /// Step timer compare interrupt
    pub fn on_step_compare(&self) -> StepOutcome {
        critical_section::with(|cs| {
            let mut animation = self.animation.borrow(cs).borrow_mut();
            let outcome = animation.step();
            if outcome == StepOutcome::Idle {
                return outcome;
            }

            let state = animation.state();
            let mut hardware = self.hardware.borrow(cs).borrow_mut();
            hardware.set_step_period(state.period);
            hardware.set_duty(state.duty);
            if outcome == StepOutcome::Finished {
                hardware.set_active_indicator(false);
            }
            outcome
        })
    }

    /// Second timer compare interrupt
    ///
    /// `enabled` is the level of the enable line.
    pub fn on_second(&self, enabled: bool) -> SecondTick {
        critical_section::with(|cs| {
            let tick = self.schedule.borrow(cs).borrow_mut().on_second(enabled);
            if tick == SecondTick::Fire {
                self.trigger_in(cs, None);
                self.reset_random_in(cs);
            }
            tick
        })
    }

    /// Pin change interrupt of the enable line
    pub fn on_enable_changed(&self, asserted: bool) {
        critical_section::with(|cs| {
            if asserted {
                self.reset_random_in(cs);
            } else {
                let mut schedule = self.schedule.borrow(cs).borrow_mut();
                schedule.disable();
                self.hardware
                    .borrow(cs)
                    .borrow_mut()
                    .set_trigger_offset(schedule.offset().compare_value());
            }
        });
    }

    /// Redraw the countdown, offset and direction of the next automatic sweep
    pub fn reset_random(&self) {
        critical_section::with(|cs| self.reset_random_in(cs));
    }

    /// Delay the next automatic sweep after bus traffic
    pub fn nudge_countdown(&self) {
        critical_section::with(|cs| self.schedule.borrow(cs).borrow_mut().nudge());
    }

    /// Carry out a decoded bus command, persisting what it changes
    pub fn apply<S: NvStorage>(&self, command: Command, store: &mut ConfigStore<S>) {
        match command {
            Command::Trigger(direction) => self.trigger(direction),
            Command::SetMode(mode) => {
                critical_section::with(|cs| {
                    self.schedule.borrow(cs).borrow_mut().set_mode(mode);
                    self.reset_random_in(cs);
                });
                store.persist(ConfigField::Mode(mode));
            }
            Command::SetMinBound {
                seconds,
                reschedule,
            } => self.update_bounds(|bounds| bounds.with_min(seconds), reschedule, store),
            Command::SetMaxBound {
                seconds,
                reschedule,
            } => self.update_bounds(|bounds| bounds.with_max(seconds), reschedule, store),
            Command::SetAddress(address) => {
                critical_section::with(|cs| self.address.borrow(cs).set(address));
                store.persist(ConfigField::Address(address));
            }
        }
    }

    fn update_bounds<S: NvStorage>(
        &self,
        update: impl FnOnce(Bounds) -> Bounds,
        reschedule: bool,
        store: &mut ConfigStore<S>,
    ) {
        let bounds = critical_section::with(|cs| {
            let mut schedule = self.schedule.borrow(cs).borrow_mut();
            let bounds = update(schedule.bounds());
            schedule.set_bounds(bounds);
            drop(schedule);
            if reschedule {
                self.reset_random_in(cs);
            }
            bounds
        });

        #[cfg(feature = "esp32-log")]
        println!("bounds: {}..{}", bounds.min(), bounds.max());

        // Both halves are written since a repair may have moved the other one
        store.persist(ConfigField::MinBound(bounds.min()));
        store.persist(ConfigField::MaxBound(bounds.max()));
    }

    fn trigger_in(&self, cs: CriticalSection<'_>, direction: Option<Direction>) {
        let direction =
            direction.unwrap_or_else(|| self.schedule.borrow(cs).borrow().direction());
        let mut animation = self.animation.borrow(cs).borrow_mut();
        animation.set_direction(direction);
        animation.trigger();

        let state = animation.state();
        let mut hardware = self.hardware.borrow(cs).borrow_mut();
        hardware.set_active_indicator(true);
        hardware.set_step_period(state.period);
        hardware.set_duty(state.duty);
    }

    fn reset_random_in(&self, cs: CriticalSection<'_>) {
        let mut schedule = self.schedule.borrow(cs).borrow_mut();
        if let Some(direction) = schedule.reset_random() {
            // A running sweep keeps its direction until it finishes
            let mut animation = self.animation.borrow(cs).borrow_mut();
            if !animation.is_active() {
                animation.set_direction(direction);
            }
        }
        self.hardware
            .borrow(cs)
            .borrow_mut()
            .set_trigger_offset(schedule.offset().compare_value());
    }
}
