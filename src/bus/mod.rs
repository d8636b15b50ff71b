//! Bus command decoding
//!
//! Each board variant listens on one bus. A [`BusDecoder`] turns the bus
//! input of its receive interrupt into [`Command`]s, and a [`BusPort`] pairs
//! it with the configuration store so commands are persisted as they land.

pub mod bit_sampler;
pub mod line;
pub mod two_wire;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::command::Command;
use crate::config::{ConfigStore, NvStorage};
use crate::random::RandomSource;
use crate::shared::SharedState;
use crate::SweepHardware;

/// Outcome of feeding one unit of bus input to a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Input was skipped without touching the session
    Discarded,
    /// Input was consumed, possibly completing a command
    Accepted(Option<Command>),
    /// Input was refused and the session was reset
    Rejected,
}

impl Decoded {
    /// Whether a two-wire transceiver should acknowledge the byte
    pub const fn is_ack(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub const fn command(&self) -> Option<Command> {
        match self {
            Self::Accepted(command) => *command,
            Self::Discarded | Self::Rejected => None,
        }
    }
}

/// Finite-state decoder for one bus protocol
pub trait BusDecoder {
    /// Unit of input delivered by the receive interrupt
    type Input;

    /// Whether every consumed input delays the next automatic sweep
    const NUDGES_SCHEDULE: bool = false;

    /// Feed one unit of input
    ///
    /// `address` is the configured bus address of this unit.
    fn decode(&mut self, input: Self::Input, address: u8) -> Decoded;

    /// Drop any partially received message
    fn reset(&mut self);
}

/// Receive side of a bus: decoder session plus the configuration store
#[derive(Debug)]
pub struct BusPort<D, S> {
    decoder: D,
    store: ConfigStore<S>,
}

impl<D: BusDecoder, S: NvStorage> BusPort<D, S> {
    pub const fn new(decoder: D, store: ConfigStore<S>) -> Self {
        Self { decoder, store }
    }

    /// Handle one unit of input from the bus receive interrupt
    pub fn on_input<R, H>(&mut self, input: D::Input, shared: &SharedState<R, H>) -> Decoded
    where
        R: RandomSource,
        H: SweepHardware,
    {
        let decoded = self.decoder.decode(input, shared.address());
        if D::NUDGES_SCHEDULE && decoded != Decoded::Discarded {
            shared.nudge_countdown();
        }
        if let Some(command) = decoded.command() {
            #[cfg(feature = "esp32-log")]
            println!("bus: {:?}", command);

            shared.apply(command, &mut self.store);
        }
        decoded
    }

    /// Drop any partially received message
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    pub const fn decoder(&self) -> &D {
        &self.decoder
    }

    pub const fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConfigStore<S> {
        &mut self.store
    }
}
