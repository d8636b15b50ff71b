//! Software two-wire transceiver
//!
//! For boards without a slave peripheral. Call [`BitSampler::sample`] from the
//! pin change interrupt of SCL and SDA with the current line levels, forward
//! the returned events to the decoder, then hand its verdict back with
//! [`BitSampler::reply`]. Drive SDA low while [`BitSampler::sda_low`] is set.
//!
//! ```ignore
//! if let Some(event) = sampler.sample(scl.is_high(), sda.is_high()) {
//!     let decoded = port.on_input(event, &SHARED);
//!     sampler.reply(decoded.is_ack());
//! }
//! sda.set_drive_low(sampler.sda_low());
//! ```

use super::two_wire::BusEvent;

const BITS_PER_BYTE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for START
    Idle,
    /// Shifting in a byte, most significant bit first
    Receiving { bits: u8, byte: u8, address: bool },
    /// Byte delivered, waiting for the decoder's verdict
    AwaitReply,
    /// ACK decided, SDA goes low on the next SCL falling edge
    AckReady,
    /// SDA held low for the ACK clock
    Acking,
}

/// Edge-driven two-wire slave receiver
#[derive(Debug, Clone)]
pub struct BitSampler {
    scl: bool,
    sda: bool,
    phase: Phase,
    sda_low: bool,
}

impl Default for BitSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl BitSampler {
    /// Create a sampler for an idle bus (both lines released)
    pub const fn new() -> Self {
        Self {
            scl: true,
            sda: true,
            phase: Phase::Idle,
            sda_low: false,
        }
    }

    /// Whether the slave must pull SDA low
    pub const fn sda_low(&self) -> bool {
        self.sda_low
    }

    /// Whether a delivered byte still waits for [`BitSampler::reply`]
    pub const fn awaiting_reply(&self) -> bool {
        matches!(self.phase, Phase::AwaitReply)
    }

    /// Process new line levels
    pub fn sample(&mut self, scl: bool, sda: bool) -> Option<BusEvent> {
        let (was_scl, was_sda) = (self.scl, self.sda);
        self.scl = scl;
        self.sda = sda;

        // SDA only changes with SCL high for START and STOP
        if scl && was_scl && sda != was_sda {
            self.sda_low = false;
            return if sda {
                self.phase = Phase::Idle;
                Some(BusEvent::Stop)
            } else {
                self.phase = Phase::Receiving {
                    bits: 0,
                    byte: 0,
                    address: true,
                };
                Some(BusEvent::Start)
            };
        }

        match (was_scl, scl) {
            (false, true) => self.on_rising(sda),
            (true, false) => {
                self.on_falling();
                None
            }
            _ => None,
        }
    }

    /// Answer the byte returned by the last [`BitSampler::sample`]
    ///
    /// A NACK releases the bus until the next START.
    pub fn reply(&mut self, ack: bool) {
        if self.phase == Phase::AwaitReply {
            self.phase = if ack { Phase::AckReady } else { Phase::Idle };
        }
    }

    fn on_rising(&mut self, sda: bool) -> Option<BusEvent> {
        let Phase::Receiving {
            bits,
            byte,
            address,
        } = self.phase
        else {
            return None;
        };

        let byte = (byte << 1) | u8::from(sda);
        let bits = bits + 1;
        if bits < BITS_PER_BYTE {
            self.phase = Phase::Receiving {
                bits,
                byte,
                address,
            };
            return None;
        }

        self.phase = Phase::AwaitReply;
        Some(if address {
            BusEvent::Address {
                address: byte >> 1,
                read: byte & 1 == 1,
            }
        } else {
            BusEvent::Data(byte)
        })
    }

    fn on_falling(&mut self) {
        match self.phase {
            Phase::AckReady => {
                self.sda_low = true;
                self.phase = Phase::Acking;
            }
            Phase::Acking => {
                self.sda_low = false;
                self.phase = Phase::Receiving {
                    bits: 0,
                    byte: 0,
                    address: false,
                };
            }
            // Nobody answered in time
            Phase::AwaitReply => self.phase = Phase::Idle,
            Phase::Idle | Phase::Receiving { .. } => {}
        }
    }
}
