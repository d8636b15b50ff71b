//! Two-wire slave protocol
//!
//! The decoder consumes discrete [`BusEvent`]s, so it works the same behind a
//! hardware slave peripheral and behind the software [`super::bit_sampler`].
//!
//! A write transaction carries a stream of opcodes:
//!
//! | opcode | operand | effect                                 |
//! |--------|---------|----------------------------------------|
//! | 0x00   |         | start a sweep                          |
//! | 0x01   | seconds | set lower bound (clamped to 1..=254)   |
//! | 0x02   | seconds | set upper bound                        |
//!
//! Other opcodes are acknowledged and ignored.

use super::{BusDecoder, Decoded};
use crate::animation::Direction;
use crate::command::Command;

pub const OPCODE_TRIGGER: u8 = 0x00;
pub const OPCODE_SET_MIN: u8 = 0x01;
pub const OPCODE_SET_MAX: u8 = 0x02;

const ADDRESS_MASK: u8 = 0x7F;
const MIN_SECONDS_FLOOR: u16 = 1;
const MIN_SECONDS_CEIL: u16 = 254;

/// Bus condition or byte seen by the slave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// START, or a repeated START
    Start,
    /// First byte after START: 7-bit address and direction bit
    Address { address: u8, read: bool },
    /// Byte written by the master
    Data(u8),
    Stop,
}

/// Direction used for a trigger opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDirection {
    /// Always sweep in one direction
    Fixed(Direction),
    /// Base address sweeps forward, the next address backward
    ByAddress,
    /// Keep the direction pinned by the scheduler
    Scheduled,
}

/// Session state of the slave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    /// Bus free or transaction addressed to someone else
    #[default]
    Idle,
    /// START seen, waiting for the address byte
    Listening,
    /// Addressed for writing, next byte is an opcode
    Addressed { direction: Option<Direction> },
    /// Waiting for the operand of `opcode`
    Operand {
        opcode: u8,
        direction: Option<Direction>,
    },
}

/// Decoder for the two-wire slave protocol
#[derive(Debug, Clone)]
pub struct TwoWireDecoder {
    session: Session,
    trigger: TriggerDirection,
}

impl TwoWireDecoder {
    pub const fn new(trigger: TriggerDirection) -> Self {
        Self {
            session: Session::Idle,
            trigger,
        }
    }

    pub const fn session(&self) -> Session {
        self.session
    }

    /// Direction for a trigger, or `None` if `target` is not ours
    fn match_address(&self, target: u8, own: u8) -> Option<Option<Direction>> {
        let own = own & ADDRESS_MASK;
        match self.trigger {
            TriggerDirection::Fixed(direction) => (target == own).then_some(Some(direction)),
            TriggerDirection::Scheduled => (target == own).then_some(None),
            TriggerDirection::ByAddress => {
                if target == own {
                    Some(Some(Direction::Forward))
                } else if target == own.wrapping_add(1) & ADDRESS_MASK {
                    Some(Some(Direction::Backward))
                } else {
                    None
                }
            }
        }
    }

    fn on_address(&mut self, target: u8, read: bool, own: u8) -> Decoded {
        if self.session != Session::Listening || read {
            return self.reject();
        }
        match self.match_address(target & ADDRESS_MASK, own) {
            Some(direction) => {
                self.session = Session::Addressed { direction };
                Decoded::Accepted(None)
            }
            None => self.reject(),
        }
    }

    fn on_data(&mut self, byte: u8) -> Decoded {
        match self.session {
            Session::Addressed { direction } => match byte {
                OPCODE_TRIGGER => Decoded::Accepted(Some(Command::Trigger(direction))),
                OPCODE_SET_MIN | OPCODE_SET_MAX => {
                    self.session = Session::Operand {
                        opcode: byte,
                        direction,
                    };
                    Decoded::Accepted(None)
                }
                _ => Decoded::Accepted(None),
            },
            Session::Operand { opcode, direction } => {
                self.session = Session::Addressed { direction };
                let seconds = u16::from(byte);
                let command = if opcode == OPCODE_SET_MIN {
                    Command::SetMinBound {
                        seconds: seconds.clamp(MIN_SECONDS_FLOOR, MIN_SECONDS_CEIL),
                        reschedule: false,
                    }
                } else {
                    Command::SetMaxBound {
                        seconds,
                        reschedule: false,
                    }
                };
                Decoded::Accepted(Some(command))
            }
            Session::Idle | Session::Listening => self.reject(),
        }
    }

    fn reject(&mut self) -> Decoded {
        self.session = Session::Idle;
        Decoded::Rejected
    }
}

impl BusDecoder for TwoWireDecoder {
    type Input = BusEvent;

    fn decode(&mut self, event: BusEvent, address: u8) -> Decoded {
        match event {
            BusEvent::Start => {
                // A repeated START drops whatever was in progress
                self.session = Session::Listening;
                Decoded::Accepted(None)
            }
            BusEvent::Address { address: target, read } => self.on_address(target, read, address),
            BusEvent::Data(byte) => self.on_data(byte),
            BusEvent::Stop => match self.session {
                Session::Operand { .. } | Session::Listening => self.reject(),
                Session::Idle | Session::Addressed { .. } => {
                    self.session = Session::Idle;
                    Decoded::Accepted(None)
                }
            },
        }
    }

    fn reset(&mut self) {
        self.session = Session::Idle;
    }
}
