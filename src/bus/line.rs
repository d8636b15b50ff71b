//! Addressed line protocol
//!
//! A byte stream without framing. Each message starts with a header byte whose
//! low nibble is the target address (0 broadcasts) and whose high nibble tells
//! other units how many bytes follow, so they can skip them. The second byte
//! is the opcode:
//!
//! | opcode | operand          | effect                            |
//! |--------|------------------|-----------------------------------|
//! | 0      |                  | sweep forward                     |
//! | 1      |                  | sweep backward                    |
//! | 2      | mode             | set and persist mode              |
//! | 3      | min (big-endian) | set and persist lower bound       |
//! | 4      | max (big-endian) | set and persist upper bound       |
//! | 5      | address          | set and persist bus address       |

use super::{BusDecoder, Decoded};
use crate::animation::Direction;
use crate::command::Command;
use crate::scheduler::Mode;

pub const BROADCAST_ADDRESS: u8 = 0;

const ADDRESS_MASK: u8 = 0x0F;
const SKIP_SHIFT: u32 = 4;

pub const OPCODE_FORWARD: u8 = 0;
pub const OPCODE_BACKWARD: u8 = 1;
pub const OPCODE_SET_MODE: u8 = 2;
pub const OPCODE_SET_MIN: u8 = 3;
pub const OPCODE_SET_MAX: u8 = 4;
pub const OPCODE_SET_ADDRESS: u8 = 5;

/// Position of the decoder within a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineState {
    /// Waiting for a header byte
    #[default]
    Address,
    /// Header matched, waiting for the opcode
    Opcode,
    /// Waiting for the operand (or high byte) of `opcode`
    Operand { opcode: u8 },
    /// Waiting for the low byte of a word operand
    WordLow { opcode: u8, high: u8 },
}

/// Decoder for the addressed line protocol
#[derive(Debug, Clone, Default)]
pub struct LineDecoder {
    state: LineState,
    /// Bytes of a foreign message still to be skipped
    skip: u8,
}

impl LineDecoder {
    pub const fn new() -> Self {
        Self {
            state: LineState::Address,
            skip: 0,
        }
    }

    pub const fn state(&self) -> LineState {
        self.state
    }

    /// Bytes still to be skipped before the next header
    pub const fn pending_skip(&self) -> u8 {
        self.skip
    }

    fn on_opcode(&mut self, opcode: u8) -> Option<Command> {
        match opcode {
            OPCODE_FORWARD => {
                self.state = LineState::Address;
                Some(Command::Trigger(Some(Direction::Forward)))
            }
            OPCODE_BACKWARD => {
                self.state = LineState::Address;
                Some(Command::Trigger(Some(Direction::Backward)))
            }
            _ => {
                self.state = LineState::Operand { opcode };
                None
            }
        }
    }

    fn on_operand(&mut self, opcode: u8, byte: u8) -> Option<Command> {
        self.state = LineState::Address;
        match opcode {
            OPCODE_SET_MODE => Some(Command::SetMode(Mode::from_raw(byte))),
            OPCODE_SET_MIN | OPCODE_SET_MAX => {
                self.state = LineState::WordLow { opcode, high: byte };
                None
            }
            OPCODE_SET_ADDRESS => Some(Command::SetAddress(byte)),
            _ => None,
        }
    }

    fn on_word(&mut self, opcode: u8, high: u8, low: u8) -> Option<Command> {
        // A header byte arriving here is taken as the low byte; the session
        // always returns to `Address` after one word.
        self.state = LineState::Address;
        let seconds = u16::from_be_bytes([high, low]);
        match opcode {
            OPCODE_SET_MIN => Some(Command::SetMinBound {
                seconds,
                reschedule: true,
            }),
            OPCODE_SET_MAX => Some(Command::SetMaxBound {
                seconds,
                reschedule: true,
            }),
            _ => None,
        }
    }
}

impl BusDecoder for LineDecoder {
    type Input = u8;

    const NUDGES_SCHEDULE: bool = true;

    fn decode(&mut self, byte: u8, address: u8) -> Decoded {
        if self.skip > 0 {
            self.skip -= 1;
            return Decoded::Discarded;
        }

        let command = match self.state {
            LineState::Address => {
                let target = byte & ADDRESS_MASK;
                if target == address || target == BROADCAST_ADDRESS {
                    self.state = LineState::Opcode;
                } else {
                    self.skip = byte >> SKIP_SHIFT;
                }
                None
            }
            LineState::Opcode => self.on_opcode(byte),
            LineState::Operand { opcode } => self.on_operand(opcode, byte),
            LineState::WordLow { opcode, high } => self.on_word(opcode, high, byte),
        };
        Decoded::Accepted(command)
    }

    fn reset(&mut self) {
        self.state = LineState::Address;
        self.skip = 0;
    }
}
