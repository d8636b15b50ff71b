use crate::animation::Direction;
use crate::scheduler::Mode;

/// Requests decoded from a bus
///
/// Decoders only produce commands; [`crate::SharedState::apply`] carries them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a sweep now, optionally overriding the pinned direction
    Trigger(Option<Direction>),
    /// Change and persist the operating mode, then redraw the schedule
    SetMode(Mode),
    /// Change and persist the lower bound
    ///
    /// With `reschedule` the countdown is redrawn, otherwise only clamped.
    SetMinBound { seconds: u16, reschedule: bool },
    /// Change and persist the upper bound
    SetMaxBound { seconds: u16, reschedule: bool },
    /// Change and persist the bus address
    SetAddress(u8),
}
