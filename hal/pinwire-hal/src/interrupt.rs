//! Pin-change interrupt dispatch
//!
//! The firmware owns the actual interrupt vectors. It keeps a small table
//! mapping each interrupt line to the listener currently attached to it
//! and, when the line fires, forwards the event to that listener's
//! receive routine.

/// Pin-change interrupt line identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptLine(pub u8);

/// Opaque identifier of an interrupt listener (one per driver instance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ListenerId(pub u8);

/// Interrupt dispatch registry
///
/// Exactly one listener can be attached per line. Attaching replaces any
/// previous listener; attaching `None` detaches the line.
pub trait InterruptRegistry {
    /// Attach `listener` to `line`, or detach the line when `None`
    fn attach(&mut self, line: InterruptLine, listener: Option<ListenerId>);

    /// Detach whatever listener is attached to `line`
    fn detach(&mut self, line: InterruptLine) {
        self.attach(line, None);
    }
}
