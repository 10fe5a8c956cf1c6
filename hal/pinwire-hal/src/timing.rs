//! Cycle-accurate timing primitives
//!
//! Bit-banged protocols need waits that are accurate to a few CPU cycles.
//! Two primitives cover the drivers' needs:
//!
//! - [`DelayTicks`] - a calibrated busy-wait loop, used to time transmitted
//!   bit edges
//! - [`CycleCounter`] - a free-running counter with compare-match waits,
//!   used to place receive samples relative to a detected edge
//!
//! Neither primitive masks interrupts. If interrupts stay enabled during a
//! wait, preemption stretches it; callers needing precision mask first.

/// CPU cycles consumed by one iteration of the reference delay loop
///
/// Calibration tables express their delays in loop iterations ("ticks").
/// Targets whose loop costs a different number of cycles need their own
/// tables.
pub const CYCLES_PER_TICK: u32 = 7;

/// Calibrated busy-wait delay
pub trait DelayTicks {
    /// Busy-wait `ticks` iterations of the calibrated delay loop
    ///
    /// Elapsed time is `ticks * CYCLES_PER_TICK / f_cpu`, plus a small
    /// constant call overhead that the calibration tables absorb.
    fn delay_ticks(&mut self, ticks: u16);

    /// Busy-wait for `us` microseconds
    fn delay_us(&mut self, us: u32);
}

/// Free-running cycle counter with compare-match wait
///
/// Typically a 16-bit hardware timer running at the CPU clock with no
/// prescaler, or a core cycle counter.
pub trait CycleCounter {
    /// Reset the counter to zero and start it running
    fn restart(&mut self);

    /// Spin until the counter reaches `cycles` since the last restart
    ///
    /// Returns immediately if the counter is already past `cycles`.
    fn wait_until(&mut self, cycles: u32);
}
