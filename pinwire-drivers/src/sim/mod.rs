//! Host-side cycle simulator
//!
//! Implements the pinwire HAL traits on top of a virtual cycle clock so
//! the drivers can be exercised without hardware:
//!
//! - [`SimClock`] - a device's CPU cycle count
//! - [`Line`] - a wire recording every level change with its timestamp
//! - [`SimTxPin`] / [`SimRxPin`] - drive / sample a [`Line`] at the
//!   owning device's current cycle
//! - [`SimDelay`] - advances the clock like the reference delay loop,
//!   call overhead included
//! - [`SimCounter`] - compare-match waits against the clock
//! - [`SimRegistry`] - interrupt dispatch table
//!
//! Two devices talk by sharing a [`Line`]: the sender's writes record
//! edges, then [`Line::replay`] delivers each edge to the receiver's
//! interrupt routine at the edge's timestamp. Edges that land while the
//! routine is still running are dropped, as they would be with
//! interrupts masked.
//!
//! The simulator is single-threaded (`Rc` handles) and only meant for
//! tests.

mod spi;

pub use spi::{SimGpio, SimSpi};

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use pinwire_hal::gpio::{InputPin, InterruptPin, OutputPin, PinMode, Pull};
use pinwire_hal::interrupt::{InterruptLine, InterruptRegistry, ListenerId};
use pinwire_hal::timing::{CycleCounter, DelayTicks, CYCLES_PER_TICK};

use crate::soft_serial::ClockFrequency;

/// Virtual CPU cycle count of one simulated device
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    /// Create a clock at cycle zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cycle
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    /// Jump to `cycle`
    pub fn set(&self, cycle: u64) {
        self.0.set(cycle);
    }

    /// Advance by `cycles`
    pub fn advance(&self, cycles: u64) {
        self.0.set(self.0.get() + cycles);
    }
}

/// Level change on a [`Line`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Cycle the change happened at
    pub at: u64,
    /// Level after the change
    pub high: bool,
}

#[derive(Debug)]
struct LineState {
    /// Level before the first recorded edge
    idle: bool,
    edges: Vec<Edge>,
}

/// Simulated wire, idle high
#[derive(Debug, Clone)]
pub struct Line(Rc<RefCell<LineState>>);

impl Default for Line {
    fn default() -> Self {
        Self::new()
    }
}

impl Line {
    /// Create an idle-high line
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(LineState {
            idle: true,
            edges: Vec::new(),
        })))
    }

    /// Drive the line to `high` at cycle `at`
    ///
    /// Writes that don't change the level are not recorded.
    pub fn drive(&self, at: u64, high: bool) {
        let mut state = self.0.borrow_mut();
        let current = state.edges.last().map_or(state.idle, |edge| edge.high);
        if current != high {
            state.edges.push(Edge { at, high });
        }
    }

    /// Level at cycle `at`
    pub fn level_at(&self, at: u64) -> bool {
        let state = self.0.borrow();
        state
            .edges
            .iter()
            .rev()
            .find(|edge| edge.at <= at)
            .map_or(state.idle, |edge| edge.high)
    }

    /// Recorded edges, oldest first
    pub fn edges(&self) -> Vec<Edge> {
        self.0.borrow().edges.clone()
    }

    /// Deliver every recorded edge to a receiver, then forget them
    ///
    /// For each edge not swallowed by a still-running handler, the
    /// receiver's clock is moved to the edge and `on_edge` is called.
    /// Edges earlier than the receiver's current cycle are missed.
    pub fn replay(&self, receiver: &SimClock, mut on_edge: impl FnMut()) {
        let edges = self.edges();
        let mut ready_at = receiver.now();
        for edge in &edges {
            if edge.at < ready_at {
                continue;
            }
            receiver.set(edge.at);
            on_edge();
            ready_at = receiver.now();
        }

        let mut state = self.0.borrow_mut();
        if let Some(last) = state.edges.last() {
            state.idle = last.high;
        }
        state.edges.clear();
    }
}

/// Output pin driving a [`Line`]
#[derive(Debug)]
pub struct SimTxPin {
    line: Line,
    clock: SimClock,
    high: bool,
    output: bool,
}

impl SimTxPin {
    /// Create a pin on `line` timed by `clock`
    pub fn new(line: Line, clock: SimClock) -> Self {
        Self {
            line,
            clock,
            high: true,
            output: false,
        }
    }

    /// Check whether the pin has been switched to output
    pub fn is_output(&self) -> bool {
        self.output
    }
}

impl OutputPin for SimTxPin {
    fn set_high(&mut self) {
        self.high = true;
        self.line.drive(self.clock.now(), true);
    }

    fn set_low(&mut self) {
        self.high = false;
        self.line.drive(self.clock.now(), false);
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

impl PinMode for SimTxPin {
    fn set_as_input(&mut self, _pull: Pull) {
        self.output = false;
    }

    fn set_as_output(&mut self) {
        self.output = true;
    }
}

/// Input pin sampling a [`Line`]
#[derive(Debug)]
pub struct SimRxPin {
    line: Line,
    clock: SimClock,
    irq: InterruptLine,
    pull: Pull,
}

impl SimRxPin {
    /// Create a pin on `line`, sampled at `clock`, raising `irq`
    pub fn new(line: Line, clock: SimClock, irq: InterruptLine) -> Self {
        Self {
            line,
            clock,
            irq,
            pull: Pull::None,
        }
    }

    /// Bias last configured
    pub fn pull(&self) -> Pull {
        self.pull
    }
}

impl InputPin for SimRxPin {
    fn is_high(&self) -> bool {
        self.line.level_at(self.clock.now())
    }
}

impl InterruptPin for SimRxPin {
    fn interrupt_line(&self) -> InterruptLine {
        self.irq
    }
}

impl PinMode for SimRxPin {
    fn set_as_input(&mut self, pull: Pull) {
        self.pull = pull;
    }

    fn set_as_output(&mut self) {}
}

/// Delay loop model of the reference target
#[derive(Debug, Clone)]
pub struct SimDelay {
    clock: SimClock,
    hz: u32,
}

impl SimDelay {
    /// Ticks of overhead for calling into the loop and returning
    pub const CALL_OVERHEAD_TICKS: u64 = 7;

    /// Create a delay for a device running at `frequency`
    pub fn new(clock: SimClock, frequency: ClockFrequency) -> Self {
        Self {
            clock,
            hz: frequency.hz(),
        }
    }
}

impl DelayTicks for SimDelay {
    fn delay_ticks(&mut self, ticks: u16) {
        let cycles = (u64::from(ticks) + Self::CALL_OVERHEAD_TICKS) * u64::from(CYCLES_PER_TICK);
        self.clock.advance(cycles);
    }

    fn delay_us(&mut self, us: u32) {
        self.clock
            .advance(u64::from(us) * u64::from(self.hz / 1_000_000));
    }
}

/// Free-running counter on a [`SimClock`]
#[derive(Debug, Clone)]
pub struct SimCounter {
    clock: SimClock,
    base: u64,
}

impl SimCounter {
    /// Create a counter on `clock`
    pub fn new(clock: SimClock) -> Self {
        Self { clock, base: 0 }
    }
}

impl CycleCounter for SimCounter {
    fn restart(&mut self) {
        self.base = self.clock.now();
    }

    fn wait_until(&mut self, cycles: u32) {
        let target = self.base + u64::from(cycles);
        if target > self.clock.now() {
            self.clock.set(target);
        }
    }
}

/// Number of interrupt lines the simulated registry tracks
pub const SIM_LINES: usize = 8;

#[derive(Debug, Default)]
struct RegistryState {
    attached: [Option<ListenerId>; SIM_LINES],
    calls: usize,
}

/// Simulated interrupt dispatch table
#[derive(Debug, Clone, Default)]
pub struct SimRegistry(Rc<RefCell<RegistryState>>);

impl SimRegistry {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener attached to `line`
    pub fn attached(&self, line: InterruptLine) -> Option<ListenerId> {
        self.0
            .borrow()
            .attached
            .get(usize::from(line.0))
            .copied()
            .flatten()
    }

    /// Number of attach/detach calls so far
    pub fn calls(&self) -> usize {
        self.0.borrow().calls
    }
}

impl InterruptRegistry for SimRegistry {
    fn attach(&mut self, line: InterruptLine, listener: Option<ListenerId>) {
        let mut state = self.0.borrow_mut();
        state.calls += 1;
        if let Some(slot) = state.attached.get_mut(usize::from(line.0)) {
            *slot = listener;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_records_changes_only() {
        let line = Line::new();
        line.drive(5, true);
        line.drive(10, false);
        line.drive(12, false);
        line.drive(20, true);

        assert_eq!(
            line.edges(),
            [Edge { at: 10, high: false }, Edge { at: 20, high: true }]
        );
        assert!(line.level_at(9));
        assert!(!line.level_at(10));
        assert!(!line.level_at(19));
        assert!(line.level_at(20));
    }

    #[test]
    fn test_replay_skips_edges_during_handler() {
        let line = Line::new();
        line.drive(100, false);
        line.drive(150, true);
        line.drive(400, false);

        let rx = SimClock::new();
        let mut seen = Vec::new();
        line.replay(&rx, || {
            seen.push(rx.now());
            // Handler runs for 200 cycles
            rx.advance(200);
        });

        assert_eq!(seen, [100, 400]);
        assert!(line.edges().is_empty());
        // Final level persists
        assert!(!line.level_at(0));
    }

    #[test]
    fn test_delay_and_counter() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock.clone(), ClockFrequency::Mhz16);
        delay.delay_ticks(10);
        assert_eq!(clock.now(), (10 + 7) * 7);
        delay.delay_us(2);
        assert_eq!(clock.now(), 119 + 32);

        let mut counter = SimCounter::new(clock.clone());
        counter.restart();
        counter.wait_until(49);
        assert_eq!(clock.now(), 151 + 49);
        // Already past: no wait
        counter.wait_until(10);
        assert_eq!(clock.now(), 200);
    }

    #[test]
    fn test_registry() {
        let mut registry = SimRegistry::new();
        registry.attach(InterruptLine(3), Some(ListenerId(1)));
        assert_eq!(registry.attached(InterruptLine(3)), Some(ListenerId(1)));
        registry.detach(InterruptLine(3));
        assert_eq!(registry.attached(InterruptLine(3)), None);
        assert_eq!(registry.calls(), 2);
        // Out of range lines are ignored
        registry.attach(InterruptLine(200), Some(ListenerId(1)));
        assert_eq!(registry.attached(InterruptLine(200)), None);
    }
}
