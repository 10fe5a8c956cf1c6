//! Software serial channel

use pinwire_hal::gpio::{InterruptPin, OutputPin, PinMode, Pull};
use pinwire_hal::interrupt::{InterruptRegistry, ListenerId};
use pinwire_hal::serial::{SerialRead, SerialWrite};
use pinwire_hal::timing::{CycleCounter, DelayTicks};

use super::buffer::ReceiveBuffer;
use super::listener::ListenerRegistry;
use super::timing::{BaudTimingProfile, ClockFrequency, SymbolTiming};
use super::SerialError;

/// Receive state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ListenState {
    /// Not attached to its pin-change interrupt; incoming frames are lost
    Idle,
    /// The one channel currently receiving
    Listening,
}

/// Bit-banged 8N1 serial channel
///
/// # Type parameters
/// - `Rx`: receive pin (input with a pin-change interrupt line)
/// - `Tx`: transmit pin
/// - `D`: calibrated delay loop, times transmitted bits
/// - `C`: free-running cycle counter, times received samples
/// - `R`: interrupt registry behind the shared [`ListenerRegistry`]
pub struct SoftSerial<'r, Rx, Tx, D, C, R>
where
    Rx: InterruptPin + PinMode,
    Tx: OutputPin + PinMode,
    D: DelayTicks,
    C: CycleCounter,
    R: InterruptRegistry,
{
    id: ListenerId,
    rx: Rx,
    tx: Tx,
    delay: D,
    counter: C,
    listeners: &'r ListenerRegistry<R>,
    clock: ClockFrequency,
    profile: BaudTimingProfile,
    timing: SymbolTiming,
    buffer: ReceiveBuffer,
    /// Frames whose stop bit sampled low
    framing_errors: u16,
}

impl<'r, Rx, Tx, D, C, R> SoftSerial<'r, Rx, Tx, D, C, R>
where
    Rx: InterruptPin + PinMode,
    Tx: OutputPin + PinMode,
    D: DelayTicks,
    C: CycleCounter,
    R: InterruptRegistry,
{
    /// Create an unconfigured channel
    ///
    /// The TX line is driven idle-high and RX becomes a pulled-up input.
    /// Call [`begin`](Self::begin) before use.
    pub fn new(
        id: ListenerId,
        mut rx: Rx,
        mut tx: Tx,
        delay: D,
        counter: C,
        listeners: &'r ListenerRegistry<R>,
    ) -> Self {
        tx.set_as_output();
        tx.set_high();
        rx.set_as_input(Pull::Up);

        Self {
            id,
            rx,
            tx,
            delay,
            counter,
            listeners,
            clock: ClockFrequency::default(),
            profile: BaudTimingProfile::UNCONFIGURED,
            timing: SymbolTiming::default(),
            buffer: ReceiveBuffer::new(),
            framing_errors: 0,
        }
    }

    /// Configure the baud rate and start listening
    ///
    /// On an unsupported baud rate the channel is left unconfigured and
    /// idle.
    pub fn begin(&mut self, clock: ClockFrequency, baud: u32) -> Result<(), SerialError> {
        self.clock = clock;
        self.profile = BaudTimingProfile::UNCONFIGURED;
        self.timing = SymbolTiming::default();

        let profile = match BaudTimingProfile::lookup(clock, baud) {
            Ok(profile) => profile,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("soft serial {}: {}", self.id, e);
                self.stop_listening();
                return Err(e);
            }
        };

        self.profile = profile;
        self.timing = SymbolTiming::new(clock, &profile);

        // One bit of idle so a receiver sees a clean stop before our first start bit
        self.delay.delay_ticks(profile.tx_delay);

        self.listen();
        Ok(())
    }

    /// Make this the listening channel
    ///
    /// Clears the receive buffer and overflow flag, and takes receive away
    /// from whichever channel had it. Returns `false` (and does nothing)
    /// if the channel has no baud rate configured.
    pub fn listen(&mut self) -> bool {
        if !self.profile.is_configured() {
            return false;
        }

        self.buffer.reset();
        let displaced = self.listeners.claim(self.id, self.rx.interrupt_line());

        if let Some(_previous) = displaced {
            #[cfg(feature = "defmt")]
            defmt::debug!("soft serial {} takes receive from {}", self.id, _previous);
        }

        true
    }

    /// Stop receiving, if this channel is the listening one
    pub fn stop_listening(&mut self) {
        self.listeners.release(self.id);
    }

    /// Shut the channel down
    pub fn end(&mut self) {
        self.stop_listening();
    }

    /// Current receive state
    pub fn state(&self) -> ListenState {
        if self.listeners.is_active(self.id) {
            ListenState::Listening
        } else {
            ListenState::Idle
        }
    }

    /// Check whether this channel is the listening one
    pub fn is_listening(&self) -> bool {
        self.state() == ListenState::Listening
    }

    /// Transmit one byte
    ///
    /// Blocks for the whole frame with interrupts masked, including this
    /// channel's own receive interrupt. Returns the number of bytes sent:
    /// 1, or 0 when no baud rate is configured (nothing is driven).
    pub fn write(&mut self, byte: u8) -> usize {
        if !self.profile.is_configured() {
            return 0;
        }

        let bit_ticks = self.profile.tx_delay;
        let start_ticks = bit_ticks.saturating_add(self.clock.start_adjustment());
        let tx = &mut self.tx;
        let delay = &mut self.delay;

        critical_section::with(|_| {
            // Start bit
            tx.set_low();
            delay.delay_ticks(start_ticks);

            // Data, LSB first
            for bit in 0..8 {
                tx.set_state(byte & (1 << bit) != 0);
                delay.delay_ticks(bit_ticks);
            }

            // Stop bit, leaving the line idle
            tx.set_high();
            delay.delay_ticks(bit_ticks);
        });

        1
    }

    /// Transmit every byte of `bytes`
    pub fn write_all(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().map(|&byte| self.write(byte)).sum()
    }

    /// Receive routine for the RX pin-change interrupt
    ///
    /// Must run with other interrupts disabled. Ignores the call unless
    /// this channel is listening and the line is still low (rising edges
    /// and glitches). Otherwise samples the eight data bits and the stop
    /// bit at the middle of each symbol and buffers the byte.
    pub fn on_pin_change(&mut self) {
        if !self.profile.is_configured() || !self.listeners.is_active(self.id) {
            return;
        }

        self.counter.restart();
        if self.rx.is_high() {
            return;
        }

        let timing = self.timing;
        self.counter.wait_until(timing.centering_cycles);

        let mut byte = 0u8;
        for bit in 0..8 {
            self.counter.wait_until(timing.data_sample(bit));
            if self.rx.is_high() {
                byte |= 1 << bit;
            }
        }

        self.counter.wait_until(timing.stop_sample());
        if self.rx.is_low() {
            self.framing_errors = self.framing_errors.saturating_add(1);
        }

        self.buffer.push(byte);
    }

    /// Pop the oldest received byte
    pub fn read(&mut self) -> Option<u8> {
        self.buffer.pop()
    }

    /// Return the oldest received byte without removing it
    pub fn peek(&self) -> Option<u8> {
        self.buffer.peek()
    }

    /// Number of received bytes waiting
    pub fn available(&self) -> usize {
        self.buffer.len()
    }

    /// Discard received bytes
    ///
    /// Only the receive buffer is affected; the overflow flag stays set.
    pub fn flush(&mut self) {
        self.buffer.clear();
    }

    /// Check whether a received byte has been dropped because the buffer
    /// was full. Cleared by [`listen`](Self::listen).
    pub fn overflow(&self) -> bool {
        self.buffer.overflow()
    }

    /// Number of frames received with a low stop bit
    pub fn framing_errors(&self) -> u16 {
        self.framing_errors
    }

    /// Active timing profile
    pub fn profile(&self) -> BaudTimingProfile {
        self.profile
    }

    /// Receive checkpoints derived from the active profile
    pub fn timing(&self) -> SymbolTiming {
        self.timing
    }

    /// Listener identifier
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl<Rx, Tx, D, C, R> Drop for SoftSerial<'_, Rx, Tx, D, C, R>
where
    Rx: InterruptPin + PinMode,
    Tx: OutputPin + PinMode,
    D: DelayTicks,
    C: CycleCounter,
    R: InterruptRegistry,
{
    fn drop(&mut self) {
        self.end();
    }
}

impl<Rx, Tx, D, C, R> SerialWrite for SoftSerial<'_, Rx, Tx, D, C, R>
where
    Rx: InterruptPin + PinMode,
    Tx: OutputPin + PinMode,
    D: DelayTicks,
    C: CycleCounter,
    R: InterruptRegistry,
{
    fn write_byte(&mut self, byte: u8) -> usize {
        self.write(byte)
    }
}

impl<Rx, Tx, D, C, R> SerialRead for SoftSerial<'_, Rx, Tx, D, C, R>
where
    Rx: InterruptPin + PinMode,
    Tx: OutputPin + PinMode,
    D: DelayTicks,
    C: CycleCounter,
    R: InterruptRegistry,
{
    fn read(&mut self) -> Option<u8> {
        SoftSerial::read(self)
    }

    fn peek(&self) -> Option<u8> {
        SoftSerial::peek(self)
    }

    fn available(&self) -> usize {
        SoftSerial::available(self)
    }

    fn flush(&mut self) {
        SoftSerial::flush(self)
    }
}
