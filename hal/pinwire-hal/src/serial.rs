//! Byte-level serial abstractions
//!
//! Provides traits for serial channels that transmit synchronously and
//! buffer received bytes in the background. Implemented by the software
//! UART; hardware UART drivers can implement them too so that protocol
//! code works over either.

/// Serial transmitter
pub trait SerialWrite {
    /// Transmit one byte, blocking until it is fully on the wire
    ///
    /// Returns the number of bytes transferred.
    fn write_byte(&mut self, byte: u8) -> usize;

    /// Transmit every byte of `data`
    fn write_all(&mut self, data: &[u8]) -> usize {
        data.iter().map(|&byte| self.write_byte(byte)).sum()
    }
}

/// Serial receiver backed by a receive buffer
///
/// None of these calls block. An empty buffer is not an error: reads
/// simply return `None`.
pub trait SerialRead {
    /// Pop the oldest received byte
    fn read(&mut self) -> Option<u8>;

    /// Return the oldest received byte without removing it
    fn peek(&self) -> Option<u8>;

    /// Number of bytes waiting in the receive buffer
    fn available(&self) -> usize;

    /// Discard all buffered bytes
    fn flush(&mut self);

    /// Drain up to `buf.len()` buffered bytes into `buf`
    fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.read() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }
}
