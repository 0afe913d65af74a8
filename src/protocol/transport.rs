//! Byte transport between host and bootloader

use super::{ProtocolError, Result};
use core::convert::Infallible;
use embedded_hal::serial;

/// One serial channel to the host.
///
/// `receive_byte` is the only place the bootloader waits, so it is also where
/// a session ends: when no byte arrives in time it reports
/// [`ProtocolError::Timeout`] and the caller leaves for the application.
pub trait Transport {
    /// Blocks until the channel accepts the byte.
    fn send_byte(&mut self, byte: u8);

    /// Blocks until a byte arrives or the receive budget runs out.
    fn receive_byte(&mut self) -> Result<u8>;

    fn send_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.send_byte(byte);
        }
    }

    /// Reads and drops `count` bytes.
    fn skip(&mut self, count: u8) -> Result<()> {
        for _ in 0..count {
            self.receive_byte()?;
        }
        Ok(())
    }
}

/// [`Transport`] over any embedded-hal serial port, with a polling budget.
pub struct SerialTransport<S> {
    serial: S,
    budget: u32,
}

impl<S> SerialTransport<S>
where
    S: serial::Read<u8> + serial::Write<u8>,
{
    /// `budget` is the number of empty polls before the host counts as gone.
    pub fn new(serial: S, budget: u32) -> Self {
        Self { serial, budget }
    }

    pub fn release(self) -> S {
        self.serial
    }
}

impl<S> Transport for SerialTransport<S>
where
    S: serial::Read<u8> + serial::Write<u8>,
{
    fn send_byte(&mut self, byte: u8) {
        if nb::block!(self.serial.write(byte)).is_err() {
            log::warn!("serial write failed, dropped {:#04x}", byte);
        }
    }

    fn receive_byte(&mut self) -> Result<u8> {
        for _ in 0..self.budget {
            match self.serial.read() {
                Ok(byte) => return Ok(byte),
                Err(nb::Error::WouldBlock) => {}
                // Framing and overrun errors count as an idle poll
                Err(nb::Error::Other(_)) => log::warn!("serial receive error"),
            }
        }
        Err(ProtocolError::Timeout)
    }
}

/// `ufmt` sink writing straight to a [`Transport`].
pub struct Writer<'a, T: Transport>(pub &'a mut T);

impl<T: Transport> ufmt::uWrite for Writer<'_, T> {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> core::result::Result<(), Self::Error> {
        self.0.send_all(s.as_bytes());
        Ok(())
    }
}

/// Sends the Bluetooth module setup lines.
pub fn announce<T: Transport>(transport: &mut T, lines: &[&[u8]]) {
    for line in lines {
        transport.send_all(line);
    }
}
