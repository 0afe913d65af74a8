//! Interactive monitor reached with `!!!`
//!
//! A terminal-friendly command set for bringing up boards: toggle the LED,
//! peek and poke data memory in hex, echo the line, or start the application.
//! Only built into parts whose boot block has room for it.

use crate::bootloader::Flow;
use crate::protocol::{Result, Transport, Writer};

const PROMPT: &[u8] = b"\n\r: ";

/// Board resources the monitor drives.
pub trait MonitorPort {
    fn indicator_on(&mut self);

    /// Flips the indicator, returns whether it is now lit.
    fn toggle_indicator(&mut self) -> bool;

    /// Reads a byte from the data address space.
    fn peek(&mut self, address: u16) -> u8;

    /// Writes a byte to the data address space.
    fn poke(&mut self, address: u16, value: u8);
}

/// Stand-in port for parts built without the monitor.
#[derive(Debug, Clone, Copy)]
pub enum NoMonitor {}

impl MonitorPort for NoMonitor {
    fn indicator_on(&mut self) {
        match *self {}
    }

    fn toggle_indicator(&mut self) -> bool {
        match *self {}
    }

    fn peek(&mut self, _address: u16) -> u8 {
        match *self {}
    }

    fn poke(&mut self, _address: u16, _value: u8) {
        match *self {}
    }
}

/// Runs the monitor until the host asks for the application or goes away.
pub fn run<T, P>(transport: &mut T, port: &mut P) -> Result<Flow>
where
    T: Transport,
    P: MonitorPort,
{
    port.indicator_on();
    {
        let mut banner = Writer(&mut *transport);
        ufmt::uwrite!(
            banner,
            "{} {} monitor\n\r",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )
        .ok();
    }

    loop {
        transport.send_all(PROMPT);
        let command = transport.receive_byte()?;
        transport.send_byte(command);

        match command {
            b't' => {
                let lit = port.toggle_indicator();
                transport.send_byte(if lit { b'1' } else { b'0' });
            }
            b'r' => {
                echo(transport)?;
                let address = hex_address(transport)?;
                transport.send_byte(b'=');
                put_hex(transport, port.peek(address));
            }
            b'w' => {
                echo(transport)?;
                let address = hex_address(transport)?;
                echo(transport)?;
                let value = get_hex(transport)?;
                port.poke(address, value);
            }
            b'u' => loop {
                let byte = transport.receive_byte()?;
                transport.send_byte(byte);
            },
            b'j' => return Ok(Flow::RunApplication),
            _ => {}
        }
    }
}

fn echo<T: Transport>(transport: &mut T) -> Result<u8> {
    let byte = transport.receive_byte()?;
    transport.send_byte(byte);
    Ok(byte)
}

fn hex_address<T: Transport>(transport: &mut T) -> Result<u16> {
    let high = get_hex(transport)?;
    let low = get_hex(transport)?;
    Ok(u16::from_be_bytes([high, low]))
}

/// Reads two echoed hex digits.
fn get_hex<T: Transport>(transport: &mut T) -> Result<u8> {
    let high = echo(transport)?;
    let low = echo(transport)?;
    Ok(nibble(high) << 4 | nibble(low))
}

// Garbage in, garbage out: non-digits are not rejected
fn nibble(digit: u8) -> u8 {
    match digit {
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => digit.wrapping_sub(b'0') & 0x0F,
    }
}

fn put_hex<T: Transport>(transport: &mut T, value: u8) {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    transport.send_byte(DIGITS[(value >> 4) as usize]);
    transport.send_byte(DIGITS[(value & 0x0F) as usize]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolError;
    use crate::testing::{HostLink, SimMonitor};
    use std::vec::Vec;

    fn session(script: &[u8]) -> (Result<Flow>, HostLink, SimMonitor) {
        let mut link = HostLink::new(script);
        let mut port = SimMonitor::default();
        let result = run(&mut link, &mut port);
        (result, link, port)
    }

    fn banner() -> Vec<u8> {
        let mut text = Vec::new();
        text.extend_from_slice(env!("CARGO_PKG_NAME").as_bytes());
        text.push(b' ');
        text.extend_from_slice(env!("CARGO_PKG_VERSION").as_bytes());
        text.extend_from_slice(b" monitor\n\r");
        text
    }

    #[test]
    fn greets_and_lights_the_led() {
        let (result, link, port) = session(b"j");

        assert_eq!(result, Ok(Flow::RunApplication));
        assert!(port.lit);
        let mut expected = banner();
        expected.extend_from_slice(b"\n\r: j");
        assert_eq!(link.sent(), &expected[..]);
    }

    #[test]
    fn toggle_reports_new_state() {
        let (_, link, port) = session(b"tt");

        // Lit on entry, off after the first toggle, lit again after the second
        assert!(port.lit);
        assert!(link.sent().ends_with(b"\n\r: t0\n\r: t1\n\r: "));
    }

    #[test]
    fn reads_memory_as_hex() {
        let mut link = HostLink::new(b"r 01a0");
        let mut port = SimMonitor::default();
        port.poke(0x01A0, 0x3C);

        let result = run(&mut link, &mut port);

        assert_eq!(result, Err(ProtocolError::Timeout));
        assert!(link.sent().ends_with(b"\n\r: r 01a0=3c\n\r: "));
    }

    #[test]
    fn writes_memory_from_hex() {
        let (_, link, port) = session(b"w 0100 5AJ");

        assert_eq!(port.memory.get(&0x0100), Some(&0x5A));
        assert!(link.sent().ends_with(b"w 0100 5A\n\r: J\n\r: "));
    }

    #[test]
    fn echo_mode_lasts_until_timeout() {
        let (result, link, _) = session(b"uhello");

        assert_eq!(result, Err(ProtocolError::Timeout));
        assert!(link.sent().ends_with(b"\n\r: uhello"));
    }

    #[test]
    fn hex_digits() {
        assert_eq!(nibble(b'0'), 0);
        assert_eq!(nibble(b'9'), 9);
        assert_eq!(nibble(b'a'), 10);
        assert_eq!(nibble(b'F'), 15);
    }
}
