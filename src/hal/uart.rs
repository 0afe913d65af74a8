//! Polled USART driver
//!
//! The bootloader runs with interrupts off, so both directions spin on the
//! status flags. Each USART is its own type; picking one is a compile-time
//! decision once the entry pins have been read.

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_hal::serial;

use crate::config::UBRR;

#[cfg(device_pac)]
use super::pac;
#[cfg(not(device_pac))]
use super::raw::{self, LAYOUT};

const RXC: u8 = 1 << 7;
const UDRE: u8 = 1 << 5;
const RXEN: u8 = 1 << 4;
const TXEN: u8 = 1 << 3;

/// UCSZ1:0 set, no parity, one stop bit
#[cfg(device_pac)]
const FRAME_8N1: u8 = 0x06;
/// URSEL picks UCSRC over UBRRH at the shared address
#[cfg(avr_pac = "atmega8")]
const URSEL: u8 = 1 << 7;

/// Register block of one USART.
pub trait UsartRegisters {
    /// Baud divisor, 8N1, receiver and transmitter on, no interrupts
    fn configure(ubrr: u16);
    /// UCSRA
    fn status() -> u8;
    fn receive() -> u8;
    fn transmit(byte: u8);
}

pub struct Usart0;

#[cfg(avr_chip = "atmega128")]
pub struct Usart1;

// UBRRnH/UBRRnL as separate registers
#[cfg(any(avr_pac = "atmega128a", avr_pac = "atmega64"))]
macro_rules! split_baud_usart {
    ($name:ident, $periph:ident, $udr:ident, $ucsra:ident, $ucsrb:ident, $ucsrc:ident, $ubrrh:ident, $ubrrl:ident) => {
        impl UsartRegisters for $name {
            fn configure(ubrr: u16) {
                let [low, high] = ubrr.to_le_bytes();
                unsafe {
                    let usart = &*pac::$periph::ptr();
                    usart.$ubrrh.write(|w| w.bits(high));
                    usart.$ubrrl.write(|w| w.bits(low));
                    usart.$ucsra.write(|w| w.bits(0));
                    usart.$ucsrc.write(|w| w.bits(FRAME_8N1));
                    usart.$ucsrb.write(|w| w.bits(RXEN | TXEN));
                }
            }

            fn status() -> u8 {
                unsafe { (*pac::$periph::ptr()).$ucsra.read().bits() }
            }

            fn receive() -> u8 {
                unsafe { (*pac::$periph::ptr()).$udr.read().bits() }
            }

            fn transmit(byte: u8) {
                unsafe { (*pac::$periph::ptr()).$udr.write(|w| w.bits(byte)) }
            }
        }
    };
}

#[cfg(any(avr_pac = "atmega128a", avr_pac = "atmega64"))]
split_baud_usart!(Usart0, USART0, udr0, ucsr0a, ucsr0b, ucsr0c, ubrr0h, ubrr0l);
#[cfg(avr_chip = "atmega128")]
split_baud_usart!(Usart1, USART1, udr1, ucsr1a, ucsr1b, ucsr1c, ubrr1h, ubrr1l);

#[cfg(any(avr_pac = "atmega328p", avr_pac = "atmega168"))]
impl UsartRegisters for Usart0 {
    fn configure(ubrr: u16) {
        unsafe {
            let usart = &*pac::USART0::ptr();
            usart.ubrr0.write(|w| w.bits(ubrr));
            usart.ucsr0a.write(|w| w.bits(0));
            usart.ucsr0c.write(|w| w.bits(FRAME_8N1));
            usart.ucsr0b.write(|w| w.bits(RXEN | TXEN));
        }
    }

    fn status() -> u8 {
        unsafe { (*pac::USART0::ptr()).ucsr0a.read().bits() }
    }

    fn receive() -> u8 {
        unsafe { (*pac::USART0::ptr()).udr0.read().bits() }
    }

    fn transmit(byte: u8) {
        unsafe { (*pac::USART0::ptr()).udr0.write(|w| w.bits(byte)) }
    }
}

#[cfg(avr_pac = "atmega8")]
impl UsartRegisters for Usart0 {
    fn configure(ubrr: u16) {
        let [low, high] = ubrr.to_le_bytes();
        unsafe {
            let usart = &*pac::USART::ptr();
            usart.ubrrh().write(|w| w.bits(high & !URSEL));
            usart.ubrrl.write(|w| w.bits(low));
            usart.ucsra.write(|w| w.bits(0));
            usart.ucsrc().write(|w| w.bits(URSEL | FRAME_8N1));
            usart.ucsrb.write(|w| w.bits(RXEN | TXEN));
        }
    }

    fn status() -> u8 {
        unsafe { (*pac::USART::ptr()).ucsra.read().bits() }
    }

    fn receive() -> u8 {
        unsafe { (*pac::USART::ptr()).udr.read().bits() }
    }

    fn transmit(byte: u8) {
        unsafe { (*pac::USART::ptr()).udr.write(|w| w.bits(byte)) }
    }
}

#[cfg(not(device_pac))]
impl UsartRegisters for Usart0 {
    fn configure(ubrr: u16) {
        let [low, high] = ubrr.to_le_bytes();
        // SAFETY: LAYOUT is the register map of the part being built for
        unsafe {
            raw::write(LAYOUT.ubrrh, high & 0x7F);
            raw::write(LAYOUT.ubrrl, low);
            raw::write(LAYOUT.ucsra, 0);
            if let Some(ucsrc) = LAYOUT.ucsrc {
                raw::write(ucsrc, LAYOUT.frame);
            }
            raw::write(LAYOUT.ucsrb, RXEN | TXEN);
        }
    }

    fn status() -> u8 {
        unsafe { raw::read(LAYOUT.ucsra) }
    }

    fn receive() -> u8 {
        unsafe { raw::read(LAYOUT.udr) }
    }

    fn transmit(byte: u8) {
        unsafe { raw::write(LAYOUT.udr, byte) }
    }
}

pub struct Usart<U> {
    _usart: PhantomData<U>,
}

impl<U: UsartRegisters> Usart<U> {
    /// Sets up the USART for [`crate::config::UART_BAUD`] 8N1.
    pub fn new() -> Self {
        U::configure(UBRR);
        Self { _usart: PhantomData }
    }
}

impl<U: UsartRegisters> serial::Read<u8> for Usart<U> {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if U::status() & RXC != 0 {
            Ok(U::receive())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<U: UsartRegisters> serial::Write<u8> for Usart<U> {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        if U::status() & UDRE != 0 {
            U::transmit(byte);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if U::status() & UDRE != 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}
