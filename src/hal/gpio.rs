use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

#[cfg(device_pac)]
use super::pac;
#[cfg(not(device_pac))]
use super::raw::{self, LAYOUT};

pub struct Input;
pub struct Output;

/// PINx, DDRx and PORTx of one port.
pub trait PortRegisters {
    fn pin() -> u8;
    fn port() -> u8;
    fn modify_ddr(f: impl FnOnce(u8) -> u8);
    fn modify_port(f: impl FnOnce(u8) -> u8);
}

#[cfg(device_pac)]
macro_rules! port {
    ($name:ident, $periph:ident, $pin:ident, $ddr:ident, $port:ident) => {
        pub struct $name;

        impl PortRegisters for $name {
            fn pin() -> u8 {
                unsafe { (*pac::$periph::ptr()).$pin.read().bits() }
            }

            fn port() -> u8 {
                unsafe { (*pac::$periph::ptr()).$port.read().bits() }
            }

            fn modify_ddr(f: impl FnOnce(u8) -> u8) {
                unsafe { (*pac::$periph::ptr()).$ddr.modify(|r, w| w.bits(f(r.bits()))) }
            }

            fn modify_port(f: impl FnOnce(u8) -> u8) {
                unsafe { (*pac::$periph::ptr()).$port.modify(|r, w| w.bits(f(r.bits()))) }
            }
        }
    };
}

#[cfg(not(device_pac))]
macro_rules! port {
    ($name:ident, $pin:ident, $ddr:ident, $port:ident) => {
        pub struct $name;

        impl PortRegisters for $name {
            fn pin() -> u8 {
                unsafe { raw::read(LAYOUT.$pin) }
            }

            fn port() -> u8 {
                unsafe { raw::read(LAYOUT.$port) }
            }

            fn modify_ddr(f: impl FnOnce(u8) -> u8) {
                unsafe { raw::modify(LAYOUT.$ddr, f) }
            }

            fn modify_port(f: impl FnOnce(u8) -> u8) {
                unsafe { raw::modify(LAYOUT.$port, f) }
            }
        }
    };
}

#[cfg(device_pac)]
port!(PortB, PORTB, pinb, ddrb, portb);
#[cfg(all(device_pac, not(avr_chip = "atmega128")))]
port!(PortD, PORTD, pind, ddrd, portd);
#[cfg(avr_chip = "atmega128")]
port!(PortF, PORTF, pinf, ddrf, portf);

#[cfg(not(device_pac))]
port!(PortB, pinb, ddrb, portb);
#[cfg(not(device_pac))]
port!(PortD, pind, ddrd, portd);

#[derive(Debug)]
pub struct Pin<PORT, const P: u8, MODE> {
    _port: PhantomData<PORT>,
    _mode: PhantomData<MODE>,
}

impl<PORT: PortRegisters, const P: u8> Pin<PORT, P, Input> {
    /// Input with the pull-up on. Pins come out of reset as inputs, so this
    /// is the only way to obtain one.
    pub fn pull_up() -> Self {
        PORT::modify_ddr(|ddr| ddr & !(1 << P));
        PORT::modify_port(|port| port | (1 << P));
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

impl<PORT: PortRegisters, const P: u8> Pin<PORT, P, Output> {
    /// Output driven low.
    pub fn output() -> Self {
        PORT::modify_port(|port| port & !(1 << P));
        PORT::modify_ddr(|ddr| ddr | (1 << P));
        Pin {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

impl<PORT: PortRegisters, const P: u8> OutputPin for Pin<PORT, P, Output> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        PORT::modify_port(|port| port | (1 << P));
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        PORT::modify_port(|port| port & !(1 << P));
        Ok(())
    }
}

impl<PORT: PortRegisters, const P: u8> StatefulOutputPin for Pin<PORT, P, Output> {
    fn is_set_high(&self) -> Result<bool, Infallible> {
        Ok(PORT::port() & (1 << P) != 0)
    }

    fn is_set_low(&self) -> Result<bool, Infallible> {
        self.is_set_high().map(|high| !high)
    }
}

impl<PORT: PortRegisters, const P: u8> ToggleableOutputPin for Pin<PORT, P, Output> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Infallible> {
        PORT::modify_port(|port| port ^ (1 << P));
        Ok(())
    }
}

impl<PORT: PortRegisters, const P: u8> InputPin for Pin<PORT, P, Input> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(PORT::pin() & (1 << P) != 0)
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

/// Entry pins and indicator LED of the supported boards
pub mod board {
    use super::*;

    #[cfg(avr_chip = "atmega128")]
    pub type Entry0 = Pin<PortF, 7, Input>;
    #[cfg(avr_chip = "atmega128")]
    pub type Entry1 = Pin<PortF, 6, Input>;
    #[cfg(avr_chip = "atmega128")]
    pub type Led = Pin<PortB, 7, Output>;

    #[cfg(not(avr_chip = "atmega128"))]
    pub type Entry0 = Pin<PortD, 6, Input>;
    #[cfg(not(avr_chip = "atmega128"))]
    pub type Led = Pin<PortB, 5, Output>;
}
