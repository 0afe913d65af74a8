//! Register-level adapters for the AVR target
//!
//! Everything here touches hardware directly and is only compiled for
//! `target_arch = "avr"`. Parts with an `avr-device` crate go through its
//! register blocks; the rest use the [`RegisterLayout`](crate::chip::RegisterLayout)
//! of their chip profile through the unsafe accessors in `raw`.

pub mod delay;
pub mod gpio;
pub mod nvm;
pub mod uart;

use core::arch::asm;
use core::ptr;

use embedded_hal::digital::v2::{OutputPin, StatefulOutputPin, ToggleableOutputPin};

use crate::bootloader::Jumper;
use crate::config::APP_START;
use crate::diagnostics::MonitorPort;

pub use delay::BusyDelay;
pub use gpio::{board, Input, Output, Pin};
pub use nvm::Nvm;
pub use uart::{Usart, Usart0};
#[cfg(avr_chip = "atmega128")]
pub use uart::Usart1;

#[cfg(avr_pac = "atmega128a")]
pub(crate) use avr_device::atmega128a as pac;
#[cfg(avr_pac = "atmega64")]
pub(crate) use avr_device::atmega64 as pac;
#[cfg(avr_pac = "atmega328p")]
pub(crate) use avr_device::atmega328p as pac;
#[cfg(avr_pac = "atmega168")]
pub(crate) use avr_device::atmega168 as pac;
#[cfg(avr_pac = "atmega8")]
pub(crate) use avr_device::atmega8 as pac;

/// Data-space access for parts without a peripheral access crate.
#[cfg(not(device_pac))]
pub(crate) mod raw {
    use core::ptr;

    use crate::chip::{Chip, RegisterLayout};
    use crate::config::Target;

    pub const LAYOUT: RegisterLayout = match <Target as Chip>::REGISTERS {
        Some(layout) => layout,
        None => panic!("chip has neither a device crate nor a register layout"),
    };

    /// # Safety
    ///
    /// `address` must be a readable I/O register of the running part.
    #[inline(always)]
    pub unsafe fn read(address: u16) -> u8 {
        ptr::read_volatile(address as *const u8)
    }

    /// # Safety
    ///
    /// `address` must be a writable I/O register of the running part and the
    /// caller must own the peripheral behind it.
    #[inline(always)]
    pub unsafe fn write(address: u16, value: u8) {
        ptr::write_volatile(address as *mut u8, value)
    }

    /// # Safety
    ///
    /// Same as [`read`] and [`write`].
    #[inline(always)]
    pub unsafe fn modify(address: u16, f: impl FnOnce(u8) -> u8) {
        write(address, f(read(address)));
    }
}

/// Jumps through the application reset vector.
pub struct ResetVector;

impl Jumper for ResetVector {
    fn start_application(&mut self) -> ! {
        unsafe { asm!("ijmp", in("Z") APP_START, options(noreturn)) }
    }
}

/// Indicator LED plus raw data-space access for the monitor.
pub struct BoardMonitor<L> {
    led: L,
}

impl<L> BoardMonitor<L> {
    pub fn new(led: L) -> Self {
        Self { led }
    }
}

impl<L> MonitorPort for BoardMonitor<L>
where
    L: OutputPin + StatefulOutputPin + ToggleableOutputPin,
{
    fn indicator_on(&mut self) {
        self.led.set_high().ok();
    }

    fn toggle_indicator(&mut self) -> bool {
        self.led.toggle().ok();
        matches!(self.led.is_set_high(), Ok(true))
    }

    fn peek(&mut self, address: u16) -> u8 {
        // Operator-chosen address, AVR data space has no faulting accesses
        unsafe { ptr::read_volatile(address as *const u8) }
    }

    fn poke(&mut self, address: u16, value: u8) {
        // Operator-chosen address and value
        unsafe { ptr::write_volatile(address as *mut u8, value) }
    }
}
