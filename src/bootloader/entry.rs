//! Power-up decision and the one-way exit to the application

use core::marker::PhantomData;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use super::Exit;
use crate::chip::Chip;
use crate::config::{ERASED, LED_OFF_MS, LED_ON_MS};

/// Serial port the session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartSelect {
    Uart0,
    Uart1,
}

impl UartSelect {
    pub fn index(self) -> u8 {
        match self {
            UartSelect::Uart0 => 0,
            UartSelect::Uart1 => 1,
        }
    }
}

/// Entry pins as sampled once at reset. Pins are pulled up, so asserted
/// means held low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryPins {
    pub uart0: bool,
    pub uart1: bool,
}

impl EntryPins {
    pub fn sample<P0, P1>(uart0: &P0, uart1: &P1) -> Self
    where
        P0: InputPin,
        P1: InputPin,
    {
        Self {
            uart0: matches!(uart0.is_low(), Ok(true)),
            uart1: matches!(uart1.is_low(), Ok(true)),
        }
    }

    /// Single-UART boards have one entry pin.
    pub fn single<P: InputPin>(pin: &P) -> Self {
        Self {
            uart0: matches!(pin.is_low(), Ok(true)),
            uart1: false,
        }
    }

    fn selected<C: Chip>(self) -> Option<UartSelect> {
        if self.uart0 {
            Some(UartSelect::Uart0)
        } else if self.uart1 && C::UARTS > 1 {
            Some(UartSelect::Uart1)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPolicy {
    /// Stay only when an entry pin is held or there is no application
    PinSelect,
    /// Always listen, leave on timeout
    AlwaysEnter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Undecided,
    BootloaderActive(UartSelect),
    RunApplication,
}

/// Decides what to do at reset from the first byte of application flash and
/// the entry pins.
pub fn decide<C: Chip>(app_first_byte: u8, pins: EntryPins, policy: EntryPolicy) -> BootState {
    let selected = pins.selected::<C>();
    let app_present = app_first_byte != ERASED;

    if app_present && selected.is_none() && policy == EntryPolicy::PinSelect {
        return BootState::RunApplication;
    }
    BootState::BootloaderActive(selected.unwrap_or(UartSelect::Uart0))
}

/// Transfers control to the application image. Never returns and leaves the
/// peripherals as they are.
pub trait Jumper {
    fn start_application(&mut self) -> !;
}

pub struct EntryController<C, J> {
    jumper: J,
    state: BootState,
    _chip: PhantomData<C>,
}

impl<C: Chip, J: Jumper> EntryController<C, J> {
    pub fn new(jumper: J) -> Self {
        Self {
            jumper,
            state: BootState::Undecided,
            _chip: PhantomData,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    /// Returns the port to serve, or starts the application right away.
    pub fn power_up(&mut self, app_first_byte: u8, pins: EntryPins, policy: EntryPolicy) -> UartSelect {
        self.state = decide::<C>(app_first_byte, pins, policy);
        match self.state {
            BootState::BootloaderActive(uart) => uart,
            _ => self.leave(Exit::Startup),
        }
    }

    pub fn leave(&mut self, reason: Exit) -> ! {
        log::debug!("starting application: {:?}", reason);
        self.state = BootState::RunApplication;
        self.jumper.start_application()
    }
}

/// Number of LED flashes announcing which port the bootloader listens on.
pub fn entry_flashes<C: Chip>(uart: UartSelect) -> u8 {
    if C::UARTS > 1 {
        4 + uart.index()
    } else {
        3
    }
}

pub fn signal_entry<C, L, D>(led: &mut L, delay: &mut D, uart: UartSelect)
where
    C: Chip,
    L: OutputPin,
    D: DelayMs<u16>,
{
    for _ in 0..entry_flashes::<C>(uart) {
        led.set_high().ok();
        delay.delay_ms(LED_ON_MS);
        led.set_low().ok();
        delay.delay_ms(LED_OFF_MS);
    }
}
