//! Simulated hardware for host tests

use crate::chip::Chip;
use crate::diagnostics::MonitorPort;
use crate::drivers::{Eeprom, FlashAddress, SelfProgram};
use crate::protocol::{ProtocolError, Result, Transport};
use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::serial;
use std::collections::{BTreeMap, VecDeque};
use std::vec;
use std::vec::Vec;

const FLASH_BYTES: usize = 0x2_0000;
const EEPROM_BYTES: usize = 0x1000;

/// Flash and EEPROM of an imaginary part.
///
/// Behaves like the real self-programming unit where it matters to the
/// drivers: words go through a page buffer, a page write can only clear
/// bits, erase sets a page to 0xFF, and the section is unreadable between an
/// erase or write and the read re-enable. Misuse panics.
pub struct SimNvm {
    pub flash: Vec<u8>,
    pub eeprom: Vec<u8>,
    page_bytes: u32,
    page_buffer: Vec<u16>,
    rww_busy: bool,
    eeprom_busy: bool,
    pub interrupts_enabled: bool,
    pub critical_sections: usize,
    /// Linear start address of every page erased, in order
    pub erased_pages: Vec<u32>,
    pub words_loaded: usize,
    pub commits: usize,
    /// Linear start address of every page written, in order
    pub committed_pages: Vec<u32>,
    pub eeprom_writes: usize,
}

impl SimNvm {
    pub fn new<C: Chip>() -> Self {
        Self {
            flash: vec![0xFF; FLASH_BYTES],
            eeprom: vec![0xFF; EEPROM_BYTES],
            page_bytes: C::PAGE_BYTES as u32,
            page_buffer: vec![0xFFFF; C::PAGE_WORDS as usize],
            rww_busy: false,
            eeprom_busy: false,
            interrupts_enabled: true,
            critical_sections: 0,
            erased_pages: Vec::new(),
            words_loaded: 0,
            commits: 0,
            committed_pages: Vec::new(),
            eeprom_writes: 0,
        }
    }

    pub fn fill_flash(&mut self, value: u8) {
        self.flash.fill(value);
    }

    /// Erase and write expect the page start in Z, the m163 needs Z6:Z1 clear
    fn page_start(&self, address: FlashAddress, op: &str) -> usize {
        let linear = address.linear();
        assert_eq!(linear & (self.page_bytes - 1), 0, "{op} at {linear:#x}, not a page start");
        linear as usize
    }

    fn assert_programmable(&self, op: &str) {
        assert!(!self.interrupts_enabled, "{op} with interrupts enabled");
    }
}

impl SelfProgram for SimNvm {
    fn interrupt_free<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        assert!(self.interrupts_enabled, "nested critical section");
        self.interrupts_enabled = false;
        self.critical_sections += 1;
        let result = f(self);
        self.interrupts_enabled = true;
        result
    }

    fn wait_idle(&mut self) {
        self.eeprom_busy = false;
    }

    fn erase_page(&mut self, address: FlashAddress) {
        self.assert_programmable("erase");
        assert!(!self.eeprom_busy, "erase during EEPROM write");
        let start = self.page_start(address, "erase");
        self.flash[start..start + self.page_bytes as usize].fill(0xFF);
        self.erased_pages.push(start as u32);
        self.rww_busy = true;
    }

    fn load_word(&mut self, address: FlashAddress, word: u16) {
        self.assert_programmable("load");
        let index = (address.linear() >> 1) as usize & (self.page_buffer.len() - 1);
        self.page_buffer[index] = word;
        self.words_loaded += 1;
    }

    fn commit_page(&mut self, address: FlashAddress) {
        self.assert_programmable("commit");
        let start = self.page_start(address, "commit");
        for (i, word) in self.page_buffer.iter_mut().enumerate() {
            let [low, high] = word.to_le_bytes();
            self.flash[start + 2 * i] &= low;
            self.flash[start + 2 * i + 1] &= high;
            *word = 0xFFFF;
        }
        self.commits += 1;
        self.committed_pages.push(start as u32);
        self.rww_busy = true;
    }

    fn reenable_read(&mut self, _address: FlashAddress) {
        self.rww_busy = false;
    }

    fn read_byte(&mut self, address: FlashAddress) -> u8 {
        assert!(!self.rww_busy, "flash read before read re-enable");
        self.flash[address.linear() as usize]
    }
}

impl Eeprom for SimNvm {
    fn wait_ready(&mut self) {
        self.eeprom_busy = false;
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        assert!(!self.eeprom_busy, "EEPROM write while busy");
        self.eeprom[address as usize % EEPROM_BYTES] = value;
        self.eeprom_busy = true;
        self.eeprom_writes += 1;
    }

    fn read_byte(&mut self, address: u16) -> u8 {
        assert!(!self.eeprom_busy, "EEPROM read while busy");
        self.eeprom[address as usize % EEPROM_BYTES]
    }
}

/// Scripted host on the other end of the wire.
///
/// Hands out queued bytes and records everything sent back. Once the script
/// runs dry it reports a timeout; any transport use after that panics, since
/// the bootloader must be gone by then.
#[derive(Default)]
pub struct HostLink {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    timeouts: usize,
}

impl HostLink {
    pub fn new(script: &[u8]) -> Self {
        Self {
            rx: script.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> &[u8] {
        &self.tx
    }

    /// Returns and forgets everything sent so far.
    pub fn take_sent(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    pub fn timed_out(&self) -> bool {
        self.timeouts > 0
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Transport for HostLink {
    fn send_byte(&mut self, byte: u8) {
        assert!(!self.timed_out(), "sent {byte:#04x} after timeout");
        self.tx.push(byte);
    }

    fn receive_byte(&mut self) -> Result<u8> {
        assert!(!self.timed_out(), "receive after timeout");
        match self.rx.pop_front() {
            Some(byte) => Ok(byte),
            None => {
                self.timeouts += 1;
                Err(ProtocolError::Timeout)
            }
        }
    }
}

/// Serial port with nothing ever arriving.
#[derive(Default)]
pub struct StalledSerial {
    pub polls: u32,
}

impl serial::Read<u8> for StalledSerial {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.polls += 1;
        Err(nb::Error::WouldBlock)
    }
}

impl serial::Write<u8> for StalledSerial {
    type Error = Infallible;

    fn write(&mut self, _word: u8) -> nb::Result<(), Self::Error> {
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// LED and data space behind the monitor.
#[derive(Default)]
pub struct SimMonitor {
    pub lit: bool,
    pub memory: BTreeMap<u16, u8>,
}

impl MonitorPort for SimMonitor {
    fn indicator_on(&mut self) {
        self.lit = true;
    }

    fn toggle_indicator(&mut self) -> bool {
        self.lit = !self.lit;
        self.lit
    }

    fn peek(&mut self, address: u16) -> u8 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    fn poke(&mut self, address: u16, value: u8) {
        self.memory.insert(address, value);
    }
}

/// Output pin counting its rising edges.
#[derive(Default)]
pub struct CountingPin {
    pub high: bool,
    pub pulses: usize,
}

impl OutputPin for CountingPin {
    type Error = Infallible;

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        if !self.high {
            self.pulses += 1;
        }
        self.high = true;
        Ok(())
    }

    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }
}
