//! Non-volatile memory drivers
//!
//! The page-walking and byte-writing algorithms live here and only talk to
//! the hardware through [`SelfProgram`] and [`Eeprom`]. The AVR adapter in
//! `hal::nvm` implements both with `spm`/`lpm` and the EEPROM registers; tests
//! use the simulator in `testing`.

pub mod eeprom;
pub mod flash;

use crate::chip::Chip;

/// Byte location in program memory.
///
/// `offset` is what goes into the Z pointer; `bank` is the RAMPZ value and is
/// only ever non-zero on parts with extended flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashAddress {
    pub bank: u8,
    pub offset: u16,
}

impl FlashAddress {
    /// Converts a protocol word address to a byte location.
    ///
    /// Word addresses from 0x8000 up lie in the second 64 KiB bank, which
    /// only exists when `extended` is set.
    pub fn from_word(word: u16, extended: bool) -> Self {
        let bank = if extended && word & 0x8000 != 0 { 1 } else { 0 };
        Self { bank, offset: word << 1 }
    }

    pub fn from_linear(linear: u32) -> Self {
        Self {
            bank: (linear >> 16) as u8,
            offset: linear as u16,
        }
    }

    pub fn linear(self) -> u32 {
        (self.bank as u32) << 16 | self.offset as u32
    }

    /// Advances by `bytes`, carrying into the next bank.
    pub fn add(self, bytes: u32) -> Self {
        Self::from_linear(self.linear().wrapping_add(bytes))
    }

    /// Index of the word within its flash page
    pub fn word_in_page<C: Chip>(self) -> u16 {
        ((self.linear() >> 1) as u16) & (C::PAGE_WORDS - 1)
    }

    /// Start of the page containing this address
    pub fn page<C: Chip>(self) -> Self {
        Self::from_linear(self.linear() & !(C::PAGE_BYTES as u32 - 1))
    }
}

/// Self-programming capability of a part's flash.
///
/// Each operation waits for the previous one to finish before it starts.
/// Erase, load and commit must only run inside [`SelfProgram::interrupt_free`].
pub trait SelfProgram {
    /// Runs `f` with interrupts disabled.
    fn interrupt_free<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized;

    /// Waits until no self-programming or EEPROM write is in progress.
    fn wait_idle(&mut self);

    /// Erases the page starting at `address`.
    fn erase_page(&mut self, address: FlashAddress);

    /// Puts a little-endian word into the hardware page buffer.
    fn load_word(&mut self, address: FlashAddress, word: u16);

    /// Writes the hardware page buffer to the page starting at `address`.
    fn commit_page(&mut self, address: FlashAddress);

    /// Makes the read-while-write section readable again after an erase or
    /// write.
    fn reenable_read(&mut self, address: FlashAddress);

    fn read_byte(&mut self, address: FlashAddress) -> u8;
}

/// Byte-addressed EEPROM.
pub trait Eeprom {
    /// Waits for a pending write to finish.
    fn wait_ready(&mut self);

    /// Starts a single byte program cycle.
    fn write_byte(&mut self, address: u16, value: u8);

    fn read_byte(&mut self, address: u16) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{Atmega128, Atmega168};

    #[test]
    fn word_addresses_double() {
        let addr = FlashAddress::from_word(0x0010, false);
        assert_eq!(addr, FlashAddress { bank: 0, offset: 0x0020 });
    }

    #[test]
    fn high_words_select_bank_one_on_extended_parts() {
        let addr = FlashAddress::from_word(0x8010, true);
        assert_eq!(addr, FlashAddress { bank: 1, offset: 0x0020 });
        assert_eq!(addr.linear(), 0x1_0020);

        let plain = FlashAddress::from_word(0x8010, false);
        assert_eq!(plain.bank, 0);
    }

    #[test]
    fn add_carries_into_next_bank() {
        let addr = FlashAddress { bank: 0, offset: 0xFFFE };
        assert_eq!(addr.add(2), FlashAddress { bank: 1, offset: 0 });
    }

    #[test]
    fn page_geometry() {
        // 64 word pages
        let addr = FlashAddress::from_word(0x0045, false);
        assert_eq!(addr.word_in_page::<Atmega168>(), 5);
        assert_eq!(addr.page::<Atmega168>(), FlashAddress::from_word(0x0040, false));

        // 128 word pages, bank 1
        let addr = FlashAddress::from_word(0x80FF, true);
        assert_eq!(addr.word_in_page::<Atmega128>(), 127);
        assert_eq!(addr.page::<Atmega128>(), FlashAddress { bank: 1, offset: 0x0100 });
    }
}
