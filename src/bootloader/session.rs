//! State carried between commands of one bootloader session

use crate::config::BUFFER_SIZE;
use crate::drivers::FlashAddress;
use crate::protocol::MEMTYPE_EEPROM;

/// Memory a block command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    Flash,
    Eeprom,
}

impl MemoryKind {
    pub fn from_byte(byte: u8) -> Self {
        if byte == MEMTYPE_EEPROM {
            MemoryKind::Eeprom
        } else {
            MemoryKind::Flash
        }
    }
}

/// Header of a `d` or `t` command: big-endian byte count, then memory kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRequest {
    pub length: u16,
    pub kind: MemoryKind,
}

impl BlockRequest {
    pub fn parse(header: [u8; 3]) -> Self {
        Self {
            length: u16::from_be_bytes([header[0], header[1]]),
            kind: MemoryKind::from_byte(header[2]),
        }
    }
}

pub struct Session {
    /// Word address for flash, byte address for EEPROM. Only `U` changes it.
    pub(crate) address: u16,
    /// Where the last flash write stopped inside a page it had erased
    pub(crate) resume: Option<FlashAddress>,
    pub(crate) buffer: [u8; BUFFER_SIZE],
}

impl Session {
    pub const fn new() -> Self {
        Self {
            address: 0,
            resume: None,
            buffer: [0; BUFFER_SIZE],
        }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn set_address(&mut self, low: u8, high: u8) {
        self.address = u16::from_le_bytes([low, high]);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
