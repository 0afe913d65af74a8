//! EEPROM byte programming

use super::Eeprom;

/// Writes `data` one byte at a time from `start`, waiting out each cycle.
pub fn program<E: Eeprom>(eeprom: &mut E, start: u16, data: &[u8]) {
    let mut address = start;
    for &byte in data {
        eeprom.wait_ready();
        eeprom.write_byte(address, byte);
        address = address.wrapping_add(1);
    }
}

/// Streams `len` bytes from `start` into `sink`.
pub fn read<E, S>(eeprom: &mut E, start: u16, len: u16, mut sink: S)
where
    E: Eeprom,
    S: FnMut(u8),
{
    let mut address = start;
    for _ in 0..len {
        eeprom.wait_ready();
        sink(eeprom.read_byte(address));
        address = address.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Atmega168;
    use crate::testing::SimNvm;
    use std::vec::Vec;

    #[test]
    fn single_byte_reads_back() {
        let mut nvm = SimNvm::new::<Atmega168>();
        program(&mut nvm, 0x0042, &[0x5A]);

        let mut out = Vec::new();
        read(&mut nvm, 0x0042, 1, |b| out.push(b));
        assert_eq!(out, [0x5A]);
    }

    #[test]
    fn each_byte_waits_for_the_last() {
        let mut nvm = SimNvm::new::<Atmega168>();
        program(&mut nvm, 0x0100, b"config");

        // The simulator panics on a write while one is still pending
        assert_eq!(nvm.eeprom_writes, 6);
        assert_eq!(&nvm.eeprom[0x100..0x106], b"config");
    }

    #[test]
    fn leaves_neighbours_alone() {
        let mut nvm = SimNvm::new::<Atmega168>();
        program(&mut nvm, 0x0010, &[1, 2, 3]);

        assert_eq!(nvm.eeprom[0x000F], 0xFF);
        assert_eq!(nvm.eeprom[0x0013], 0xFF);
    }

    #[test]
    fn block_read_walks_forward() {
        let mut nvm = SimNvm::new::<Atmega168>();
        nvm.eeprom[0x0200..0x0205].copy_from_slice(&[9, 8, 7, 6, 5]);

        let mut out = Vec::new();
        read(&mut nvm, 0x0200, 5, |b| out.push(b));
        assert_eq!(out, [9, 8, 7, 6, 5]);

        out.clear();
        read(&mut nvm, 0x0202, 2, |b| out.push(b));
        assert_eq!(out, [7, 6]);
    }
}
