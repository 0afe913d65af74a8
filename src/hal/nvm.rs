//! Self-programming and EEPROM access
//!
//! `spm` has to follow the SPMCSR write within four cycles, so each command is
//! issued from a single asm block that stores through X. On parts with more
//! than 64 KiB of flash the bank goes into RAMPZ before every `spm` and `elpm`.

use core::arch::asm;

use crate::drivers::{Eeprom, FlashAddress, SelfProgram};

const SPMEN: u8 = 0x01;
const PGERS: u8 = 0x03;
const PGWRT: u8 = 0x05;
const RWWSRE: u8 = 0x11;

const EERE: u8 = 1 << 0;
const EEPE: u8 = 1 << 1;
const EEMPE: u8 = 1 << 2;

#[cfg(device_pac)]
const SPM_PADDING: bool = false;
#[cfg(not(device_pac))]
const SPM_PADDING: bool = super::raw::LAYOUT.spm_padding;

#[cfg(device_pac)]
mod regs {
    use core::ptr::addr_of;

    use super::EERE;
    use crate::hal::pac;

    macro_rules! spm_register {
        ($periph:ident, $reg:ident) => {
            pub fn spm_status() -> u8 {
                unsafe { (*pac::$periph::ptr()).$reg.read().bits() }
            }

            /// Data-space address for the timed store
            pub fn spm_control() -> u16 {
                unsafe { addr_of!((*pac::$periph::ptr()).$reg) as u16 }
            }
        };
    }

    #[cfg(any(avr_pac = "atmega128a", avr_pac = "atmega64"))]
    spm_register!(BOOT_LOAD, spmcsr);
    #[cfg(avr_pac = "atmega8")]
    spm_register!(BOOT_LOAD, spmcr);
    #[cfg(any(avr_pac = "atmega328p", avr_pac = "atmega168"))]
    spm_register!(CPU, spmcsr);

    #[cfg(avr_pac = "atmega128a")]
    pub fn select_bank(bank: u8) {
        unsafe { (*pac::CPU::ptr()).rampz.write(|w| w.bits(bank)) }
    }

    pub fn eeprom_status() -> u8 {
        unsafe { (*pac::EEPROM::ptr()).eecr.read().bits() }
    }

    pub fn eeprom_control() -> u16 {
        unsafe { addr_of!((*pac::EEPROM::ptr()).eecr) as u16 }
    }

    pub fn set_eeprom_address(address: u16) {
        unsafe { (*pac::EEPROM::ptr()).eear.write(|w| w.bits(address)) }
    }

    pub fn set_eeprom_data(value: u8) {
        unsafe { (*pac::EEPROM::ptr()).eedr.write(|w| w.bits(value)) }
    }

    pub fn eeprom_read() -> u8 {
        unsafe {
            let eeprom = &*pac::EEPROM::ptr();
            eeprom.eecr.modify(|r, w| w.bits(r.bits() | EERE));
            eeprom.eedr.read().bits()
        }
    }
}

#[cfg(not(device_pac))]
mod regs {
    use super::EERE;
    use crate::hal::raw::{self, LAYOUT};

    pub fn spm_status() -> u8 {
        unsafe { raw::read(LAYOUT.spmcsr) }
    }

    pub fn spm_control() -> u16 {
        LAYOUT.spmcsr
    }

    pub fn eeprom_status() -> u8 {
        unsafe { raw::read(LAYOUT.eecr) }
    }

    pub fn eeprom_control() -> u16 {
        LAYOUT.eecr
    }

    pub fn set_eeprom_address(address: u16) {
        let [low, high] = address.to_le_bytes();
        unsafe {
            raw::write(LAYOUT.eearh, high);
            raw::write(LAYOUT.eearl, low);
        }
    }

    pub fn set_eeprom_data(value: u8) {
        unsafe { raw::write(LAYOUT.eedr, value) }
    }

    pub fn eeprom_read() -> u8 {
        unsafe {
            raw::modify(LAYOUT.eecr, |eecr| eecr | EERE);
            raw::read(LAYOUT.eedr)
        }
    }
}

/// Flash and EEPROM of the running part.
pub struct Nvm {
    _private: (),
}

impl Nvm {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn spm_busy(&self) -> bool {
        regs::spm_status() & SPMEN != 0
    }

    fn eeprom_busy(&self) -> bool {
        regs::eeprom_status() & EEPE != 0
    }

    #[inline(always)]
    fn select_bank(&self, _address: FlashAddress) {
        #[cfg(avr_pac = "atmega128a")]
        regs::select_bank(_address.bank);
    }

    fn spm(&mut self, command: u8, address: FlashAddress) {
        while self.spm_busy() {}
        self.select_bank(address);
        let control = regs::spm_control();
        unsafe {
            if SPM_PADDING {
                asm!(
                    "st X, {command}",
                    "spm",
                    ".word 0xFFFF",
                    "nop",
                    command = in(reg) command,
                    in("X") control,
                    in("Z") address.offset,
                );
            } else {
                asm!(
                    "st X, {command}",
                    "spm",
                    command = in(reg) command,
                    in("X") control,
                    in("Z") address.offset,
                );
            }
        }
    }
}

impl Default for Nvm {
    fn default() -> Self {
        Self::new()
    }
}

impl SelfProgram for Nvm {
    fn interrupt_free<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        avr_device::interrupt::free(|_| f(self))
    }

    fn wait_idle(&mut self) {
        while self.eeprom_busy() || self.spm_busy() {}
    }

    fn erase_page(&mut self, address: FlashAddress) {
        self.spm(PGERS, address);
    }

    fn load_word(&mut self, address: FlashAddress, word: u16) {
        let [low, high] = word.to_le_bytes();
        while self.spm_busy() {}
        self.select_bank(address);
        let control = regs::spm_control();
        // r1:r0 carry the word; r1 is the zero register and is cleared after
        unsafe {
            if SPM_PADDING {
                asm!(
                    "mov r0, {low}",
                    "mov r1, {high}",
                    "st X, {command}",
                    "spm",
                    ".word 0xFFFF",
                    "nop",
                    "clr r1",
                    low = in(reg) low,
                    high = in(reg) high,
                    command = in(reg) SPMEN,
                    in("X") control,
                    in("Z") address.offset,
                );
            } else {
                asm!(
                    "mov r0, {low}",
                    "mov r1, {high}",
                    "st X, {command}",
                    "spm",
                    "clr r1",
                    low = in(reg) low,
                    high = in(reg) high,
                    command = in(reg) SPMEN,
                    in("X") control,
                    in("Z") address.offset,
                );
            }
        }
    }

    fn commit_page(&mut self, address: FlashAddress) {
        self.spm(PGWRT, address);
    }

    fn reenable_read(&mut self, address: FlashAddress) {
        self.spm(RWWSRE, address);
        while self.spm_busy() {}
    }

    fn read_byte(&mut self, address: FlashAddress) -> u8 {
        let byte: u8;
        #[cfg(avr_pac = "atmega128a")]
        unsafe {
            regs::select_bank(address.bank);
            asm!("elpm {byte}, Z", byte = out(reg) byte, in("Z") address.offset);
        }
        #[cfg(not(avr_pac = "atmega128a"))]
        unsafe {
            asm!("lpm {byte}, Z", byte = out(reg) byte, in("Z") address.offset);
        }
        byte
    }
}

impl Eeprom for Nvm {
    fn wait_ready(&mut self) {
        while self.eeprom_busy() {}
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        regs::set_eeprom_address(address);
        regs::set_eeprom_data(value);
        let control = regs::eeprom_control();
        // Master enable, then enable within four cycles
        avr_device::interrupt::free(|_| unsafe {
            asm!(
                "st X, {master}",
                "st X, {enable}",
                master = in(reg) EEMPE,
                enable = in(reg) EEMPE | EEPE,
                in("X") control,
            );
        });
    }

    fn read_byte(&mut self, address: u16) -> u8 {
        regs::set_eeprom_address(address);
        regs::eeprom_read()
    }
}
