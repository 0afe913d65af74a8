//! Build-time configuration for the bootloader

use crate::bootloader::entry::EntryPolicy;

/// CPU frequency in Hz, from `AVR_FREQ` at build time
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

/// UART baud rate, 8N1
pub const UART_BAUD: u32 = 115_200;

/// Baud rate register value, rounded to the nearest divisor
pub const UBRR: u16 = ubrr(CPU_FREQ_HZ, UART_BAUD);

/// Idle receive polls before the host is considered gone
pub const RECEIVE_BUDGET: u32 = CPU_FREQ_HZ >> 1;

/// Reported for parameter 0x80
pub const HW_VER: u8 = 0x02;
/// Reported for parameter 0x81
pub const SW_MAJOR: u8 = 0x01;
/// Reported for parameter 0x82
pub const SW_MINOR: u8 = 0x0f;

/// Sign-on answer to the programmer id request
pub const PROGRAMMER_ID: &[u8; 7] = b"AVR ISP";

/// Staging buffer capacity in bytes
pub const BUFFER_SIZE: usize = 256;

/// Word address of the application reset vector
pub const APP_START: u16 = 0x0000;

/// Value of an erased flash byte
pub const ERASED: u8 = 0xFF;

/// Entry LED blink timing
pub const LED_ON_MS: u16 = 100;
pub const LED_OFF_MS: u16 = 100;

/// Whether the bootloader waits for a host even when an application is present
#[cfg(feature = "auto-reset")]
pub const ENTRY_POLICY: EntryPolicy = EntryPolicy::AlwaysEnter;
#[cfg(not(feature = "auto-reset"))]
pub const ENTRY_POLICY: EntryPolicy = EntryPolicy::PinSelect;

/// Lines sent to an attached Bluetooth module before the command loop
pub const BT_MODULE_SETUP: &[&[u8]] = &[b"SET BT PAGEMODE 3 2000 1\r", b"SET BT ROLE 0 f 7d00\r"];

macro_rules! select_target {
    ($($chip:literal => $profile:ident),+ $(,)?) => {
        $(
            /// Chip family the bootloader is built for
            #[cfg(avr_chip = $chip)]
            pub type Target = crate::chip::$profile;
        )+
    };
}

// build.rs sets exactly one `avr_chip`
select_target! {
    "atmega128" => Atmega128,
    "atmega64" => Atmega64,
    "atmega328p" => Atmega328p,
    "atmega168" => Atmega168,
    "atmega88" => Atmega88,
    "atmega8" => Atmega8,
    "atmega32" => Atmega32,
    "atmega16" => Atmega16,
    "atmega162" => Atmega162,
    "atmega163" => Atmega163,
    "atmega169" => Atmega169,
    "atmega8515" => Atmega8515,
    "atmega8535" => Atmega8535,
}

const fn parse_hz(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        assert!(digit.is_ascii_digit(), "MCU_FREQ_HZ must be decimal");
        value = value * 10 + (digit - b'0') as u32;
        i += 1;
    }
    value
}

const fn ubrr(freq: u32, baud: u32) -> u16 {
    ((freq / 16 + baud / 2) / baud - 1) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frequency() {
        assert_eq!(parse_hz("16000000"), 16_000_000);
        assert_eq!(parse_hz("8000000"), 8_000_000);
    }

    #[test]
    fn baud_divisor_rounds_to_nearest() {
        assert_eq!(ubrr(16_000_000, 115_200), 8);
        assert_eq!(ubrr(16_000_000, 19_200), 51);
        assert_eq!(ubrr(16_000_000, 9_600), 103);
    }

    #[test]
    fn timeout_budget_is_half_the_clock() {
        assert_eq!(RECEIVE_BUDGET, CPU_FREQ_HZ / 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    fn host_debug_builds_keep_logging() {
        assert_ne!(log::STATIC_MAX_LEVEL, log::LevelFilter::Off);
    }
}
