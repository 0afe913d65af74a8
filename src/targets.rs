// Also pulled into build.rs with `include!`: plain comments only at the top,
// and nothing outside `core` in non-test code.

/// Cargo feature, `avr-device` module, boot block start as a byte address.
///
/// The start is that of the largest boot section. Earlier entries win when
/// several chip features are enabled.
pub const CHIPS: &[(&str, Option<&str>, u32)] = &[
    ("atmega128", Some("atmega128a"), 0x1E000),
    ("atmega64", Some("atmega64"), 0xE000),
    ("atmega328p", Some("atmega328p"), 0x7800),
    ("atmega168", Some("atmega168"), 0x3800),
    ("atmega88", None, 0x1800),
    ("atmega8", Some("atmega8"), 0x1800),
    ("atmega32", None, 0x7000),
    ("atmega16", None, 0x3800),
    ("atmega162", None, 0x3800),
    ("atmega163", None, 0x3800),
    ("atmega169", None, 0x3800),
    ("atmega8515", None, 0x1800),
    ("atmega8535", None, 0x1800),
];
