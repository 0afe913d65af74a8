//! STK500v1 serial bootloader for megaAVR parts.
//!
//! The protocol engine ([`bootloader::Bootloader`]) talks to the host through
//! a [`protocol::Transport`] and to memory through the
//! [`drivers::SelfProgram`] and [`drivers::Eeprom`] capabilities, so it runs
//! unchanged on the device and against the simulators in host tests. The
//! register-level adapters live in `hal` and only exist on AVR builds.
#![no_std]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

#[cfg(test)]
extern crate std;

pub mod bootloader;
pub mod chip;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod protocol;
/// Chip features the crate can be built for
pub mod targets;

#[cfg(target_arch = "avr")]
pub mod hal;

#[cfg(test)]
mod testing;
