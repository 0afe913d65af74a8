use core::arch::asm;

use embedded_hal::blocking::delay::DelayMs;

use crate::config::CPU_FREQ_HZ;

// Loop body below: nop, decrement, compare, branch
const CYCLES_PER_ITERATION: u32 = 6;
const ITERATIONS_PER_MS: u32 = CPU_FREQ_HZ / 1000 / CYCLES_PER_ITERATION;

/// Calibrated spin loop. Only roughly accurate, which is all the entry blink
/// needs.
pub struct BusyDelay;

impl DelayMs<u16> for BusyDelay {
    fn delay_ms(&mut self, ms: u16) {
        for _ in 0..ms {
            let mut n = ITERATIONS_PER_MS;
            while n > 0 {
                unsafe { asm!("nop") };
                n -= 1;
            }
        }
    }
}
