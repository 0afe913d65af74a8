use std::env;

include!("src/targets.rs");

fn main() {
    // CPU frequency for baud and timeout calculations
    let freq = env::var("AVR_FREQ").unwrap_or_else(|_| "16000000".into());
    if freq.parse::<u32>().is_err() {
        panic!("AVR_FREQ must be a frequency in Hz, got {freq:?}");
    }
    println!("cargo:rustc-env=MCU_FREQ_HZ={freq}");
    println!("cargo:rerun-if-env-changed=AVR_FREQ");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/targets.rs");

    let chips: Vec<_> = CHIPS.iter().map(|(chip, _, _)| format!("\"{chip}\"")).collect();
    let pacs: Vec<_> = CHIPS
        .iter()
        .filter_map(|(_, pac, _)| pac.map(|pac| format!("\"{pac}\"")))
        .collect();
    println!("cargo:rustc-check-cfg=cfg(avr_chip, values({}))", chips.join(", "));
    println!("cargo:rustc-check-cfg=cfg(avr_pac, values({}))", pacs.join(", "));
    println!("cargo:rustc-check-cfg=cfg(device_pac)");

    let target = env::var("TARGET").unwrap_or_default();
    let selected = CHIPS.iter().find(|(chip, _, _)| {
        env::var(format!("CARGO_FEATURE_{}", chip.to_uppercase())).is_ok()
    });
    let (chip, pac, boot_start) = match selected {
        Some(entry) => *entry,
        None if target.contains("avr") => panic!("no chip feature enabled, pick one of the atmega* features"),
        // Host builds without a chip still get a profile for the engine
        None => ("atmega328p", Some("atmega328p"), 0x7800),
    };

    println!("cargo:rustc-cfg=avr_chip=\"{chip}\"");
    if let Some(pac) = pac {
        println!("cargo:rustc-cfg=device_pac");
        println!("cargo:rustc-cfg=avr_pac=\"{pac}\"");
    }

    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-Wl,--section-start=.text={boot_start:#x}");
        println!("cargo:warning=Building bootloader for {chip} at {freq} Hz, boot block {boot_start:#x}");
    }
}
