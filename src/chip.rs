//! Device profiles for the supported megaAVR families
//!
//! A profile is a zero-sized type carrying everything about a family that the
//! protocol engine needs at compile time. The engine is generic over [`Chip`],
//! so host tests can exercise any family against simulated memory.

/// Compile-time description of a chip family.
pub trait Chip {
    /// Part name, for diagnostics only
    const NAME: &'static str;
    /// Device signature returned by the `u` command
    const SIGNATURE: [u8; 3];
    /// Flash page size in 16-bit words, always a power of two
    const PAGE_WORDS: u16;
    /// Number of USARTs the bootloader can be entered on
    const UARTS: u8;
    /// Flash larger than 64K words' worth of byte addresses, needs RAMPZ
    const EXTENDED_FLASH: bool;
    /// Boot block has room for the `!!!` monitor
    const MONITOR: bool;
    /// Data-space map for parts `avr-device` has no peripheral access crate for
    const REGISTERS: Option<RegisterLayout>;

    /// Page size in bytes
    const PAGE_BYTES: u16 = Self::PAGE_WORDS * 2;
}

/// Atmel is the only manufacturer, first signature byte is always theirs.
pub const ATMEL: u8 = 0x1E;

/// Data-space addresses of the registers the bootloader touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterLayout {
    pub pinb: u16,
    pub ddrb: u16,
    pub portb: u16,
    pub pind: u16,
    pub ddrd: u16,
    pub portd: u16,
    pub udr: u16,
    pub ucsra: u16,
    pub ucsrb: u16,
    /// `None` where the frame format is fixed at 8N1
    pub ucsrc: Option<u16>,
    pub ubrrl: u16,
    pub ubrrh: u16,
    /// 8N1 as written to UCSRC, URSEL included where UCSRC shares its address
    pub frame: u8,
    pub spmcsr: u16,
    pub eecr: u16,
    pub eedr: u16,
    pub eearl: u16,
    pub eearh: u16,
    /// Every `spm` must be followed by `.word 0xFFFF; nop`
    pub spm_padding: bool,
}

/// m88/m169 style: extended I/O USART, ports from 0x23.
pub const MODERN_IO: RegisterLayout = RegisterLayout {
    pinb: 0x23,
    ddrb: 0x24,
    portb: 0x25,
    pind: 0x29,
    ddrd: 0x2A,
    portd: 0x2B,
    udr: 0xC6,
    ucsra: 0xC0,
    ucsrb: 0xC1,
    ucsrc: Some(0xC2),
    ubrrl: 0xC4,
    ubrrh: 0xC5,
    frame: 0x06,
    spmcsr: 0x57,
    eecr: 0x3F,
    eedr: 0x40,
    eearl: 0x41,
    eearh: 0x42,
    spm_padding: false,
};

/// m16/m32 style: USART in low I/O, UBRRH and UCSRC share 0x40.
pub const CLASSIC_IO: RegisterLayout = RegisterLayout {
    pinb: 0x36,
    ddrb: 0x37,
    portb: 0x38,
    pind: 0x30,
    ddrd: 0x31,
    portd: 0x32,
    udr: 0x2C,
    ucsra: 0x2B,
    ucsrb: 0x2A,
    ucsrc: Some(0x40),
    ubrrl: 0x29,
    ubrrh: 0x40,
    frame: 0x86,
    spmcsr: 0x57,
    eecr: 0x3C,
    eedr: 0x3D,
    eearl: 0x3E,
    eearh: 0x3F,
    spm_padding: false,
};

/// The m163 has no UCSRC; 0x40 is UBRRHI alone.
pub const ATMEGA163_IO: RegisterLayout = RegisterLayout {
    ucsrc: None,
    spm_padding: true,
    ..CLASSIC_IO
};

macro_rules! chip {
    ($name:ident, $part:literal, [$sig2:literal, $sig3:literal], $page:literal, uarts: $uarts:literal, extended: $ext:literal, monitor: $mon:literal) => {
        chip!($name, $part, [$sig2, $sig3], $page, uarts: $uarts, extended: $ext, monitor: $mon, registers: None);
    };
    ($name:ident, $part:literal, [$sig2:literal, $sig3:literal], $page:literal, uarts: $uarts:literal, extended: $ext:literal, monitor: $mon:literal, registers: $regs:expr) => {
        #[doc = concat!($part, ", ", stringify!($page), " word pages")]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Chip for $name {
            const NAME: &'static str = $part;
            const SIGNATURE: [u8; 3] = [ATMEL, $sig2, $sig3];
            const PAGE_WORDS: u16 = $page;
            const UARTS: u8 = $uarts;
            const EXTENDED_FLASH: bool = $ext;
            const MONITOR: bool = $mon;
            const REGISTERS: Option<RegisterLayout> = $regs;
        }

        const _: () = assert!(($page as u16).is_power_of_two(), "page size must be a power of two");
    };
}

chip!(Atmega128, "ATmega128", [0x97, 0x02], 128, uarts: 2, extended: true, monitor: true);
chip!(Atmega64, "ATmega64", [0x96, 0x02], 128, uarts: 1, extended: false, monitor: false);
chip!(Atmega32, "ATmega32", [0x95, 0x02], 64, uarts: 1, extended: false, monitor: false, registers: Some(CLASSIC_IO));
chip!(Atmega16, "ATmega16", [0x94, 0x03], 64, uarts: 1, extended: false, monitor: false, registers: Some(CLASSIC_IO));
chip!(Atmega8, "ATmega8", [0x93, 0x07], 32, uarts: 1, extended: false, monitor: false);
chip!(Atmega88, "ATmega88", [0x93, 0x0a], 32, uarts: 1, extended: false, monitor: false, registers: Some(MODERN_IO));
chip!(Atmega168, "ATmega168", [0x94, 0x06], 64, uarts: 1, extended: false, monitor: false);
chip!(Atmega328p, "ATmega328P", [0x95, 0x0f], 64, uarts: 1, extended: false, monitor: false);
chip!(Atmega162, "ATmega162", [0x94, 0x04], 64, uarts: 1, extended: false, monitor: false, registers: Some(CLASSIC_IO));
chip!(Atmega163, "ATmega163", [0x94, 0x02], 64, uarts: 1, extended: false, monitor: false, registers: Some(ATMEGA163_IO));
chip!(Atmega169, "ATmega169", [0x94, 0x05], 64, uarts: 1, extended: false, monitor: false, registers: Some(MODERN_IO));
chip!(Atmega8515, "ATmega8515", [0x93, 0x06], 32, uarts: 1, extended: false, monitor: false, registers: Some(CLASSIC_IO));
chip!(Atmega8535, "ATmega8535", [0x93, 0x08], 32, uarts: 1, extended: false, monitor: false, registers: Some(CLASSIC_IO));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bytes_follow_words() {
        assert_eq!(Atmega128::PAGE_BYTES, 256);
        assert_eq!(Atmega168::PAGE_BYTES, 128);
        assert_eq!(Atmega8::PAGE_BYTES, 64);
    }

    #[test]
    fn only_the_128_has_the_extras() {
        assert!(Atmega128::EXTENDED_FLASH);
        assert!(Atmega128::MONITOR);
        assert_eq!(Atmega128::UARTS, 2);

        assert!(!Atmega328p::EXTENDED_FLASH);
        assert!(!Atmega328p::MONITOR);
        assert_eq!(Atmega328p::UARTS, 1);
    }

    #[test]
    fn signatures() {
        assert_eq!(Atmega128::SIGNATURE, [0x1E, 0x97, 0x02]);
        assert_eq!(Atmega168::SIGNATURE, [0x1E, 0x94, 0x06]);
        assert_eq!(Atmega328p::SIGNATURE, [0x1E, 0x95, 0x0F]);
        assert_eq!(Atmega8::SIGNATURE, [0x1E, 0x93, 0x07]);
    }

    #[test]
    fn atmega169_usart_sits_in_extended_io() {
        let regs = Atmega169::REGISTERS.unwrap();
        assert_eq!(regs.ucsra, 0xC0);
        assert_eq!(regs.ucsrb, 0xC1);
        assert_eq!(regs.ucsrc, Some(0xC2));
        assert_eq!(regs.ubrrl, 0xC4);
        assert_eq!(regs.ubrrh, 0xC5);
        assert_eq!(regs.udr, 0xC6);
        assert_eq!((regs.pinb, regs.ddrb, regs.portb), (0x23, 0x24, 0x25));
        assert_eq!((regs.pind, regs.ddrd, regs.portd), (0x29, 0x2A, 0x2B));
        assert_eq!(regs.eecr, 0x3F);
        assert_eq!(regs.frame & 0x80, 0, "no URSEL on a dedicated UCSRC");
    }

    #[test]
    fn atmega163_has_ubrrhi_and_padded_spm() {
        let regs = Atmega163::REGISTERS.unwrap();
        assert_eq!(regs.ucsrc, None);
        assert_eq!(regs.ubrrh, 0x40);
        assert!(regs.spm_padding);
    }

    #[test]
    fn shared_ucsrc_frames_set_ursel() {
        for regs in [Atmega16::REGISTERS, Atmega32::REGISTERS, Atmega162::REGISTERS, Atmega8515::REGISTERS, Atmega8535::REGISTERS] {
            let regs = regs.unwrap();
            assert_eq!(regs.ucsrc, Some(regs.ubrrh));
            assert_eq!(regs.frame, 0x86);
            assert!(!regs.spm_padding);
        }
    }
}
