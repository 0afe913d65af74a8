//! STK500v1 wire protocol, the subset avrdude and AVR Studio speak to
//! serial bootloaders.

pub mod transport;

pub use transport::{SerialTransport, Transport, Writer};

/// Leads every acknowledged response
pub const STK_INSYNC: u8 = 0x14;
/// Ends every acknowledged response
pub const STK_OK: u8 = 0x10;
/// Command terminator the host appends to every request
pub const CRC_EOP: u8 = 0x20;

/// Memory-kind byte selecting EEPROM in block commands; anything else is flash
pub const MEMTYPE_EEPROM: u8 = b'E';

/// Set-parameter ids above this carry a second value byte
pub const SET_PARAMETER_SINGLE_MAX: u8 = 0x85;

/// Device-parameter block length for `B`
pub const SET_DEVICE_LEN: u8 = 20;
/// Extended device-parameter block length for `E`
pub const SET_DEVICE_EXT_LEN: u8 = 5;
/// Universal command length for `V`
pub const UNIVERSAL_LEN: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// No byte arrived within the receive budget; the host is gone.
    Timeout,
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Opcodes understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    GetSync = b'0',
    GetSignOn = b'1',
    SetParameter = b'@',
    GetParameter = b'A',
    SetDevice = b'B',
    SetDeviceExt = b'E',
    EnterProgMode = b'P',
    LeaveProgMode = b'Q',
    ChipErase = b'R',
    LoadAddress = b'U',
    Universal = b'V',
    ProgPage = b'd',
    ReadPage = b't',
    ReadSign = b'u',
    ReadOsccal = b'v',
    /// First byte of the `!!!` monitor prefix
    Monitor = b'!',
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        let command = match byte {
            b'0' => Command::GetSync,
            b'1' => Command::GetSignOn,
            b'@' => Command::SetParameter,
            b'A' => Command::GetParameter,
            b'B' => Command::SetDevice,
            b'E' => Command::SetDeviceExt,
            b'P' => Command::EnterProgMode,
            b'Q' => Command::LeaveProgMode,
            b'R' => Command::ChipErase,
            b'U' => Command::LoadAddress,
            b'V' => Command::Universal,
            b'd' => Command::ProgPage,
            b't' => Command::ReadPage,
            b'u' => Command::ReadSign,
            b'v' => Command::ReadOsccal,
            b'!' => Command::Monitor,
            _ => return None,
        };
        Some(command)
    }
}

/// Parameter ids for `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    HardwareVersion,
    SoftwareMajor,
    SoftwareMinor,
    /// Undocumented, AVR Studio 3.56 insists on it
    Compatibility,
    Other(u8),
}

impl Parameter {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x80 => Parameter::HardwareVersion,
            0x81 => Parameter::SoftwareMajor,
            0x82 => Parameter::SoftwareMinor,
            0x98 => Parameter::Compatibility,
            other => Parameter::Other(other),
        }
    }

    /// Value reported to the host
    pub fn value(self) -> u8 {
        use crate::config::{HW_VER, SW_MAJOR, SW_MINOR};

        match self {
            Parameter::HardwareVersion => HW_VER,
            Parameter::SoftwareMajor => SW_MAJOR,
            Parameter::SoftwareMinor => SW_MINOR,
            Parameter::Compatibility => 0x03,
            Parameter::Other(_) => 0x00,
        }
    }
}
