//! STK500v1 command dispatcher
//!
//! Reads one opcode at a time, consumes exactly the bytes that opcode carries
//! and answers with the sync/ok envelope. Nothing is ever reported as an
//! error to the host: unknown opcodes are skipped, and a request whose
//! terminator is wrong simply gets no answer.

pub mod entry;
pub mod session;

use core::marker::PhantomData;

use crate::chip::Chip;
use crate::config::{BUFFER_SIZE, PROGRAMMER_ID};
use crate::diagnostics::{self, MonitorPort, NoMonitor};
use crate::drivers::{eeprom, flash, Eeprom, FlashAddress, SelfProgram};
use crate::protocol::{
    Command, Parameter, ProtocolError, Result, Transport, CRC_EOP, SET_DEVICE_EXT_LEN,
    SET_DEVICE_LEN, SET_PARAMETER_SINGLE_MAX, STK_INSYNC, STK_OK, UNIVERSAL_LEN,
};

pub use entry::{EntryController, EntryPins, EntryPolicy, Jumper, UartSelect};
pub use session::{BlockRequest, MemoryKind, Session};

/// Outcome of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Opcode not recognised, nothing was consumed after it
    Skipped(u8),
    RunApplication,
}

/// Why the bootloader handed over to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Application present and no entry pin asserted
    Startup,
    /// The host asked for it
    Command,
    /// The host went quiet
    Timeout,
}

pub struct Bootloader<C, T, N, M = NoMonitor> {
    transport: T,
    nvm: N,
    monitor: Option<M>,
    session: Session,
    _chip: PhantomData<C>,
}

impl<C, T, N> Bootloader<C, T, N, NoMonitor>
where
    C: Chip,
    T: Transport,
    N: SelfProgram + Eeprom,
{
    pub fn new(transport: T, nvm: N) -> Self {
        Self {
            transport,
            nvm,
            monitor: None,
            session: Session::new(),
            _chip: PhantomData,
        }
    }
}

impl<C, T, N, M> Bootloader<C, T, N, M>
where
    C: Chip,
    T: Transport,
    N: SelfProgram + Eeprom,
    M: MonitorPort,
{
    /// Attaches the board resources for the `!!!` monitor. Ignored on parts
    /// without monitor support.
    pub fn with_monitor<P: MonitorPort>(self, port: P) -> Bootloader<C, T, N, P> {
        Bootloader {
            transport: self.transport,
            nvm: self.nvm,
            monitor: Some(port),
            session: self.session,
            _chip: PhantomData,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn nvm(&mut self) -> &mut N {
        &mut self.nvm
    }

    pub fn monitor(&mut self) -> Option<&mut M> {
        self.monitor.as_mut()
    }

    /// Serves commands until the host asks for the application or goes away.
    pub fn run(&mut self) -> Exit {
        log::debug!("bootloader active on {}", C::NAME);
        loop {
            match self.step() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Skipped(opcode)) => log::trace!("skipped opcode {:#04x}", opcode),
                Ok(Flow::RunApplication) => {
                    log::debug!("application start requested");
                    return Exit::Command;
                }
                Err(ProtocolError::Timeout) => {
                    log::debug!("host timed out");
                    return Exit::Timeout;
                }
            }
        }
    }

    /// Reads and executes one command.
    pub fn step(&mut self) -> Result<Flow> {
        let opcode = self.transport.receive_byte()?;
        match Command::from_byte(opcode) {
            Some(command) => self.execute(command),
            None => Ok(Flow::Skipped(opcode)),
        }
    }

    fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::GetSync
            | Command::EnterProgMode
            | Command::LeaveProgMode
            // Pages are erased as they are written
            | Command::ChipErase => self.reply(&[]),
            Command::GetSignOn => self.reply(PROGRAMMER_ID),
            Command::SetParameter => {
                if self.transport.receive_byte()? > SET_PARAMETER_SINGLE_MAX {
                    self.transport.receive_byte()?;
                }
                self.reply(&[])
            }
            Command::GetParameter => {
                let parameter = Parameter::from_byte(self.transport.receive_byte()?);
                self.reply(&[parameter.value()])
            }
            Command::SetDevice => {
                self.transport.skip(SET_DEVICE_LEN)?;
                self.reply(&[])
            }
            Command::SetDeviceExt => {
                self.transport.skip(SET_DEVICE_EXT_LEN)?;
                self.reply(&[])
            }
            Command::LoadAddress => {
                let low = self.transport.receive_byte()?;
                let high = self.transport.receive_byte()?;
                self.session.set_address(low, high);
                self.reply(&[])
            }
            Command::Universal => {
                self.transport.skip(UNIVERSAL_LEN)?;
                self.reply(&[0x00])
            }
            Command::ProgPage => self.prog_page(),
            Command::ReadPage => self.read_page(),
            Command::ReadSign => self.reply(&C::SIGNATURE),
            Command::ReadOsccal => self.reply(&[0x00]),
            Command::Monitor => self.monitor_prefix(),
        }
    }

    /// Reads the terminator, then answers `payload` in the sync/ok envelope.
    fn reply(&mut self, payload: &[u8]) -> Result<Flow> {
        if self.terminated()? {
            self.transport.send_byte(STK_INSYNC);
            self.transport.send_all(payload);
            self.transport.send_byte(STK_OK);
        }
        Ok(Flow::Continue)
    }

    fn terminated(&mut self) -> Result<bool> {
        Ok(self.transport.receive_byte()? == CRC_EOP)
    }

    fn block_request(&mut self) -> Result<BlockRequest> {
        let mut header = [0u8; 3];
        for byte in header.iter_mut() {
            *byte = self.transport.receive_byte()?;
        }
        Ok(BlockRequest::parse(header))
    }

    fn prog_page(&mut self) -> Result<Flow> {
        let request = self.block_request()?;
        let length = usize::from(request.length);

        // Surplus beyond the buffer is drained so the stream stays in step
        for i in 0..length {
            let byte = self.transport.receive_byte()?;
            if let Some(slot) = self.session.buffer.get_mut(i) {
                *slot = byte;
            }
        }
        if length > BUFFER_SIZE {
            log::warn!("block of {} bytes truncated to {}", length, BUFFER_SIZE);
        }

        if !self.terminated()? {
            return Ok(Flow::Continue);
        }

        let data = &self.session.buffer[..length.min(BUFFER_SIZE)];
        match request.kind {
            MemoryKind::Eeprom => eeprom::program(&mut self.nvm, self.session.address, data),
            MemoryKind::Flash => {
                let start = FlashAddress::from_word(self.session.address, C::EXTENDED_FLASH);
                self.session.resume =
                    flash::program::<C, N>(&mut self.nvm, start, data, self.session.resume);
            }
        }

        self.transport.send_byte(STK_INSYNC);
        self.transport.send_byte(STK_OK);
        Ok(Flow::Continue)
    }

    fn read_page(&mut self) -> Result<Flow> {
        let request = self.block_request()?;
        if !self.terminated()? {
            return Ok(Flow::Continue);
        }

        self.transport.send_byte(STK_INSYNC);
        let transport = &mut self.transport;
        match request.kind {
            MemoryKind::Eeprom => {
                eeprom::read(&mut self.nvm, self.session.address, request.length, |byte| {
                    transport.send_byte(byte)
                })
            }
            MemoryKind::Flash => {
                let start = FlashAddress::from_word(self.session.address, C::EXTENDED_FLASH);
                flash::read(&mut self.nvm, start, request.length, |byte| {
                    transport.send_byte(byte)
                })
            }
        }
        self.transport.send_byte(STK_OK);
        Ok(Flow::Continue)
    }

    fn monitor_prefix(&mut self) -> Result<Flow> {
        let port = match self.monitor.as_mut() {
            Some(port) if C::MONITOR => port,
            _ => return Ok(Flow::Skipped(Command::Monitor as u8)),
        };

        // Two more '!' complete the prefix, anything else is dropped
        for _ in 0..2 {
            if self.transport.receive_byte()? != b'!' {
                return Ok(Flow::Continue);
            }
        }
        diagnostics::run(&mut self.transport, port)
    }
}
