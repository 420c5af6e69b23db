//! ESP-AT Wi-Fi co-processor on a serial port.
//!
//! The co-processor keeps its own stored credentials and joins the access
//! point by itself; this driver only asks whether it is joined and runs UDP
//! exchanges through it. Echo is switched off in [`EspAt::init`], so every
//! response line is an answer, never our own command.

use core::fmt::Arguments;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial::{Read, Write};
use heapless::Vec;

use crate::error::LinkError;
use crate::network::{Connectivity, UdpLink};

const LINE_CAPACITY: usize = 128;
const COMMAND_CAPACITY: usize = 96;
const COMMAND_TIMEOUT_MS: u32 = 2000;
const JOIN_POLL_MS: u32 = 1000;

pub struct EspAt<S, D> {
    serial: S,
    delay: D,
    line: Vec<u8, LINE_CAPACITY>,
}

impl<S, D> EspAt<S, D>
where
    S: Read<u8> + Write<u8>,
    D: DelayMs<u32>,
{
    pub fn new(serial: S, delay: D) -> Self {
        Self {
            serial,
            delay,
            line: Vec::new(),
        }
    }

    /// Checks the modem answers and disables command echo.
    pub fn init(&mut self) -> Result<(), LinkError> {
        self.command(format_args!("AT\r\n"))?;
        self.wait_for(&[b"OK"], COMMAND_TIMEOUT_MS)?;
        self.command(format_args!("ATE0\r\n"))?;
        self.wait_for(&[b"OK"], COMMAND_TIMEOUT_MS)?;
        Ok(())
    }

    pub fn release(self) -> (S, D) {
        (self.serial, self.delay)
    }

    /// `true` when the modem reports an associated access point.
    pub fn is_joined(&mut self) -> Result<bool, LinkError> {
        self.command(format_args!("AT+CWJAP?\r\n"))?;
        let mut budget = COMMAND_TIMEOUT_MS;
        let mut joined = false;
        loop {
            self.next_line(&mut budget)?;
            match self.line.as_slice() {
                b"OK" => return Ok(joined),
                b"ERROR" | b"FAIL" => return Err(LinkError::Rejected),
                line if line.starts_with(b"+CWJAP:") => joined = true,
                _ => {}
            }
        }
    }

    fn command(&mut self, args: Arguments<'_>) -> Result<(), LinkError> {
        let mut buf = [0u8; COMMAND_CAPACITY];
        let command = format_no_std::show(&mut buf, args).map_err(|_| LinkError::Format)?;
        self.write_all(command.as_bytes())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        for &byte in bytes {
            nb::block!(self.serial.write(byte)).map_err(|_| LinkError::Serial)?;
        }
        nb::block!(self.serial.flush()).map_err(|_| LinkError::Serial)
    }

    fn read_byte(&mut self, budget_ms: &mut u32) -> Result<u8, LinkError> {
        loop {
            match self.serial.read() {
                Ok(byte) => return Ok(byte),
                Err(nb::Error::WouldBlock) => {
                    if *budget_ms == 0 {
                        return Err(LinkError::Timeout);
                    }
                    self.delay.delay_ms(1);
                    *budget_ms -= 1;
                }
                Err(nb::Error::Other(_)) => return Err(LinkError::Serial),
            }
        }
    }

    /// Reads the next non-empty line into `self.line`, without its terminator.
    fn next_line(&mut self, budget_ms: &mut u32) -> Result<(), LinkError> {
        self.line.clear();
        loop {
            match self.read_byte(budget_ms)? {
                b'\n' if !self.line.is_empty() => return Ok(()),
                b'\n' | b'\r' => {}
                byte => self.line.push(byte).map_err(|_| LinkError::Overflow)?,
            }
        }
    }

    /// Skips lines until one equals a token, returning the token's index.
    fn wait_for(&mut self, tokens: &[&[u8]], timeout_ms: u32) -> Result<usize, LinkError> {
        let mut budget = timeout_ms;
        loop {
            self.next_line(&mut budget)?;
            let line = self.line.as_slice();
            if let Some(index) = tokens.iter().position(|token| *token == line) {
                return Ok(index);
            }
            if line == b"ERROR" || line == b"FAIL" || line == b"SEND FAIL" {
                return Err(LinkError::Rejected);
            }
        }
    }

    /// Consumes lines up to and including the next `OK` or `ERROR`.
    fn skip_status(&mut self, timeout_ms: u32) -> Result<(), LinkError> {
        let mut budget = timeout_ms;
        loop {
            self.next_line(&mut budget)?;
            if matches!(self.line.as_slice(), b"OK" | b"ERROR") {
                return Ok(());
            }
        }
    }

    /// Waits for the `>` data prompt after `AT+CIPSEND`.
    fn wait_prompt(&mut self, timeout_ms: u32) -> Result<(), LinkError> {
        let mut budget = timeout_ms;
        self.line.clear();
        loop {
            match self.read_byte(&mut budget)? {
                b'>' => return Ok(()),
                b'\n' => {
                    if self.line.as_slice() == b"ERROR" {
                        return Err(LinkError::Rejected);
                    }
                    self.line.clear();
                }
                b'\r' => {}
                byte => {
                    if self.line.push(byte).is_err() {
                        self.line.clear();
                    }
                }
            }
        }
    }

    /// Reads one `+IPD,<len>:<payload>` notification into `response`.
    fn receive(&mut self, response: &mut [u8], timeout_ms: u32) -> Result<usize, LinkError> {
        let mut budget = timeout_ms;
        self.line.clear();
        while self.line.as_slice() != b"+IPD," {
            match self.read_byte(&mut budget)? {
                b'\r' | b'\n' => self.line.clear(),
                byte => {
                    if self.line.push(byte).is_err() {
                        self.line.clear();
                    }
                }
            }
        }

        let mut len: usize = 0;
        loop {
            match self.read_byte(&mut budget)? {
                b':' => break,
                digit @ b'0'..=b'9' => {
                    len = len
                        .checked_mul(10)
                        .and_then(|len| len.checked_add(usize::from(digit - b'0')))
                        .ok_or(LinkError::Overflow)?;
                }
                _ => return Err(LinkError::Rejected),
            }
        }

        for index in 0..len {
            let byte = self.read_byte(&mut budget)?;
            if let Some(slot) = response.get_mut(index) {
                *slot = byte;
            }
        }
        if len > response.len() {
            return Err(LinkError::Overflow);
        }
        Ok(len)
    }

    fn transfer(&mut self, request: &[u8], response: &mut [u8], timeout_ms: u32) -> Result<usize, LinkError> {
        self.command(format_args!("AT+CIPSEND={}\r\n", request.len()))?;
        self.wait_prompt(COMMAND_TIMEOUT_MS)?;
        self.write_all(request)?;
        self.wait_for(&[b"SEND OK"], COMMAND_TIMEOUT_MS)?;
        self.receive(response, timeout_ms)
    }

    fn close(&mut self) -> Result<(), LinkError> {
        self.command(format_args!("AT+CIPCLOSE\r\n"))?;
        self.wait_for(&[b"OK"], COMMAND_TIMEOUT_MS)?;
        Ok(())
    }
}

impl<S, D> Connectivity for EspAt<S, D>
where
    S: Read<u8> + Write<u8>,
    D: DelayMs<u32>,
{
    fn establish_connection(&mut self, timeout_secs: u32) -> bool {
        for poll in 0..timeout_secs.max(1) {
            if poll > 0 {
                self.delay.delay_ms(JOIN_POLL_MS);
            }
            match self.is_joined() {
                Ok(true) => return true,
                Ok(false) => trace!("access point not joined yet"),
                Err(err) => warn!("join query failed: {}", err),
            }
        }
        false
    }
}

impl<S, D> UdpLink for EspAt<S, D>
where
    S: Read<u8> + Write<u8>,
    D: DelayMs<u32>,
{
    fn exchange(
        &mut self,
        host: &str,
        port: u16,
        request: &[u8],
        response: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, LinkError> {
        self.command(format_args!("AT+CIPSTART=\"UDP\",\"{}\",{}\r\n", host, port))?;
        if self.wait_for(&[b"OK", b"ALREADY CONNECTED"], COMMAND_TIMEOUT_MS)? == 1 {
            // the notice is followed by a final ERROR status
            self.skip_status(COMMAND_TIMEOUT_MS)?;
        }

        let received = self.transfer(request, response, timeout_ms);
        if let Err(err) = self.close() {
            debug!("closing udp link failed: {}", err);
        }
        received
    }
}
