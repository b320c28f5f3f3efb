/*
 * This file is part of it87mon.
 *
 * Copyright (C) 2025 it87mon contributors
 *
 * it87mon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * it87mon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with it87mon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Super I/O configuration space access.
//!
//! Every Super I/O chip answers on an index/data port pair (usually 0x2E/0x2F
//! or 0x4E/0x4F). Writing a register number to the index port and then
//! reading the data port returns that configuration register. The registers
//! in 0x20..0x2F are global; the rest belong to whichever logical device was
//! last selected through register 0x07.

use std::fmt;
use std::io;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::port::PortIo;

pub const SUPERIO_CONFIGURATION_CONTROL_REGISTER: u8 = 0x02;
pub const SUPERIO_DEVICE_SELECT_REGISTER: u8 = 0x07;
pub const SUPERIO_CHIP_ID_REGISTER: u8 = 0x20;
pub const SUPERIO_CHIP_REVISION_REGISTER: u8 = 0x22;
pub const SUPERIO_BASE_ADDRESS_REGISTER: u8 = 0x60;

/// Configuration index/data port pair
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPorts {
    pub register: u16,
    pub value: u16,
}

impl ConfigPorts {
    /// Pair with the data port directly after the index port (wraps at 0xffff)
    pub const fn new(register: u16) -> Self {
        Self { register, value: register.wrapping_add(1) }
    }
}

impl fmt::Display for ConfigPorts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}/0x{:02x}", self.register, self.value)
    }
}

/// Port pairs Super I/O chips are strapped to on PC boards
pub const CANDIDATE_PORTS: [ConfigPorts; 2] = [ConfigPorts::new(0x2e), ConfigPorts::new(0x4e)];

/// Capabilities a chip driver needs from the host while probing and reading.
///
/// Only `config_ports`, `outb`, `inb` and `sleep` must be provided; the
/// configuration-space helpers follow the conventions shared by all Super I/O
/// vendors.
pub trait SuperIoHost {
    fn config_ports(&self) -> ConfigPorts;

    fn outb(&mut self, port: u16, value: u8) -> io::Result<()>;

    fn inb(&mut self, port: u16) -> io::Result<u8>;

    /// Blocking delay for hardware settling
    fn sleep(&mut self, duration: Duration);

    fn listen_port_byte(&mut self, reg: u8) -> io::Result<u8> {
        let ports = self.config_ports();
        self.outb(ports.register, reg)?;
        self.inb(ports.value)
    }

    /// Big-endian word from `reg` (high) and `reg + 1` (low)
    fn listen_port_word(&mut self, reg: u8) -> io::Result<u16> {
        let high = self.listen_port_byte(reg)?;
        let low = self.listen_port_byte(reg.wrapping_add(1))?;
        Ok(u16::from(high) << 8 | u16::from(low))
    }

    fn select_logical_device(&mut self, ldn: u8) -> io::Result<()> {
        let ports = self.config_ports();
        self.outb(ports.register, SUPERIO_DEVICE_SELECT_REGISTER)?;
        self.outb(ports.value, ldn)
    }

    /// Base I/O address of the selected logical device.
    ///
    /// Read twice 1 ms apart; `None` if the reads disagree or the device has
    /// no address assigned.
    fn logical_device_address(&mut self) -> io::Result<Option<u16>> {
        let address = self.listen_port_word(SUPERIO_BASE_ADDRESS_REGISTER)?;
        self.sleep(Duration::from_millis(1));
        let verify = self.listen_port_word(SUPERIO_BASE_ADDRESS_REGISTER)?;

        if address != verify {
            trace!(address, verify, "logical device address mismatch");
            return Ok(None);
        }
        if address == 0 {
            return Ok(None);
        }
        Ok(Some(address))
    }
}

pub type Sleeper = fn(Duration);

/// Standard host: a [`PortIo`] plus the configuration port pair in use
pub struct SuperIoBus<P> {
    io: P,
    ports: ConfigPorts,
    sleeper: Sleeper,
}

impl<P: PortIo> SuperIoBus<P> {
    pub fn new(io: P, ports: ConfigPorts) -> Self {
        Self { io, ports, sleeper: thread::sleep }
    }

    /// Replace the settling delay (tests and simulation skip it)
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn set_config_ports(&mut self, ports: ConfigPorts) {
        self.ports = ports;
    }

    pub fn io_mut(&mut self) -> &mut P {
        &mut self.io
    }

    pub fn into_inner(self) -> P {
        self.io
    }
}

impl<P: PortIo> SuperIoHost for SuperIoBus<P> {
    fn config_ports(&self) -> ConfigPorts {
        self.ports
    }

    fn outb(&mut self, port: u16, value: u8) -> io::Result<()> {
        self.io.outb(port, value)
    }

    fn inb(&mut self, port: u16) -> io::Result<u8> {
        self.io.inb(port)
    }

    fn sleep(&mut self, duration: Duration) {
        (self.sleeper)(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockPortIo;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn no_sleep(_: Duration) {}

    fn expect_listen(mock: &mut MockPortIo, seq: &mut Sequence, reg: u8, value: u8) {
        mock.expect_outb()
            .with(eq(0x2e), eq(reg))
            .times(1)
            .in_sequence(seq)
            .returning(|_, _| Ok(()));
        mock.expect_inb()
            .with(eq(0x2f))
            .times(1)
            .in_sequence(seq)
            .returning(move |_| Ok(value));
    }

    #[test]
    fn test_config_ports_pairing() {
        assert_eq!(ConfigPorts::new(0x2e), ConfigPorts { register: 0x2e, value: 0x2f });
        assert_eq!(CANDIDATE_PORTS[1].value, 0x4f);
        assert_eq!(ConfigPorts::new(0x4e).to_string(), "0x4e/0x4f");
        assert_eq!(ConfigPorts::new(0xffff).value, 0x0000);
    }

    #[test]
    fn test_listen_port_word_high_then_low() {
        let mut mock = MockPortIo::new();
        let mut seq = Sequence::new();
        expect_listen(&mut mock, &mut seq, 0x20, 0x87);
        expect_listen(&mut mock, &mut seq, 0x21, 0x28);

        let mut bus = SuperIoBus::new(mock, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        assert_eq!(bus.listen_port_word(0x20).unwrap(), 0x8728);
    }

    #[test]
    fn test_select_logical_device() {
        let mut mock = MockPortIo::new();
        let mut seq = Sequence::new();
        mock.expect_outb().with(eq(0x4e), eq(0x07)).times(1).in_sequence(&mut seq).returning(|_, _| Ok(()));
        mock.expect_outb().with(eq(0x4f), eq(0x04)).times(1).in_sequence(&mut seq).returning(|_, _| Ok(()));

        let mut bus = SuperIoBus::new(mock, ConfigPorts::new(0x4e)).with_sleeper(no_sleep);
        bus.select_logical_device(0x04).unwrap();
    }

    #[test]
    fn test_logical_device_address_stable() {
        let mut mock = MockPortIo::new();
        let mut seq = Sequence::new();
        for _ in 0..2 {
            expect_listen(&mut mock, &mut seq, 0x60, 0x02);
            expect_listen(&mut mock, &mut seq, 0x61, 0x90);
        }

        let mut bus = SuperIoBus::new(mock, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        assert_eq!(bus.logical_device_address().unwrap(), Some(0x0290));
    }

    #[test]
    fn test_logical_device_address_mismatch() {
        let mut mock = MockPortIo::new();
        let mut seq = Sequence::new();
        expect_listen(&mut mock, &mut seq, 0x60, 0x02);
        expect_listen(&mut mock, &mut seq, 0x61, 0x90);
        expect_listen(&mut mock, &mut seq, 0x60, 0x02);
        expect_listen(&mut mock, &mut seq, 0x61, 0x28);

        let mut bus = SuperIoBus::new(mock, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        assert_eq!(bus.logical_device_address().unwrap(), None);
    }

    #[test]
    fn test_logical_device_address_zero() {
        let mut mock = MockPortIo::new();
        mock.expect_outb().returning(|_, _| Ok(()));
        mock.expect_inb().returning(|_| Ok(0x00));

        let mut bus = SuperIoBus::new(mock, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        assert_eq!(bus.logical_device_address().unwrap(), None);
    }

    #[test]
    fn test_io_error_propagates() {
        let mut mock = MockPortIo::new();
        mock.expect_outb()
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        let mut bus = SuperIoBus::new(mock, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        let err = bus.listen_port_byte(0x20).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_retarget_and_into_inner() {
        let mut mock = MockPortIo::new();
        mock.expect_outb().with(eq(0x4e), eq(0x20)).times(1).returning(|_, _| Ok(()));
        mock.expect_inb().with(eq(0x4f)).times(1).returning(|_| Ok(0xff));

        let mut bus = SuperIoBus::new(mock, ConfigPorts::new(0x2e)).with_sleeper(no_sleep);
        bus.set_config_ports(ConfigPorts::new(0x4e));
        assert_eq!(bus.config_ports(), ConfigPorts::new(0x4e));
        assert_eq!(bus.listen_port_byte(0x20).unwrap(), 0xff);
        let _mock = bus.into_inner();
    }
}
