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

//! Register-level simulation of an IT87x Super I/O chip.
//!
//! The simulation answers on one configuration port pair. It only exposes
//! its configuration registers after the unlock sequence. The environment
//! controller's register file sits behind `base + 5` (index) and `base + 6`
//! (data). Every write is logged and data-port reads are counted, so tests
//! can assert the exact bus traffic.

use std::io;

use crate::it87::{
    ITE_ADDRESS_REGISTER_OFFSET, ITE_CONFIGURATION_REGISTER, ITE_DATA_REGISTER_OFFSET,
    ITE_ENVIRONMENT_CONTROLLER_LDN, ITE_FAN_TACHOMETER_DIVISOR_REGISTER,
    ITE_FAN_TACHOMETER_EXT_REG, ITE_FAN_TACHOMETER_REG, ITE_TEMPERATURE_BASE_REG,
    ITE_VENDOR_ID, ITE_VENDOR_ID_REGISTER, ITE_VOLTAGE_BASE_REG, UNLOCK_SEQUENCE,
};
use crate::port::PortIo;
use crate::superio::{
    ConfigPorts, SUPERIO_BASE_ADDRESS_REGISTER, SUPERIO_CHIP_ID_REGISTER,
    SUPERIO_CHIP_REVISION_REGISTER, SUPERIO_CONFIGURATION_CONTROL_REGISTER,
    SUPERIO_DEVICE_SELECT_REGISTER,
};

pub const DEFAULT_BASE_ADDRESS: u16 = 0x0290;

/// Floating bus value for unanswered reads
const OPEN_BUS: u8 = 0xff;

#[derive(Debug, Clone)]
pub struct SimulatedIte {
    ports: ConfigPorts,
    chip_id: u16,
    revision: u8,
    base_address: u16,
    unlock_progress: usize,
    unlocked: bool,
    config_index: u8,
    ldn: u8,
    ec_index: u8,
    ec_regs: [u8; 256],
    data_reads: usize,
    writes: Vec<(u16, u8)>,
}

impl SimulatedIte {
    /// Chip with `chip_id` on 0x2E/0x2F, monitoring enabled, ITE vendor ID
    pub fn new(chip_id: u16) -> Self {
        let mut ec_regs = [0u8; 256];
        ec_regs[usize::from(ITE_VENDOR_ID_REGISTER)] = ITE_VENDOR_ID;
        // start bit + monitoring enabled
        ec_regs[usize::from(ITE_CONFIGURATION_REGISTER)] = 0x11;
        Self {
            ports: ConfigPorts::new(0x2e),
            chip_id,
            revision: 0x08,
            base_address: DEFAULT_BASE_ADDRESS,
            unlock_progress: 0,
            unlocked: false,
            config_index: 0,
            ldn: 0,
            ec_index: 0,
            ec_regs,
            data_reads: 0,
            writes: Vec::new(),
        }
    }

    pub fn on_ports(mut self, ports: ConfigPorts) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_revision(mut self, revision: u8) -> Self {
        self.revision = revision;
        self
    }

    /// Base address 0 means the environment controller is unassigned
    pub fn with_base_address(mut self, base_address: u16) -> Self {
        self.base_address = base_address;
        self
    }

    pub fn with_register(mut self, reg: u8, value: u8) -> Self {
        self.set_register(reg, value);
        self
    }

    pub fn with_vendor_id(self, vendor: u8) -> Self {
        self.with_register(ITE_VENDOR_ID_REGISTER, vendor)
    }

    pub fn with_config_register(self, value: u8) -> Self {
        self.with_register(ITE_CONFIGURATION_REGISTER, value)
    }

    /// Plausible desktop readings for running the monitor without hardware
    pub fn with_demo_readings(mut self) -> Self {
        for (i, temp) in [38u8, 45, 29].into_iter().enumerate() {
            self.set_register(ITE_TEMPERATURE_BASE_REG + i as u8, temp);
        }
        for (i, raw) in [0x58u8, 0x5c, 0xbb, 0xc0, 0x4a, 0x6e, 0x96, 0xcc, 0xc8].into_iter().enumerate() {
            self.set_register(ITE_VOLTAGE_BASE_REG + i as u8, raw);
        }
        let counts: [u16; 5] = [0x022c, 0x0301, 0x0000, 0x0c80, 0xffff];
        for (i, count) in counts.into_iter().enumerate() {
            self.set_register(ITE_FAN_TACHOMETER_REG[i], (count & 0xff) as u8);
            self.set_register(ITE_FAN_TACHOMETER_EXT_REG[i], (count >> 8) as u8);
        }
        self.set_register(ITE_FAN_TACHOMETER_DIVISOR_REGISTER, 0x09);
        self
    }

    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.ec_regs[usize::from(reg)] = value;
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.ec_regs[usize::from(reg)]
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn selected_ldn(&self) -> u8 {
        self.ldn
    }

    /// Reads of the environment controller data port so far
    pub fn data_reads(&self) -> usize {
        self.data_reads
    }

    pub fn writes(&self) -> &[(u16, u8)] {
        &self.writes
    }

    pub fn clear_log(&mut self) {
        self.data_reads = 0;
        self.writes.clear();
    }

    /// Runtime port at `offset`, if the environment controller decodes one there
    fn ec_port(&self, offset: u16) -> Option<u16> {
        if self.base_address == 0 {
            return None;
        }
        self.base_address.checked_add(offset)
    }

    fn advance_unlock(&mut self, value: u8) {
        if value == UNLOCK_SEQUENCE[self.unlock_progress] {
            self.unlock_progress += 1;
        } else if value == UNLOCK_SEQUENCE[0] {
            self.unlock_progress = 1;
        } else {
            self.unlock_progress = 0;
        }
        if self.unlock_progress == UNLOCK_SEQUENCE.len() {
            self.unlocked = true;
            self.unlock_progress = 0;
        }
    }

    fn write_config(&mut self, value: u8) {
        match self.config_index {
            SUPERIO_DEVICE_SELECT_REGISTER => self.ldn = value,
            SUPERIO_CONFIGURATION_CONTROL_REGISTER if value & 0x02 != 0 => self.unlocked = false,
            _ => {}
        }
    }

    fn read_config(&self) -> u8 {
        let [id_high, id_low] = self.chip_id.to_be_bytes();
        let [base_high, base_low] = self.base_address.to_be_bytes();
        let env_selected = self.ldn == ITE_ENVIRONMENT_CONTROLLER_LDN;
        match self.config_index {
            SUPERIO_DEVICE_SELECT_REGISTER => self.ldn,
            SUPERIO_CHIP_ID_REGISTER => id_high,
            r if r == SUPERIO_CHIP_ID_REGISTER + 1 => id_low,
            SUPERIO_CHIP_REVISION_REGISTER => self.revision,
            SUPERIO_BASE_ADDRESS_REGISTER if env_selected => base_high,
            r if r == SUPERIO_BASE_ADDRESS_REGISTER + 1 && env_selected => base_low,
            SUPERIO_BASE_ADDRESS_REGISTER => 0x00,
            r if r == SUPERIO_BASE_ADDRESS_REGISTER + 1 => 0x00,
            _ => OPEN_BUS,
        }
    }
}

impl PortIo for SimulatedIte {
    fn inb(&mut self, port: u16) -> io::Result<u8> {
        if port == self.ports.value {
            return Ok(if self.unlocked { self.read_config() } else { OPEN_BUS });
        }
        if self.ec_port(ITE_DATA_REGISTER_OFFSET) == Some(port) {
            self.data_reads += 1;
            return Ok(self.ec_regs[usize::from(self.ec_index)]);
        }
        Ok(OPEN_BUS)
    }

    fn outb(&mut self, port: u16, value: u8) -> io::Result<()> {
        self.writes.push((port, value));
        if port == self.ports.register {
            if self.unlocked {
                self.config_index = value;
            } else {
                self.advance_unlock(value);
            }
        } else if port == self.ports.value {
            if self.unlocked {
                self.write_config(value);
            }
        } else if self.ec_port(ITE_ADDRESS_REGISTER_OFFSET) == Some(port) {
            self.ec_index = value;
        } else if self.ec_port(ITE_DATA_REGISTER_OFFSET) == Some(port) {
            self.ec_regs[usize::from(self.ec_index)] = value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlock(sim: &mut SimulatedIte) {
        for b in UNLOCK_SEQUENCE {
            sim.outb(0x2e, b).unwrap();
        }
    }

    fn config_read(sim: &mut SimulatedIte, reg: u8) -> u8 {
        sim.outb(0x2e, reg).unwrap();
        sim.inb(0x2f).unwrap()
    }

    #[test]
    fn test_locked_chip_floats() {
        let mut sim = SimulatedIte::new(0x8728);
        assert_eq!(config_read(&mut sim, 0x20), 0xff);
        assert!(!sim.is_unlocked());
    }

    #[test]
    fn test_unlock_exposes_chip_id() {
        let mut sim = SimulatedIte::new(0x8728).with_revision(0x03);
        unlock(&mut sim);
        assert!(sim.is_unlocked());
        assert_eq!(config_read(&mut sim, 0x20), 0x87);
        assert_eq!(config_read(&mut sim, 0x21), 0x28);
        assert_eq!(config_read(&mut sim, 0x22), 0x03);
    }

    #[test]
    fn test_partial_unlock_restarts() {
        let mut sim = SimulatedIte::new(0x8728);
        for b in [0x87, 0x01, 0x87, 0x01, 0x55, 0x55] {
            sim.outb(0x2e, b).unwrap();
        }
        assert!(sim.is_unlocked());

        let mut sim = SimulatedIte::new(0x8728);
        for b in [0x87, 0x01, 0x55, 0xaa] {
            sim.outb(0x2e, b).unwrap();
        }
        assert!(!sim.is_unlocked());
    }

    #[test]
    fn test_base_address_only_for_environment_controller() {
        let mut sim = SimulatedIte::new(0x8728).with_base_address(0x0a30);
        unlock(&mut sim);
        assert_eq!(config_read(&mut sim, 0x60), 0x00);

        sim.outb(0x2e, 0x07).unwrap();
        sim.outb(0x2f, 0x04).unwrap();
        assert_eq!(sim.selected_ldn(), 0x04);
        assert_eq!(config_read(&mut sim, 0x60), 0x0a);
        assert_eq!(config_read(&mut sim, 0x61), 0x30);
    }

    #[test]
    fn test_lock_via_configuration_control() {
        let mut sim = SimulatedIte::new(0x8728);
        unlock(&mut sim);
        sim.outb(0x2e, 0x02).unwrap();
        sim.outb(0x2f, 0x02).unwrap();
        assert!(!sim.is_unlocked());
    }

    #[test]
    fn test_environment_register_file() {
        let mut sim = SimulatedIte::new(0x8728);
        sim.outb(0x295, 0x58).unwrap();
        assert_eq!(sim.inb(0x296).unwrap(), 0x90);

        sim.outb(0x295, 0x13).unwrap();
        sim.outb(0x296, 0x70).unwrap();
        assert_eq!(sim.register(0x13), 0x70);
        assert_eq!(sim.data_reads(), 1);

        sim.clear_log();
        assert!(sim.writes().is_empty());
        assert_eq!(sim.data_reads(), 0);
    }

    #[test]
    fn test_base_near_top_of_port_space() {
        let mut sim = SimulatedIte::new(0x8728).with_base_address(0xfffc);
        // the pair would sit past 0xffff, so wrapped ports stay unclaimed
        sim.outb(0x0001, 0x58).unwrap();
        assert_eq!(sim.inb(0x0002).unwrap(), 0xff);
        assert_eq!(sim.data_reads(), 0);

        let mut sim = SimulatedIte::new(0x8728).with_base_address(0xfff9);
        sim.outb(0xfffe, 0x58).unwrap();
        assert_eq!(sim.inb(0xffff).unwrap(), 0x90);
    }

    #[test]
    fn test_unassigned_base_does_not_decode() {
        let mut sim = SimulatedIte::new(0x8728).with_base_address(0);
        sim.outb(0x5, 0x58).unwrap();
        assert_eq!(sim.inb(0x6).unwrap(), 0xff);
        assert_eq!(sim.data_reads(), 0);
    }
}
