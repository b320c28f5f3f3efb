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

//! ITE IT87x environment controller driver.
//!
//! # Probe
//!
//! Probing runs inside configuration mode (`enter` ... `exit`, always paired):
//!
//! 1. Chip ID word at config register 0x20; 0x0000/0xFFFF means nothing there
//! 2. ID must be a supported model
//! 3. Select LDN 0x04 (environment controller), settle, fetch its base address
//! 4. Settle again, then check vendor ID (0x58) and the monitoring bit in 0x00
//! 5. Derive the voltage gain and fan counter width from the model table
//!
//! # Runtime registers
//!
//! Runtime reads go through `base + 5` (index) and `base + 6` (data). Every
//! read hits the data port twice and keeps the first byte.

use std::fmt;
use std::io;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{ChannelKind, DetectError, DetectionFailure, Result, SensorError};
use crate::model::{model_name_for_id, ChipModel};
use crate::port::PortIo;
use crate::sensor::SensorChip;
use crate::superio::{
    ConfigPorts, SuperIoBus, SuperIoHost, SUPERIO_CHIP_ID_REGISTER,
    SUPERIO_CHIP_REVISION_REGISTER, SUPERIO_CONFIGURATION_CONTROL_REGISTER,
};

pub const ITE_ENVIRONMENT_CONTROLLER_LDN: u8 = 0x04;
pub const ITE_ADDRESS_REGISTER_OFFSET: u16 = 0x05;
pub const ITE_DATA_REGISTER_OFFSET: u16 = 0x06;

pub const ITE_CONFIGURATION_REGISTER: u8 = 0x00;
pub const ITE_FAN_TACHOMETER_DIVISOR_REGISTER: u8 = 0x0b;
pub const ITE_VOLTAGE_BASE_REG: u8 = 0x20;
pub const ITE_TEMPERATURE_BASE_REG: u8 = 0x29;
pub const ITE_VENDOR_ID_REGISTER: u8 = 0x58;
pub const ITE_FAN_TACHOMETER_REG: [u8; 5] = [0x0d, 0x0e, 0x0f, 0x80, 0x82];
pub const ITE_FAN_TACHOMETER_EXT_REG: [u8; 5] = [0x18, 0x19, 0x1a, 0x81, 0x83];

pub const ITE_VENDOR_ID: u8 = 0x90;
pub const VENDOR_NAME: &str = "ITE";

pub const UNLOCK_SEQUENCE: [u8; 4] = [0x87, 0x01, 0x55, 0x55];
const LOCK_VALUE: u8 = 0x02;
const MONITORING_ENABLED: u8 = 0x10;
const SETTLE_DELAY: Duration = Duration::from_millis(50);

pub const TEMPERATURE_SENSORS: u8 = 3;
pub const VOLTAGE_SENSORS: u8 = 9;
pub const TACHOMETER_SENSORS: u8 = 5;

/// Tachometer clock divided down for RPM conversion
pub const TACHOMETER_CLOCK: u32 = 1_350_000;

/// Unlock configuration mode
pub fn enter<H: SuperIoHost + ?Sized>(host: &mut H) -> io::Result<()> {
    let register = host.config_ports().register;
    for b in UNLOCK_SEQUENCE {
        host.outb(register, b)?;
    }
    Ok(())
}

/// Lock configuration mode
pub fn exit<H: SuperIoHost + ?Sized>(host: &mut H) -> io::Result<()> {
    let ports = host.config_ports();
    host.outb(ports.register, SUPERIO_CONFIGURATION_CONTROL_REGISTER)?;
    host.outb(ports.value, LOCK_VALUE)
}

fn read_ec_byte<H: SuperIoHost + ?Sized>(host: &mut H, address: u16, reg: u8) -> io::Result<u8> {
    host.outb(address + ITE_ADDRESS_REGISTER_OFFSET, reg)?;
    let value = host.inb(address + ITE_DATA_REGISTER_OFFSET)?;
    // second read is part of the access cycle, its value is dropped
    let _check = host.inb(address + ITE_DATA_REGISTER_OFFSET)?;
    Ok(value)
}

fn write_ec_byte<H: SuperIoHost + ?Sized>(host: &mut H, address: u16, reg: u8, value: u8) -> io::Result<()> {
    host.outb(address + ITE_ADDRESS_REGISTER_OFFSET, reg)?;
    host.outb(address + ITE_DATA_REGISTER_OFFSET, value)
}

/// `(clock + count) / (2 * count)` for counts in (0x3f, 0xffff), else 0
pub fn rpm_from_16bit_count(count: u32) -> u32 {
    if count > 0x3f && count < 0xffff {
        (TACHOMETER_CLOCK + count) / (2 * count)
    } else {
        0
    }
}

/// `clock / (count * divisor)` for counts in (0, 0xff), else 0
pub fn rpm_from_8bit_count(count: u8, divisor: u32) -> u32 {
    if count > 0 && count < 0xff {
        TACHOMETER_CLOCK / (u32::from(count) * divisor)
    } else {
        0
    }
}

/// Divisor for fan 0 or 1 from the shared 3-bit-per-fan divisor register
pub fn fan_divisor(divisor_register: u8, index: usize) -> u32 {
    1 << ((divisor_register >> (3 * index)) & 0x7)
}

pub fn voltage_from_raw(raw: u8, gain: u8, channel_gain: f32) -> f32 {
    (f32::from(raw) * f32::from(gain) * channel_gain) / 1000.0
}

/// Probe that did not find a usable chip; hands the host back for another try
pub struct Rejected<H> {
    pub host: H,
    pub reason: DetectionFailure,
}

impl<H> Rejected<H> {
    pub fn into_host(self) -> H {
        self.host
    }
}

impl<H> fmt::Debug for Rejected<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected").field("reason", &self.reason).finish_non_exhaustive()
    }
}

struct Probed {
    address: u16,
    model: ChipModel,
    has_16bit_fan_counter: bool,
}

/// Detected IT87x chip.
///
/// Only constructed by a successful [`It87x::probe`].
pub struct It87x<H> {
    host: H,
    address: u16,
    model: ChipModel,
    voltage_gain: u8,
    voltage_specific_gain: [f32; VOLTAGE_SENSORS as usize],
    has_16bit_fan_counter: bool,
}

impl<H> fmt::Debug for It87x<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("It87x")
            .field("model", &self.model)
            .field("address", &format_args!("0x{:04x}", self.address))
            .field("voltage_gain", &self.voltage_gain)
            .field("has_16bit_fan_counter", &self.has_16bit_fan_counter)
            .finish_non_exhaustive()
    }
}

impl<H: SuperIoHost> It87x<H> {
    /// Probe the chip behind `host`'s configuration ports.
    ///
    /// Configuration mode is left again whatever the outcome.
    pub fn probe(mut host: H) -> std::result::Result<Self, Rejected<H>> {
        let ports = host.config_ports();
        let outcome = enter(&mut host)
            .map_err(DetectionFailure::from)
            .and_then(|()| probe_port(&mut host));
        let locked = exit(&mut host);

        let probed = match (outcome, locked) {
            (Ok(probed), Ok(())) => probed,
            (Err(reason), _) => return Err(Rejected { host, reason }),
            (Ok(_), Err(e)) => {
                warn!(ports = %ports, error = %e, "failed to leave configuration mode");
                return Err(Rejected { host, reason: e.into() });
            }
        };

        let chip = Self {
            host,
            address: probed.address,
            model: probed.model,
            voltage_gain: probed.model.voltage_gain(),
            voltage_specific_gain: [1.0; VOLTAGE_SENSORS as usize],
            has_16bit_fan_counter: probed.has_16bit_fan_counter,
        };
        info!(
            model = chip.model.name(),
            ports = %ports,
            address = %format!("0x{:04x}", chip.address),
            "found IT87x chip"
        );
        Ok(chip)
    }

    pub fn read_byte(&mut self, reg: u8) -> io::Result<u8> {
        read_ec_byte(&mut self.host, self.address, reg)
    }

    pub fn write_byte(&mut self, reg: u8, value: u8) -> io::Result<()> {
        write_ec_byte(&mut self.host, self.address, reg, value)
    }
}

impl<H> It87x<H> {
    pub fn model(&self) -> ChipModel {
        self.model
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn voltage_gain(&self) -> u8 {
        self.voltage_gain
    }

    pub fn voltage_specific_gain(&self) -> &[f32] {
        &self.voltage_specific_gain
    }

    pub fn has_16bit_fan_counter(&self) -> bool {
        self.has_16bit_fan_counter
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

fn probe_port<H: SuperIoHost>(host: &mut H) -> std::result::Result<Probed, DetectionFailure> {
    let ports = host.config_ports();
    let id = host.listen_port_word(SUPERIO_CHIP_ID_REGISTER)?;

    if id == 0x0000 || id == 0xffff {
        debug!(ports = %ports, "no chip present");
        return Err(DetectionFailure::NoChip(id));
    }

    let Some(model) = ChipModel::from_id(id) else {
        warn!(ports = %ports, "found unsupported chip ID=0x{:x}", id);
        return Err(DetectionFailure::UnsupportedChip(id));
    };

    host.select_logical_device(ITE_ENVIRONMENT_CONTROLLER_LDN)?;
    host.sleep(SETTLE_DELAY);

    let Some(address) = host.logical_device_address()? else {
        warn!(ports = %ports, "can't get monitoring logical device address");
        return Err(DetectionFailure::NoLogicalDeviceAddress);
    };
    // the index/data pair must fit below the top of the port space
    if address.checked_add(ITE_DATA_REGISTER_OFFSET).is_none() {
        warn!(ports = %ports, "monitoring logical device address 0x{:x} out of range", address);
        return Err(DetectionFailure::NoLogicalDeviceAddress);
    }

    host.sleep(SETTLE_DELAY);

    let vendor = read_ec_byte(host, address, ITE_VENDOR_ID_REGISTER)?;
    if vendor != ITE_VENDOR_ID {
        warn!(ports = %ports, "invalid vendor ID=0x{:x}", vendor);
        return Err(DetectionFailure::VendorMismatch(vendor));
    }

    let config = read_ec_byte(host, address, ITE_CONFIGURATION_REGISTER)?;
    if config & MONITORING_ENABLED == 0 {
        warn!(ports = %ports, "invalid configuration register value 0x{:x}", config);
        return Err(DetectionFailure::MonitoringDisabled(config));
    }

    // revision comes from configuration space; runtime 0x22 is voltage channel 2
    let version = host.listen_port_byte(SUPERIO_CHIP_REVISION_REGISTER)? & 0x0f;
    let has_16bit_fan_counter = model.has_16bit_fan_counter(version);
    debug!(
        model = model.name(),
        version,
        voltage_gain = model.voltage_gain(),
        has_16bit_fan_counter,
        "derived model constants"
    );

    Ok(Probed { address, model, has_16bit_fan_counter })
}

fn check_channel(kind: ChannelKind, index: usize, limit: u8) -> Result<()> {
    if index < usize::from(limit) {
        Ok(())
    } else {
        Err(SensorError::out_of_range(kind, index, limit))
    }
}

impl<H: SuperIoHost> SensorChip for It87x<H> {
    fn model_name(&self) -> &'static str {
        model_name_for_id(self.model.id())
    }

    fn vendor_name(&self) -> &'static str {
        VENDOR_NAME
    }

    fn ports_count(&self) -> u8 {
        1
    }

    fn base_address(&self) -> u16 {
        self.address
    }

    fn temperature_sensors_limit(&self) -> u8 {
        TEMPERATURE_SENSORS
    }

    fn voltage_sensors_limit(&self) -> u8 {
        VOLTAGE_SENSORS
    }

    fn tachometer_sensors_limit(&self) -> u8 {
        TACHOMETER_SENSORS
    }

    fn read_temperature(&mut self, index: usize) -> Result<i32> {
        check_channel(ChannelKind::Temperature, index, TEMPERATURE_SENSORS)?;
        let raw = self.read_byte(ITE_TEMPERATURE_BASE_REG + index as u8)?;
        Ok(i32::from(raw as i8))
    }

    fn read_voltage(&mut self, index: usize) -> Result<f32> {
        check_channel(ChannelKind::Voltage, index, VOLTAGE_SENSORS)?;
        let raw = self.read_byte(ITE_VOLTAGE_BASE_REG + index as u8)?;
        Ok(voltage_from_raw(raw, self.voltage_gain, self.voltage_specific_gain[index]))
    }

    fn read_tachometer(&mut self, index: usize) -> Result<u32> {
        check_channel(ChannelKind::Tachometer, index, TACHOMETER_SENSORS)?;

        if self.has_16bit_fan_counter {
            let low = self.read_byte(ITE_FAN_TACHOMETER_REG[index])?;
            let high = self.read_byte(ITE_FAN_TACHOMETER_EXT_REG[index])?;
            let count = u32::from(low) | u32::from(high) << 8;
            return Ok(rpm_from_16bit_count(count));
        }

        let count = self.read_byte(ITE_FAN_TACHOMETER_REG[index])?;
        let divisor = if index < 2 {
            let divisors = self.read_byte(ITE_FAN_TACHOMETER_DIVISOR_REGISTER)?;
            fan_divisor(divisors, index)
        } else {
            2
        };
        Ok(rpm_from_8bit_count(count, divisor))
    }
}

/// Probe each candidate port pair in turn and keep the first chip found
pub fn detect<P: PortIo>(
    mut bus: SuperIoBus<P>,
    candidates: &[ConfigPorts],
) -> std::result::Result<It87x<SuperIoBus<P>>, DetectError> {
    let mut attempts = Vec::with_capacity(candidates.len());
    for &ports in candidates {
        bus.set_config_ports(ports);
        match It87x::probe(bus) {
            Ok(chip) => return Ok(chip),
            Err(rejected) => {
                debug!(ports = %ports, reason = %rejected.reason, "probe rejected");
                attempts.push((ports, rejected.reason));
                bus = rejected.host;
            }
        }
    }
    Err(DetectError::NotFound { attempts })
}
