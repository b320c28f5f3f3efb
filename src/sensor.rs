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

//! Host-facing sensor contract.
//!
//! A host polls a [`SensorChip`] once per cycle. [`SensorChip::read_all`]
//! gathers every channel into a [`ChipReadings`] snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChannelKind, Result};

/// Operations a detected monitoring chip offers its host
pub trait SensorChip {
    fn model_name(&self) -> &'static str;

    fn vendor_name(&self) -> &'static str;

    /// Number of I/O port ranges the chip occupies
    fn ports_count(&self) -> u8;

    fn base_address(&self) -> u16;

    fn temperature_sensors_limit(&self) -> u8;

    fn voltage_sensors_limit(&self) -> u8;

    fn tachometer_sensors_limit(&self) -> u8;

    /// Degrees Celsius
    fn read_temperature(&mut self, index: usize) -> Result<i32>;

    /// Volts
    fn read_voltage(&mut self, index: usize) -> Result<f32>;

    /// RPM, 0 when the fan is stalled or the count is invalid
    fn read_tachometer(&mut self, index: usize) -> Result<u32>;

    /// Poll every channel. Channels that fail to read are logged and left out.
    fn read_all(&mut self, labels: &ChannelLabels) -> ChipReadings {
        let mut readings = ChipReadings {
            name: self.model_name().to_string(),
            vendor: self.vendor_name().to_string(),
            address: self.base_address(),
            temps: Vec::new(),
            voltages: Vec::new(),
            fans: Vec::new(),
        };

        for i in 0..usize::from(self.temperature_sensors_limit()) {
            match self.read_temperature(i) {
                Ok(v) => readings.temps.push((labels.label(ChannelKind::Temperature, i), v)),
                Err(e) => warn!(channel = i, error = %e, "temperature read failed"),
            }
        }
        for i in 0..usize::from(self.voltage_sensors_limit()) {
            match self.read_voltage(i) {
                Ok(v) => readings.voltages.push((labels.label(ChannelKind::Voltage, i), v)),
                Err(e) => warn!(channel = i, error = %e, "voltage read failed"),
            }
        }
        for i in 0..usize::from(self.tachometer_sensors_limit()) {
            match self.read_tachometer(i) {
                Ok(v) => readings.fans.push((labels.label(ChannelKind::Tachometer, i), v)),
                Err(e) => warn!(channel = i, error = %e, "tachometer read failed"),
            }
        }

        readings
    }
}

/// One polling cycle's worth of readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipReadings {
    pub name: String,
    pub vendor: String,
    pub address: u16,
    pub temps: Vec<(String, i32)>,   // Celsius
    pub voltages: Vec<(String, f32)>, // Volts
    pub fans: Vec<(String, u32)>,    // RPM
}

/// User-facing channel names, keyed by channel index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelLabels {
    #[serde(default)]
    pub temperature_labels: BTreeMap<usize, String>,
    #[serde(default)]
    pub voltage_labels: BTreeMap<usize, String>,
    #[serde(default)]
    pub fan_labels: BTreeMap<usize, String>,
}

impl ChannelLabels {
    pub fn label(&self, kind: ChannelKind, index: usize) -> String {
        let custom = match kind {
            ChannelKind::Temperature => self.temperature_labels.get(&index),
            ChannelKind::Voltage => self.voltage_labels.get(&index),
            ChannelKind::Tachometer => self.fan_labels.get(&index),
        };
        match custom {
            Some(label) => label.clone(),
            None => default_label(kind, index),
        }
    }
}

pub fn default_label(kind: ChannelKind, index: usize) -> String {
    match kind {
        ChannelKind::Temperature => format!("temp{}", index + 1),
        ChannelKind::Voltage => format!("in{}", index),
        ChannelKind::Tachometer => format!("fan{}", index + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use std::io;

    struct FakeChip {
        temps: Vec<i32>,
        broken_voltage: usize,
    }

    impl SensorChip for FakeChip {
        fn model_name(&self) -> &'static str { "FAKE1" }
        fn vendor_name(&self) -> &'static str { "Test" }
        fn ports_count(&self) -> u8 { 1 }
        fn base_address(&self) -> u16 { 0x0a30 }
        fn temperature_sensors_limit(&self) -> u8 { self.temps.len() as u8 }
        fn voltage_sensors_limit(&self) -> u8 { 3 }
        fn tachometer_sensors_limit(&self) -> u8 { 2 }

        fn read_temperature(&mut self, index: usize) -> Result<i32> {
            Ok(self.temps[index])
        }

        fn read_voltage(&mut self, index: usize) -> Result<f32> {
            if index == self.broken_voltage {
                return Err(SensorError::Io(io::Error::new(io::ErrorKind::Other, "bus error")));
            }
            Ok(index as f32 * 0.5)
        }

        fn read_tachometer(&mut self, index: usize) -> Result<u32> {
            Ok(if index == 0 { 1200 } else { 0 })
        }
    }

    #[test]
    fn test_read_all_collects_channels() {
        let mut chip = FakeChip { temps: vec![40, -5], broken_voltage: 99 };
        let r = chip.read_all(&ChannelLabels::default());

        assert_eq!(r.name, "FAKE1");
        assert_eq!(r.vendor, "Test");
        assert_eq!(r.address, 0x0a30);
        assert_eq!(r.temps, vec![("temp1".to_string(), 40), ("temp2".to_string(), -5)]);
        assert_eq!(r.voltages.len(), 3);
        assert_eq!(r.voltages[2], ("in2".to_string(), 1.0));
        assert_eq!(r.fans, vec![("fan1".to_string(), 1200), ("fan2".to_string(), 0)]);
    }

    #[test]
    fn test_read_all_skips_failed_channel() {
        let mut chip = FakeChip { temps: vec![40], broken_voltage: 1 };
        let r = chip.read_all(&ChannelLabels::default());
        let names: Vec<&str> = r.voltages.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["in0", "in2"]);
    }

    #[test]
    fn test_custom_labels() {
        let mut labels = ChannelLabels::default();
        labels.temperature_labels.insert(0, "CPU".to_string());
        labels.fan_labels.insert(1, "Rear".to_string());

        assert_eq!(labels.label(ChannelKind::Temperature, 0), "CPU");
        assert_eq!(labels.label(ChannelKind::Temperature, 1), "temp2");
        assert_eq!(labels.label(ChannelKind::Tachometer, 1), "Rear");
        assert_eq!(labels.label(ChannelKind::Voltage, 4), "in4");
    }

    #[test]
    fn test_readings_json_shape() {
        let r = ChipReadings {
            name: "IT8728F".to_string(),
            vendor: "ITE".to_string(),
            address: 0x0290,
            temps: vec![("temp1".to_string(), 38)],
            voltages: vec![("in0".to_string(), 1.056)],
            fans: vec![("fan1".to_string(), 1214)],
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"name\":\"IT8728F\""));
        assert!(json.contains("\"address\":656"));
        assert!(json.contains("[\"fan1\",1214]"));

        let back: ChipReadings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_labels_from_json_string_keys() {
        let labels: ChannelLabels =
            serde_json::from_str(r#"{"voltage_labels": {"0": "Vcore", "8": "VBAT"}}"#).unwrap();
        assert_eq!(labels.label(ChannelKind::Voltage, 0), "Vcore");
        assert_eq!(labels.label(ChannelKind::Voltage, 8), "VBAT");
        assert!(labels.temperature_labels.is_empty());
    }
}
