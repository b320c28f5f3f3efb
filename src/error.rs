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

//! Error types for chip detection and sensor reads.

use std::fmt;
use std::io;

use crate::superio::ConfigPorts;

/// Result type alias for sensor reads
pub type Result<T> = std::result::Result<T, SensorError>;

/// Channel families exposed by a monitoring chip
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Temperature,
    Voltage,
    Tachometer,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelKind::Temperature => "temperature",
            ChannelKind::Voltage => "voltage",
            ChannelKind::Tachometer => "tachometer",
        };
        f.write_str(s)
    }
}

/// Why a probe on one configuration port pair did not yield a usable chip
#[derive(thiserror::Error, Debug)]
pub enum DetectionFailure {
    // ============================================================================
    // Identification
    // ============================================================================
    #[error("no chip present (ID=0x{0:04x})")]
    NoChip(u16),

    #[error("unsupported chip ID=0x{0:04x}")]
    UnsupportedChip(u16),

    // ============================================================================
    // Environment controller
    // ============================================================================
    #[error("can't get monitoring logical device address")]
    NoLogicalDeviceAddress,

    #[error("invalid vendor ID=0x{0:02x}")]
    VendorMismatch(u8),

    #[error("monitoring disabled (configuration register=0x{0:02x})")]
    MonitoringDisabled(u8),

    // ============================================================================
    // Bus
    // ============================================================================
    #[error("port I/O error: {0}")]
    Io(#[from] io::Error),
}

/// No chip answered on any candidate port pair
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("no supported IT87x chip found ({})", format_attempts(.attempts))]
    NotFound {
        attempts: Vec<(ConfigPorts, DetectionFailure)>,
    },
}

fn format_attempts(attempts: &[(ConfigPorts, DetectionFailure)]) -> String {
    if attempts.is_empty() {
        return "no port pairs tried".to_string();
    }
    attempts
        .iter()
        .map(|(ports, reason)| format!("{}: {}", ports, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from runtime sensor reads
#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    #[error("{kind} channel {index} out of range (chip has {limit})")]
    ChannelOutOfRange {
        kind: ChannelKind,
        index: usize,
        limit: u8,
    },

    #[error("port I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SensorError {
    pub fn out_of_range(kind: ChannelKind, index: usize, limit: u8) -> Self {
        Self::ChannelOutOfRange { kind, index, limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_failure_display() {
        assert_eq!(
            DetectionFailure::UnsupportedChip(0x8686).to_string(),
            "unsupported chip ID=0x8686"
        );
        assert_eq!(
            DetectionFailure::VendorMismatch(0x5c).to_string(),
            "invalid vendor ID=0x5c"
        );
        assert!(DetectionFailure::NoChip(0xffff).to_string().contains("0xffff"));
    }

    #[test]
    fn test_detect_error_lists_attempts() {
        let err = DetectError::NotFound {
            attempts: vec![
                (ConfigPorts::new(0x2e), DetectionFailure::NoChip(0xffff)),
                (ConfigPorts::new(0x4e), DetectionFailure::UnsupportedChip(0x1234)),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("0x2e/0x2f: no chip present"));
        assert!(msg.contains("0x4e/0x4f: unsupported chip ID=0x1234"));
    }

    #[test]
    fn test_detect_error_without_attempts() {
        let err = DetectError::NotFound { attempts: Vec::new() };
        assert!(err.to_string().contains("no port pairs tried"));
    }

    #[test]
    fn test_sensor_error_out_of_range() {
        let err = SensorError::out_of_range(ChannelKind::Voltage, 9, 9);
        assert_eq!(err.to_string(), "voltage channel 9 out of range (chip has 9)");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: SensorError = io_err.into();
        assert!(matches!(err, SensorError::Io(_)));
    }
}
