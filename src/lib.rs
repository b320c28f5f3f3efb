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

//! it87mon - ITE IT87x Super I/O hardware monitor for Linux
//!
//! This library detects an IT87x environment controller through the Super I/O
//! configuration ports, then reads its temperature, voltage and tachometer
//! channels directly over port I/O.

pub mod error;
pub mod port;
pub mod superio;
pub mod model;
pub mod it87;
pub mod sensor;
pub mod sim;
pub mod config;
pub mod logger;
pub mod system;
pub mod app;
pub mod events;
pub mod ui;
pub mod service;

pub use error::{ChannelKind, DetectError, DetectionFailure, SensorError};
pub use it87::{detect, It87x, Rejected};
pub use model::ChipModel;
pub use port::{DevPort, PortIo};
pub use sensor::{ChannelLabels, ChipReadings, SensorChip};
pub use superio::{ConfigPorts, SuperIoBus, SuperIoHost, CANDIDATE_PORTS};
