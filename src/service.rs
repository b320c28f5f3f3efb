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

//! Headless modes: a one-shot JSON dump and a periodic polling service.

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::sensor::{ChannelLabels, ChipReadings, SensorChip};

/// Write one snapshot as pretty JSON followed by a newline
pub fn dump_snapshot<W: Write>(
    chip: &mut dyn SensorChip,
    labels: &ChannelLabels,
    out: &mut W,
) -> Result<ChipReadings> {
    let readings = chip.read_all(labels);
    serde_json::to_writer_pretty(&mut *out, &readings).context("serializing readings")?;
    writeln!(out)?;
    Ok(readings)
}

/// Poll until `max_cycles` is reached, forever when `None`.
/// Every snapshot is emitted as an info event carrying the JSON readings.
pub fn run_service(
    chip: &mut dyn SensorChip,
    labels: &ChannelLabels,
    interval: Duration,
    max_cycles: Option<u64>,
) -> Result<u64> {
    info!(
        chip = chip.model_name(),
        address = %format!("0x{:04x}", chip.base_address()),
        interval_ms = interval.as_millis() as u64,
        "starting service mode"
    );

    let mut cycles = 0u64;
    loop {
        let started = Instant::now();
        let readings = chip.read_all(labels);
        let json = serde_json::to_string(&readings).context("serializing readings")?;
        info!(cycle = cycles, readings = %json, "snapshot");

        let expected = usize::from(chip.temperature_sensors_limit())
            + usize::from(chip.voltage_sensors_limit())
            + usize::from(chip.tachometer_sensors_limit());
        let got = readings.temps.len() + readings.voltages.len() + readings.fans.len();
        if got < expected {
            warn!(missing = expected - got, "some channels failed to read");
        }

        cycles += 1;
        if max_cycles.is_some_and(|max| cycles >= max) {
            return Ok(cycles);
        }

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}
