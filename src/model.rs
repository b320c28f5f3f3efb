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

//! Supported IT87x models and their per-model constants.
//!
//! Adding a chip means adding a variant and one row to [`MODELS`].

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ChipModel {
    It8512f,
    It8712f,
    It8716f,
    It8718f,
    It8720f,
    It8721f,
    It8726f,
    It8728f,
    It8752f,
    It8772e,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub model: ChipModel,
    pub id: u16,
    pub name: &'static str,
    /// Millivolts per ADC count
    pub voltage_gain: u8,
    /// Revisions below this only have 8-bit fan counters
    pub legacy_fan_counter_below: Option<u8>,
}

const fn spec(model: ChipModel, id: u16, name: &'static str, voltage_gain: u8) -> ModelSpec {
    ModelSpec { model, id, name, voltage_gain, legacy_fan_counter_below: None }
}

pub static MODELS: [ModelSpec; 10] = [
    spec(ChipModel::It8512f, 0x8512, "IT8512F", 16),
    ModelSpec {
        legacy_fan_counter_below: Some(8),
        ..spec(ChipModel::It8712f, 0x8712, "IT8712F", 16)
    },
    spec(ChipModel::It8716f, 0x8716, "IT8716F", 16),
    spec(ChipModel::It8718f, 0x8718, "IT8718F", 16),
    spec(ChipModel::It8720f, 0x8720, "IT8720F", 16),
    spec(ChipModel::It8721f, 0x8721, "IT8721F", 12),
    spec(ChipModel::It8726f, 0x8726, "IT8726F", 16),
    spec(ChipModel::It8728f, 0x8728, "IT8728F", 12),
    spec(ChipModel::It8752f, 0x8752, "IT8752F", 16),
    spec(ChipModel::It8772e, 0x8772, "IT8772E", 12),
];

pub const UNKNOWN_MODEL_NAME: &str = "unknown";

impl ChipModel {
    pub fn from_id(id: u16) -> Option<Self> {
        MODELS.iter().find(|m| m.id == id).map(|m| m.model)
    }

    pub fn spec(self) -> &'static ModelSpec {
        // rows are in variant order
        &MODELS[self as usize]
    }

    pub fn id(self) -> u16 {
        self.spec().id
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn voltage_gain(self) -> u8 {
        self.spec().voltage_gain
    }

    /// Whether the tachometers carry an extended high byte on this revision
    pub fn has_16bit_fan_counter(self, version: u8) -> bool {
        match self.spec().legacy_fan_counter_below {
            Some(min) => version >= min,
            None => true,
        }
    }
}

/// Model name for a raw chip ID, "unknown" if unsupported
pub fn model_name_for_id(id: u16) -> &'static str {
    ChipModel::from_id(id).map(ChipModel::name).unwrap_or(UNKNOWN_MODEL_NAME)
}
