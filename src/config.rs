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

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::it87::{TACHOMETER_SENSORS, TEMPERATURE_SENSORS, VOLTAGE_SENSORS};
use crate::sensor::ChannelLabels;
use crate::superio::{ConfigPorts, CANDIDATE_PORTS};

pub const MIN_REFRESH_MS: u64 = 100;
pub const MAX_REFRESH_MS: u64 = 60_000;
const MAX_LABEL_LEN: usize = 64;

fn default_refresh_interval_ms() -> u64 { 1000 }

fn default_config_ports() -> Vec<u16> {
    CANDIDATE_PORTS.iter().map(|p| p.register).collect()
}

fn default_log_path() -> PathBuf { PathBuf::from("/var/log/it87mon.json") }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Configuration index ports to scan, in order; the data port is the next one up
    #[serde(default = "default_config_ports")]
    pub config_ports: Vec<u16>,
    #[serde(default)]
    pub labels: ChannelLabels,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            config_ports: default_config_ports(),
            labels: ChannelLabels::default(),
            log_path: default_log_path(),
        }
    }
}

impl MonitorConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn candidate_ports(&self) -> Vec<ConfigPorts> {
        self.config_ports.iter().map(|&p| ConfigPorts::new(p)).collect()
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("it87mon").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("it87mon")
            .join("config.json");
    }
    PathBuf::from("/etc/it87mon/config.json")
}

fn is_safe_label(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_LABEL_LEN { return false; }
    s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.' | '+' | '/' | ':' | '#'))
}

fn validate_labels(kind: &str, labels: &BTreeMap<usize, String>, limit: u8) -> Result<(), String> {
    for (idx, label) in labels {
        if *idx >= usize::from(limit) {
            return Err(format!("{} label index {} out of range (max {})", kind, idx, limit - 1));
        }
        if !is_safe_label(label) {
            return Err(format!("invalid {} label #{}", kind, idx));
        }
    }
    Ok(())
}

pub fn validate_config(cfg: &MonitorConfig) -> Result<(), String> {
    if !(MIN_REFRESH_MS..=MAX_REFRESH_MS).contains(&cfg.refresh_interval_ms) {
        return Err(format!(
            "refresh_interval_ms must be within {}..={}",
            MIN_REFRESH_MS, MAX_REFRESH_MS
        ));
    }

    if cfg.config_ports.is_empty() {
        return Err("config_ports must list at least one port".to_string());
    }
    if cfg.config_ports.len() > 4 {
        return Err("too many config_ports (max 4)".to_string());
    }
    for p in &cfg.config_ports {
        if *p == 0 || p % 2 != 0 || *p == u16::MAX {
            return Err(format!("invalid configuration port 0x{:x}", p));
        }
    }

    validate_labels("temperature", &cfg.labels.temperature_labels, TEMPERATURE_SENSORS)?;
    validate_labels("voltage", &cfg.labels.voltage_labels, VOLTAGE_SENSORS)?;
    validate_labels("fan", &cfg.labels.fan_labels, TACHOMETER_SENSORS)?;

    if !cfg.log_path.is_absolute() {
        return Err("log_path must be absolute".to_string());
    }
    Ok(())
}

pub fn load_config_from(path: &Path) -> Result<MonitorConfig, String> {
    let data = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let cfg: MonitorConfig = serde_json::from_str(&data).map_err(|e| format!("parse error: {}", e))?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Config from [`config_path`], or defaults when missing or invalid
pub fn load_config() -> MonitorConfig {
    let path = config_path();
    if !path.exists() {
        return MonitorConfig::default();
    }
    match load_config_from(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring config, using defaults");
            MonitorConfig::default()
        }
    }
}

pub fn save_config_to(cfg: &MonitorConfig, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path, json)?;
    let perms = fs::Permissions::from_mode(0o644);
    let _ = fs::set_permissions(path, perms);
    Ok(())
}
