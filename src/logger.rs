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

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directive
pub const LOG_ENV: &str = "IT87MON_LOG";
const FALLBACK_LOG_PATH: &str = "/tmp/it87mon_logs.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// JSON lines appended to a file
    File(PathBuf),
    Stderr,
    Off,
}

impl LogTarget {
    /// The TUI owns the terminal, so it only logs when asked to and never to stderr
    pub fn choose(logging: bool, interactive: bool, log_path: &Path) -> Self {
        match (logging, interactive) {
            (true, _) => LogTarget::File(log_path.to_path_buf()),
            (false, true) => LogTarget::Off,
            (false, false) => LogTarget::Stderr,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Open the log file, falling back to /tmp when the preferred path is unwritable
pub fn open_log_file(path: &Path) -> io::Result<(File, PathBuf)> {
    match open_append(path) {
        Ok(f) => Ok((f, path.to_path_buf())),
        Err(_) => {
            let fallback = PathBuf::from(FALLBACK_LOG_PATH);
            open_append(&fallback).map(|f| (f, fallback))
        }
    }
}

/// Install the global subscriber. Returns the file path in use, if any.
pub fn init_logging(target: &LogTarget) -> anyhow::Result<Option<PathBuf>> {
    match target {
        LogTarget::Off => Ok(None),
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .try_init()
                .map_err(|e| anyhow!(e))?;
            Ok(None)
        }
        LogTarget::File(path) => {
            let (file, used) = open_log_file(path)?;
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!(e))?;
            Ok(Some(used))
        }
    }
}
