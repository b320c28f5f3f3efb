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

use std::fs;
use std::path::Path;

const DMI_DIR: &str = "/sys/devices/virtual/dmi/id";
const PROC_MODULES: &str = "/proc/modules";

/// Kernel driver that also owns the IT87x environment controller
pub const IT87_KERNEL_MODULE: &str = "it87";

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

fn board_name_in(dmi_dir: &Path) -> String {
    let read_trim = |f: &str| -> Option<String> {
        fs::read_to_string(dmi_dir.join(f))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let vendor = read_trim("board_vendor");
    let name = read_trim("board_name");
    match (vendor, name) {
        (Some(v), Some(n)) => format!("{} {}", v, n),
        (Some(v), None) => v,
        (None, Some(n)) => n,
        (None, None) => read_trim("product_name").unwrap_or_default(),
    }
}

/// Motherboard vendor and name from DMI, empty if unavailable
pub fn read_board_name() -> String {
    board_name_in(Path::new(DMI_DIR))
}

/// Whether a /proc/modules listing contains `module`
pub fn modules_contain(listing: &str, module: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|name| name == module)
}

pub fn kernel_module_loaded(module: &str) -> bool {
    if let Ok(listing) = fs::read_to_string(PROC_MODULES) {
        return modules_contain(&listing, module);
    }
    Path::new("/sys/module").join(module).exists()
}
