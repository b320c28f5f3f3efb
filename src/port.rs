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

//! Raw byte-wide port I/O.
//!
//! On Linux the x86 I/O port space is exposed as `/dev/port`, where the file
//! offset is the port number. Root (CAP_SYS_RAWIO) is required to open it.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

pub const DEV_PORT_PATH: &str = "/dev/port";

/// Byte-wide access to an I/O port space
#[cfg_attr(test, mockall::automock)]
pub trait PortIo {
    fn inb(&mut self, port: u16) -> io::Result<u8>;
    fn outb(&mut self, port: u16, value: u8) -> io::Result<()>;
}

impl<P: PortIo + ?Sized> PortIo for &mut P {
    fn inb(&mut self, port: u16) -> io::Result<u8> {
        (**self).inb(port)
    }

    fn outb(&mut self, port: u16, value: u8) -> io::Result<()> {
        (**self).outb(port, value)
    }
}

impl<P: PortIo + ?Sized> PortIo for Box<P> {
    fn inb(&mut self, port: u16) -> io::Result<u8> {
        (**self).inb(port)
    }

    fn outb(&mut self, port: u16, value: u8) -> io::Result<()> {
        (**self).outb(port, value)
    }
}

/// Port I/O through the `/dev/port` character device
#[derive(Debug)]
pub struct DevPort {
    file: File,
    path: PathBuf,
}

impl DevPort {
    pub fn open() -> io::Result<Self> {
        Self::open_path(DEV_PORT_PATH)
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::PermissionDenied {
                    io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("{}: permission denied - need root", path.display()),
                    )
                } else {
                    e
                }
            })?;
        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PortIo for DevPort {
    fn inb(&mut self, port: u16) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.file.read_exact_at(&mut buf, u64::from(port))?;
        Ok(buf[0])
    }

    fn outb(&mut self, port: u16, value: u8) -> io::Result<()> {
        self.file.write_all_at(&[value], u64::from(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn port_file() -> NamedTempFile {
        let f = NamedTempFile::new().unwrap();
        f.as_file().set_len(0x1000).unwrap();
        f
    }

    #[test]
    fn test_dev_port_positional_io() {
        let f = port_file();
        let mut port = DevPort::open_path(f.path()).unwrap();

        port.outb(0x2e, 0x87).unwrap();
        port.outb(0x295, 0x58).unwrap();

        assert_eq!(port.inb(0x2e).unwrap(), 0x87);
        assert_eq!(port.inb(0x295).unwrap(), 0x58);
        assert_eq!(port.inb(0x2f).unwrap(), 0x00);
    }

    #[test]
    fn test_dev_port_read_past_end_fails() {
        let f = NamedTempFile::new().unwrap();
        let mut port = DevPort::open_path(f.path()).unwrap();
        assert!(port.inb(0x2e).is_err());
    }

    #[test]
    fn test_dev_port_missing_path() {
        let err = DevPort::open_path("/nonexistent/it87mon/port").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    fn select_and_read<P: PortIo>(mut io: P) -> io::Result<u8> {
        io.outb(0x4e, 0x07)?;
        io.inb(0x4f)
    }

    #[test]
    fn test_mut_ref_and_box_forward() {
        let mut mock = MockPortIo::new();
        mock.expect_outb().withf(|p, v| *p == 0x4e && *v == 0x07).times(2).returning(|_, _| Ok(()));
        mock.expect_inb().withf(|p| *p == 0x4f).times(2).returning(|_| Ok(0x04));

        assert_eq!(select_and_read(&mut mock).unwrap(), 0x04);

        let boxed: Box<dyn PortIo> = Box::new(mock);
        assert_eq!(select_and_read(boxed).unwrap(), 0x04);
    }
}
