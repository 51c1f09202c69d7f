/*
 *  device.rs
 *
 *  alphalcd - lcdi2c driver bridge
 *  (c) 2024-26 the alphalcd developers
 *
 *  The device handle seam: sysfs discovery of the driver's character
 *  device node and the raw ioctl/write plumbing against it.
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use log::{debug, info};

/// Byte-level access to the LCD device. The façade dispatches through this
/// trait only, so tests substitute a scripted implementation for the real
/// character device.
pub trait LcdIo {
    /// Issue one ioctl with an in-place buffer exchange: `buf` is sent and,
    /// for read-capable commands, overwritten with the response.
    fn ioctl(&mut self, code: u32, buf: &mut [u8]) -> io::Result<()>;

    /// Push text through the device's byte-stream write path (paints at the
    /// current cursor position).
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// The real driver endpoint: an open handle on `/dev/lcdi2c`.
#[derive(Debug)]
pub struct CharDev {
    path: PathBuf,
    file: File,
}

impl CharDev {
    /// Resolve the device node for an I2C bus/address pair via sysfs,
    /// e.g. `(1, 0x27)` -> `/dev/lcdi2c`.
    pub fn discover(bus: u32, address: u16) -> io::Result<PathBuf> {
        let name_attr = format!("/sys/bus/i2c/devices/{bus}-{address:04x}/name");
        let name = fs::read_to_string(&name_attr).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("no device at i2c bus {bus} address {address:#04x} ({name_attr}): {err}"),
            )
        })?;
        Ok(PathBuf::from(format!("/dev/{}", name.trim())))
    }

    /// Open the device node read-write.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        info!("opened LCD device {}", path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LcdIo for CharDev {
    fn ioctl(&mut self, code: u32, buf: &mut [u8]) -> io::Result<()> {
        debug!("ioctl {code:#010x}, {} byte buffer", buf.len());
        // One blocking syscall; the driver exchanges the buffer in place.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                code as libc::c_ulong,
                buf.as_mut_ptr(),
            )
        };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
