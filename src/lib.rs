/*
 *  lib.rs
 *
 *  alphalcd - lcdi2c driver bridge
 *  (c) 2024-26 the alphalcd developers
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

//! Userspace bridge for the `lcdi2c` alphanumeric LCD kernel driver.
//!
//! The driver publishes its capability set as text in sysfs rather than as
//! compiled headers. This crate reads that metadata once at startup, builds
//! an immutable command table, and then resolves every operation at runtime:
//! symbolic name -> 32-bit ioctl code -> bit-packed payload class and
//! direction -> marshalled buffer -> one syscall -> typed result.
//!
//! ```no_run
//! use alphalcd::Lcd;
//!
//! let mut lcd = Lcd::open(1, 0x27)?;
//! lcd.reset()?;
//! lcd.set_backlight(true)?;
//! lcd.paint("Welcome!\nSecond row")?;
//! # Ok::<(), alphalcd::LcdError>(())
//! ```

pub mod device;
pub mod lcd;
pub mod meta;
pub mod wire;

pub use device::{CharDev, LcdIo};
pub use lcd::{CUSTOM_GLYPH_ROWS, Lcd, LcdError, Op};
pub use meta::{CommandTable, DeviceGeometry, DeviceMeta, Intent, MetaError, META_PATH};
pub use wire::{Args, DecodedCommand, Value, DIR_READ, DIR_WRITE, READ_BUFFER_LEN};
