/*
 *  lcd.rs
 *
 *  alphalcd - lcdi2c driver bridge
 *  (c) 2024-26 the alphalcd developers
 *
 *  Dispatch façade: ties resolution, decoding and marshalling together
 *  around exactly one ioctl per invocation, and exposes the typed
 *  operation surface callers actually use.
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

use log::{debug, warn};
use thiserror::Error;

use crate::device::{CharDev, LcdIo};
use crate::meta::{CommandTable, DeviceGeometry, DeviceMeta, Intent, MetaError};
use crate::wire::{self, Args, DecodedCommand, Value};

/// Custom glyphs are 8 bitmap rows; on the wire they travel as 9 bytes,
/// glyph index first.
pub const CUSTOM_GLYPH_ROWS: usize = 8;

/// Error type for bridge construction and dispatch.
#[derive(Debug, Error)]
pub enum LcdError {
    /// The operation has no entry in the device's command table under
    /// either resolution tier. Distinguishable from a successful call that
    /// happens to return no value.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The driver classified this command differently than the typed
    /// accessor expects (e.g. a numeric result where a flag was due).
    #[error("{op} returned an unexpected result shape")]
    UnexpectedResult { op: &'static str },
    #[error("metadata error: {0}")]
    Meta(#[from] MetaError),
    /// The ioctl or write syscall itself failed. Propagated unmodified,
    /// no retry.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The named operations of the driver's surface. Each maps to a base token
/// the resolver expands per intent; names outside this set go through
/// [`Lcd::invoke_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Reset,
    Home,
    Clear,
    Position,
    Char,
    Cursor,
    Blink,
    Backlight,
    ScrollHz,
    CustomChar,
}

impl Op {
    /// Base token handed to the resolver.
    pub fn token(self) -> &'static str {
        match self {
            Op::Reset => "reset",
            Op::Home => "home",
            Op::Clear => "clear",
            Op::Position => "position",
            Op::Char => "char",
            Op::Cursor => "cursor",
            Op::Blink => "blink",
            Op::Backlight => "backlight",
            Op::ScrollHz => "scrollhz",
            Op::CustomChar => "customchar",
        }
    }
}

/// The bridge itself: one parsed metadata set plus one open device handle.
/// Strictly synchronous, no internal locking; wrap it yourself if several
/// threads must share one instance.
pub struct Lcd<IO: LcdIo> {
    io: IO,
    meta: DeviceMeta,
}

impl Lcd<CharDev> {
    /// Construct against the real driver: read the sysfs metadata, resolve
    /// the device node for the bus/address pair, open it.
    pub fn open(bus: u32, address: u16) -> Result<Self, LcdError> {
        let meta = DeviceMeta::from_sysfs()?;
        let path = CharDev::discover(bus, address)?;
        let dev = CharDev::open(&path)?;
        Ok(Self::new(dev, meta))
    }
}

impl<IO: LcdIo> Lcd<IO> {
    pub fn new(io: IO, meta: DeviceMeta) -> Self {
        Self { io, meta }
    }

    pub fn geometry(&self) -> &DeviceGeometry {
        &self.meta.geometry
    }

    pub fn commands(&self) -> &CommandTable {
        &self.meta.commands
    }

    /// Access the underlying device handle.
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Capability probe, no hardware access.
    pub fn supports(&self, op: Op, intent: Intent) -> bool {
        self.meta.commands.supports(op.token(), intent)
    }

    /// Resolve, decode, marshal, issue exactly one ioctl, unmarshal.
    pub fn invoke(&mut self, op: Op, intent: Intent, args: Args<'_>) -> Result<Value, LcdError> {
        self.invoke_token(op.token(), intent, args)
    }

    /// String-token twin of [`Lcd::invoke`] for command names outside the
    /// [`Op`] set; the table decides what the device responds to.
    pub fn invoke_token(
        &mut self,
        token: &str,
        intent: Intent,
        args: Args<'_>,
    ) -> Result<Value, LcdError> {
        let (name, code) = self
            .meta
            .commands
            .resolve(token, intent)
            .ok_or_else(|| LcdError::Unsupported(token.to_owned()))?;
        let cmd = DecodedCommand::decode(code);
        let mut buf = wire::marshal(&cmd, &args);
        debug!("{name} {code:#010x} dir {:02b}, request {buf:?}", cmd.direction);
        self.io.ioctl(code, &mut buf)?;
        Ok(wire::unmarshal(&cmd, name, &buf))
    }

    pub fn reset(&mut self) -> Result<(), LcdError> {
        self.trigger(Op::Reset)
    }

    /// Move the cursor to (0, 0).
    pub fn home(&mut self) -> Result<(), LcdError> {
        self.trigger(Op::Home)
    }

    /// Clear the display and go home.
    pub fn clear(&mut self) -> Result<(), LcdError> {
        self.trigger(Op::Clear)
    }

    /// Current cursor position as (column, row), zero-based.
    pub fn position(&mut self) -> Result<(u8, u8), LcdError> {
        match self.invoke(Op::Position, Intent::Get, Args::None)? {
            // Prefix of the response; trailing bytes are discarded.
            Value::Bytes(bytes) => Ok((
                bytes.first().copied().unwrap_or(0),
                bytes.get(1).copied().unwrap_or(0),
            )),
            _ => Err(LcdError::UnexpectedResult { op: "GETPOSITION" }),
        }
    }

    pub fn set_position(&mut self, col: u8, row: u8) -> Result<(), LcdError> {
        self.invoke(Op::Position, Intent::Set, Args::Bytes(&[col, row]))
            .map(drop)
    }

    /// Character under the cursor.
    pub fn char_at(&mut self) -> Result<char, LcdError> {
        match self.invoke(Op::Char, Intent::Get, Args::None)? {
            Value::Char(ch) => Ok(ch),
            _ => Err(LcdError::UnexpectedResult { op: "GETCHAR" }),
        }
    }

    /// Write one character at the cursor position.
    pub fn set_char(&mut self, ch: char) -> Result<(), LcdError> {
        let mut utf8 = [0u8; 4];
        self.invoke(Op::Char, Intent::Set, Args::Text(ch.encode_utf8(&mut utf8)))
            .map(drop)
    }

    pub fn cursor(&mut self) -> Result<bool, LcdError> {
        self.flag(Op::Cursor)
    }

    pub fn set_cursor(&mut self, visible: bool) -> Result<(), LcdError> {
        self.set_flag(Op::Cursor, visible)
    }

    pub fn blink(&mut self) -> Result<bool, LcdError> {
        self.flag(Op::Blink)
    }

    pub fn set_blink(&mut self, blink: bool) -> Result<(), LcdError> {
        self.set_flag(Op::Blink, blink)
    }

    pub fn backlight(&mut self) -> Result<bool, LcdError> {
        self.flag(Op::Backlight)
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), LcdError> {
        self.set_flag(Op::Backlight, on)
    }

    /// Scroll the whole display one column, right when `right` is true.
    /// Set-only toggle; resolved through the bare-name fallback tier.
    pub fn scroll_hz(&mut self, right: bool) -> Result<(), LcdError> {
        self.set_flag(Op::ScrollHz, right)
    }

    /// Read back the bitmap rows of custom glyph `index` (0..=7).
    pub fn custom_char(&mut self, index: u8) -> Result<[u8; CUSTOM_GLYPH_ROWS], LcdError> {
        check_glyph_index(index)?;
        // Full 9-byte selector: the driver reads the index from byte 0 and
        // writes the definition back over the same buffer.
        let mut sel = [0u8; CUSTOM_GLYPH_ROWS + 1];
        sel[0] = index;
        match self.invoke(Op::CustomChar, Intent::Get, Args::Bytes(&sel))? {
            Value::Bytes(bytes) => {
                // Response is [index, row0..row7].
                let mut rows = [0u8; CUSTOM_GLYPH_ROWS];
                for (dst, src) in rows.iter_mut().zip(bytes.iter().skip(1)) {
                    *dst = *src;
                }
                Ok(rows)
            }
            _ => Err(LcdError::UnexpectedResult { op: "GETCUSTOMCHAR" }),
        }
    }

    /// Define custom glyph `index` (0..=7) from 8 bitmap rows.
    pub fn set_custom_char(
        &mut self,
        index: u8,
        rows: [u8; CUSTOM_GLYPH_ROWS],
    ) -> Result<(), LcdError> {
        check_glyph_index(index)?;
        let mut def = [0u8; CUSTOM_GLYPH_ROWS + 1];
        def[0] = index;
        def[1..].copy_from_slice(&rows);
        self.invoke(Op::CustomChar, Intent::Set, Args::Bytes(&def))
            .map(drop)
    }

    /// Push text through the device's byte-stream path at the current
    /// cursor position.
    pub fn write(&mut self, text: &str) -> Result<(), LcdError> {
        self.io.write_str(text)?;
        self.io.flush()?;
        Ok(())
    }

    /// Line-oriented multi-row paint: each input line lands at column 0 of
    /// the next row. Lines beyond the declared geometry are dropped.
    pub fn paint(&mut self, text: &str) -> Result<(), LcdError> {
        let rows = self.meta.geometry.rows as usize;
        for (row, line) in text.lines().enumerate() {
            if row >= rows {
                warn!("paint: dropping line {row}, display has {rows} rows");
                break;
            }
            self.set_position(0, row as u8)?;
            self.io.write_str(line)?;
        }
        self.io.flush()?;
        Ok(())
    }

    fn trigger(&mut self, op: Op) -> Result<(), LcdError> {
        self.invoke(op, Intent::Set, Args::None).map(drop)
    }

    fn flag(&mut self, op: Op) -> Result<bool, LcdError> {
        match self.invoke(op, Intent::Get, Args::None)? {
            Value::Bool(v) => Ok(v),
            _ => Err(LcdError::UnexpectedResult { op: op.token() }),
        }
    }

    fn set_flag(&mut self, op: Op, on: bool) -> Result<(), LcdError> {
        self.invoke(op, Intent::Set, Args::Flags(&[on])).map(drop)
    }
}

fn check_glyph_index(index: u8) -> Result<(), LcdError> {
    if index as usize >= CUSTOM_GLYPH_ROWS {
        return Err(LcdError::InvalidArgument(format!(
            "custom glyph index {index} out of range 0..=7"
        )));
    }
    Ok(())
}
