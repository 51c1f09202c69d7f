/*
 *  wire.rs
 *
 *  alphalcd - lcdi2c driver bridge
 *  (c) 2024-26 the alphalcd developers
 *
 *  Command code decoding and request/response buffer marshalling. The
 *  32-bit ioctl code itself tells us how to shape the exchange: its
 *  sequence byte classifies the payload (character vs numeric) and its
 *  top two bits carry the transfer direction.
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

/// Direction flag: the command sends data to the driver.
pub const DIR_WRITE: u8 = 0b01;
/// Direction flag: the command expects data back from the driver.
pub const DIR_READ: u8 = 0b10;

/// Request buffer length for reads with no caller arguments. Sized for the
/// largest response shape, a 9-byte custom glyph definition.
pub const READ_BUFFER_LEN: usize = 9;

// Bit 1 of the sequence byte flags a character-class payload.
const SEQ_CHAR_CLASS: u8 = 0x02;

/// The four sub-fields packed into a 32-bit ioctl command code, matching
/// the kernel's `_IOC` layout. Derived fresh per call, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCommand {
    /// Bits 0-7: sequence/class marker.
    pub sequence: u8,
    /// Bits 8-15: type marker (informational).
    pub type_marker: u8,
    /// Bits 16-23: declared payload size (informational).
    pub payload_size: u8,
    /// Bits 30-31: direction flags, see [`DIR_WRITE`] and [`DIR_READ`].
    pub direction: u8,
}

impl DecodedCommand {
    /// Unpack a command code. Pure and total: any 32-bit input decodes,
    /// meaningful or not.
    pub fn decode(code: u32) -> Self {
        Self {
            sequence: (code & 0xff) as u8,
            type_marker: ((code >> 8) & 0xff) as u8,
            payload_size: ((code >> 16) & 0xff) as u8,
            direction: ((code >> 30) & 0x03) as u8,
        }
    }

    pub fn writes(&self) -> bool {
        self.direction & DIR_WRITE != 0
    }

    pub fn reads(&self) -> bool {
        self.direction & DIR_READ != 0
    }

    /// Character-class commands carry a flag or a character; numeric-class
    /// commands carry an explicit byte sequence.
    pub fn char_class(&self) -> bool {
        self.sequence & SEQ_CHAR_CLASS != 0
    }
}

/// Caller-supplied arguments, shape made explicit at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Args<'a> {
    None,
    /// Boolean flags, one `'1'`/`'0'` byte each on the wire.
    Flags(&'a [bool]),
    /// Literal character data.
    Text(&'a str),
    /// An explicit sequence of byte values (coordinates, glyph rows).
    Bytes(&'a [u8]),
}

/// Typed result of one dispatch. Which variant applies is decided by the
/// decoded command, not by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    None,
    Bool(bool),
    Char(char),
    Bytes(Vec<u8>),
}

/// Build the request buffer the driver expects for this command.
pub fn marshal(cmd: &DecodedCommand, args: &Args<'_>) -> Vec<u8> {
    if cmd.writes() {
        if cmd.char_class() {
            match args {
                // Canonical trigger value for no-arg commands (RESET, HOME, CLEAR).
                Args::None => vec![b'1'],
                Args::Flags(flags) => flags.iter().map(|&on| flag_byte(on)).collect(),
                Args::Text(text) => text.bytes().collect(),
                Args::Bytes(bytes) => bytes.to_vec(),
            }
        } else {
            match args {
                Args::Bytes(bytes) => bytes.to_vec(),
                Args::Text(text) => text.bytes().collect(),
                Args::Flags(flags) => flags.iter().map(|&on| on as u8).collect(),
                Args::None => Vec::new(),
            }
        }
    } else if cmd.reads() {
        // Pure read: space-filled default, replaced by argument bytes when
        // the caller selects what to read back (e.g. a glyph index).
        match args {
            Args::None => vec![b' '; READ_BUFFER_LEN],
            Args::Bytes(bytes) if bytes.is_empty() => vec![b' '; READ_BUFFER_LEN],
            Args::Bytes(bytes) => bytes.to_vec(),
            Args::Text(text) => text.bytes().collect(),
            Args::Flags(flags) => flags.iter().map(|&on| flag_byte(on)).collect(),
        }
    } else {
        // Neither direction bit: fire-and-forget, nothing to send.
        Vec::new()
    }
}

/// Convert the exchanged buffer back into a typed value. Only read-capable
/// commands produce one; `GETCHAR` is the single character-class read that
/// yields a character rather than a flag.
pub fn unmarshal(cmd: &DecodedCommand, name: &str, buf: &[u8]) -> Value {
    if !cmd.reads() {
        return Value::None;
    }
    if cmd.char_class() {
        let first = buf.first().copied().unwrap_or(0);
        if name == "GETCHAR" {
            Value::Char(first as char)
        } else {
            Value::Bool(first == b'1')
        }
    } else {
        // Full buffer as byte values; callers destructure a prefix and
        // silently discard the rest.
        Value::Bytes(buf.to_vec())
    }
}

fn flag_byte(on: bool) -> u8 {
    if on { b'1' } else { b'0' }
}
