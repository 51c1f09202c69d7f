/*
 *  meta.rs
 *
 *  alphalcd - lcdi2c driver bridge
 *  (c) 2024-26 the alphalcd developers
 *
 *  Parser for the driver's sysfs metadata attribute: device geometry
 *  plus the runtime-discovered ioctl command table.
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

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::Lines;

use log::{debug, info};
use thiserror::Error;

/// Canonical sysfs location of the driver's metadata attribute.
pub const META_PATH: &str = "/sys/class/alphalcd/lcdi2c/meta";

/// Error type for metadata loading. Any failure here is fatal: the bridge
/// never dispatches against a partial or defaulted command table.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata ended before the {0} line")]
    MissingHeader(&'static str),
    #[error("malformed {label} header: {line:?}")]
    MalformedHeader { label: &'static str, line: String },
    #[error("{field} must be a base-10 integer >= 1, got {value:?}")]
    BadDimension { field: &'static str, value: String },
    #[error("malformed ioctl entry {0:?} (expected NAME=0xHEX)")]
    MalformedEntry(String),
    #[error("ioctl {name} carries a malformed command code {value:?}")]
    BadCode { name: String, value: String },
}

/// Geometry and wiring the driver declares for the attached display.
/// Read once at startup, informational to callers; only `rows` feeds back
/// into the bridge itself (multi-row paint).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGeometry {
    /// Topology identifier as published, e.g. `LCD_20x4=3`.
    pub topology: String,
    pub rows: u8,
    pub columns: u8,
    /// Row start addresses, e.g. `R[0]=0x00 R[1]=0x40 ...`. Kept opaque.
    pub row_addresses: String,
    /// Expander pin assignment, e.g. `RS=0 RW=1 E=2 ...`. Kept opaque.
    pub pins: String,
}

/// Whether a resolution is for the read or the write side of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Get,
    Set,
}

/// Immutable name -> 32-bit ioctl code mapping, keys upper-cased.
/// Built once by [`DeviceMeta::parse`]; safe to share for concurrent
/// read-only lookups.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: HashMap<String, u32>,
}

impl CommandTable {
    /// Exact lookup by upper-cased command name.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }

    /// Two-tier resolution: a `SET`/`GET`-prefixed entry wins, a bare entry
    /// is the fallback. The fallback carries the toggle-style commands that
    /// are not accessor-prefixed (SCROLLHZ) and the no-arg triggers
    /// (RESET, HOME, CLEAR).
    pub fn resolve(&self, token: &str, intent: Intent) -> Option<(&str, u32)> {
        let bare = token.to_ascii_uppercase();
        let prefixed = match intent {
            Intent::Set => format!("SET{bare}"),
            Intent::Get => format!("GET{bare}"),
        };
        self.lookup(&prefixed).or_else(|| self.lookup(&bare))
    }

    /// Capability probe: can `token` be resolved for `intent`? Never touches
    /// the hardware.
    pub fn supports(&self, token: &str, intent: Intent) -> bool {
        self.resolve(token, intent).is_some()
    }

    fn lookup(&self, name: &str) -> Option<(&str, u32)> {
        self.entries
            .get_key_value(name)
            .map(|(name, code)| (name.as_str(), *code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, code)| (name.as_str(), *code))
    }
}

/// The parsed metadata: declared geometry plus the command table.
#[derive(Debug, Clone)]
pub struct DeviceMeta {
    pub geometry: DeviceGeometry,
    pub commands: CommandTable,
}

impl DeviceMeta {
    /// Parse the driver's metadata text. Format is fixed: five `label:value`
    /// header lines (topology, rows, columns, row addresses, pins), one
    /// `IOCTLS:` separator, then one `NAME=0xHEX` entry per line.
    pub fn parse(text: &str) -> Result<Self, MetaError> {
        let mut lines = text.lines();

        let topology = header_value(&mut lines, "Topology")?.to_owned();
        let rows = parse_dimension(header_value(&mut lines, "Rows")?, "Rows")?;
        let columns = parse_dimension(header_value(&mut lines, "Columns")?, "Columns")?;
        let row_addresses = header_value(&mut lines, "Rows addresses")?.to_owned();
        let pins = header_value(&mut lines, "Pins")?.to_owned();

        // Separator between the geometry block and the command entries.
        lines.next().ok_or(MetaError::MissingHeader("IOCTLS"))?;

        let mut entries = HashMap::new();
        for line in lines {
            // The driver emits entries with a leading tab.
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once('=')
                .ok_or_else(|| MetaError::MalformedEntry(line.to_owned()))?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return Err(MetaError::MalformedEntry(line.to_owned()));
            }
            let name = name.to_ascii_uppercase();
            let digits = value
                .strip_prefix("0x")
                .or_else(|| value.strip_prefix("0X"))
                .unwrap_or(value);
            let code = u32::from_str_radix(digits, 16).map_err(|_| MetaError::BadCode {
                name: name.clone(),
                value: value.to_owned(),
            })?;
            debug!("ioctl {name} = {code:#010x}");
            entries.insert(name, code);
        }

        info!(
            "metadata: {} {}x{} with {} ioctls",
            topology,
            columns,
            rows,
            entries.len()
        );

        Ok(Self {
            geometry: DeviceGeometry {
                topology,
                rows,
                columns,
                row_addresses,
                pins,
            },
            commands: CommandTable { entries },
        })
    }

    /// Read and parse the metadata from an arbitrary file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetaError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Read and parse the metadata from the driver's canonical sysfs
    /// location, [`META_PATH`].
    pub fn from_sysfs() -> Result<Self, MetaError> {
        Self::from_file(META_PATH)
    }
}

fn header_value<'a>(lines: &mut Lines<'a>, label: &'static str) -> Result<&'a str, MetaError> {
    let line = lines.next().ok_or(MetaError::MissingHeader(label))?;
    let (key, value) = line.split_once(':').ok_or_else(|| MetaError::MalformedHeader {
        label,
        line: line.to_owned(),
    })?;
    if !key.trim().eq_ignore_ascii_case(label) {
        return Err(MetaError::MalformedHeader {
            label,
            line: line.to_owned(),
        });
    }
    Ok(value.trim())
}

fn parse_dimension(value: &str, field: &'static str) -> Result<u8, MetaError> {
    match value.parse::<u8>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(MetaError::BadDimension {
            field,
            value: value.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META_20X4: &str = "Topology:LCD_20x4=3\n\
        Rows:4\n\
        Columns:20\n\
        Rows addresses:R[0]=0x00 R[1]=0x40 R[2]=0x14 R[3]=0x54 \n\
        Pins:RS=0 RW=1 E=2 BCKLIGHT=3 D[4]=4 D[5]=5 D[6]=6 D[7]=7\n\
        IOCTLS:\n\
        \tGETCHAR=0x8004F506\n\
        \tSETCHAR=0x4004F506\n\
        \tGETPOSITION=0x8004F509\n\
        \tSETPOSITION=0x4004F509\n\
        \tRESET=0x4004F50E\n\
        \tHOME=0x4004F512\n\
        \tSETBACKLIGHT=0x4004F516\n\
        \tGETBACKLIGHT=0x8004F516\n\
        \tSETCURSOR=0x4004F51A\n\
        \tGETCURSOR=0x8004F51A\n\
        \tSETBLINK=0x4004F51E\n\
        \tGETBLINK=0x8004F51E\n\
        \tSCROLLHZ=0x4004F522\n\
        \tSETCUSTOMCHAR=0x4004F525\n\
        \tGETCUSTOMCHAR=0x8004F525\n\
        \tCLEAR=0x4004F52A\n";

    #[test]
    fn test_parse_geometry() {
        let meta = DeviceMeta::parse(META_20X4).unwrap();
        assert_eq!(meta.geometry.topology, "LCD_20x4=3");
        assert_eq!(meta.geometry.rows, 4);
        assert_eq!(meta.geometry.columns, 20);
        assert!(meta.geometry.row_addresses.starts_with("R[0]=0x00"));
        assert!(meta.geometry.pins.contains("BCKLIGHT=3"));
    }

    #[test]
    fn test_every_listed_name_resolves_to_its_code() {
        let meta = DeviceMeta::parse(META_20X4).unwrap();
        assert_eq!(meta.commands.len(), 16);
        for line in META_20X4.lines().skip(6) {
            let (name, value) = line.trim().split_once('=').unwrap();
            let code = u32::from_str_radix(value.trim_start_matches("0x"), 16).unwrap();
            // Recorded intent: SETxxx resolves as a write, GETxxx as a read,
            // bare names resolve through the fallback tier of either intent.
            let (token, intent) = if let Some(base) = name.strip_prefix("SET") {
                (base, Intent::Set)
            } else if let Some(base) = name.strip_prefix("GET") {
                (base, Intent::Get)
            } else {
                (name, Intent::Set)
            };
            let (resolved, resolved_code) = meta.commands.resolve(token, intent).unwrap();
            assert_eq!(resolved, name);
            assert_eq!(resolved_code, code);
        }
    }

    #[test]
    fn test_fallback_tier_for_bare_toggle() {
        let meta = DeviceMeta::parse(META_20X4).unwrap();
        // No SETSCROLLHZ exists; a write-intent resolve of the lower-case
        // token must land on the bare SCROLLHZ entry.
        let (name, code) = meta.commands.resolve("scrollhz", Intent::Set).unwrap();
        assert_eq!(name, "SCROLLHZ");
        assert_eq!(code, 0x4004F522);
    }

    #[test]
    fn test_prefixed_entry_shadows_bare_one() {
        let text = format!("{META_20X4}\tBACKLIGHT=0x4004F5FF\n");
        let meta = DeviceMeta::parse(&text).unwrap();
        let (name, code) = meta.commands.resolve("backlight", Intent::Set).unwrap();
        assert_eq!(name, "SETBACKLIGHT");
        assert_eq!(code, 0x4004F516);
    }

    #[test]
    fn test_unknown_token_is_not_resolvable() {
        let meta = DeviceMeta::parse(META_20X4).unwrap();
        assert!(meta.commands.resolve("levitate", Intent::Set).is_none());
        assert!(meta.commands.resolve("levitate", Intent::Get).is_none());
        assert!(!meta.commands.supports("levitate", Intent::Set));
        assert!(meta.commands.supports("position", Intent::Get));
    }

    #[test]
    fn test_truncated_header_is_fatal() {
        let err = DeviceMeta::parse("Topology:LCD_16x2=1\nRows:2\n").unwrap_err();
        assert!(matches!(err, MetaError::MissingHeader("Columns")));
    }

    #[test]
    fn test_wrong_header_label_is_fatal() {
        let text = META_20X4.replace("Columns:", "Cols:");
        let err = DeviceMeta::parse(&text).unwrap_err();
        assert!(matches!(err, MetaError::MalformedHeader { label: "Columns", .. }));
    }

    #[test]
    fn test_rows_must_be_base10_and_nonzero() {
        let err = DeviceMeta::parse(&META_20X4.replace("Rows:4", "Rows:0x4")).unwrap_err();
        assert!(matches!(err, MetaError::BadDimension { field: "Rows", .. }));
        let err = DeviceMeta::parse(&META_20X4.replace("Rows:4", "Rows:0")).unwrap_err();
        assert!(matches!(err, MetaError::BadDimension { field: "Rows", .. }));
    }

    #[test]
    fn test_malformed_ioctl_entry_is_fatal() {
        let text = format!("{META_20X4}\tGETVERSION\n");
        assert!(matches!(
            DeviceMeta::parse(&text).unwrap_err(),
            MetaError::MalformedEntry(_)
        ));
    }

    #[test]
    fn test_bad_hex_code_is_fatal() {
        let text = format!("{META_20X4}\tGETVERSION=0xZZZZ\n");
        match DeviceMeta::parse(&text).unwrap_err() {
            MetaError::BadCode { name, value } => {
                assert_eq!(name, "GETVERSION");
                assert_eq!(value, "0xZZZZ");
            }
            other => panic!("expected BadCode, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_names_are_case_normalized() {
        let text = format!("{META_20X4}\tgetversion=0x8004F542\n");
        let meta = DeviceMeta::parse(&text).unwrap();
        assert_eq!(meta.commands.get("GETVERSION"), Some(0x8004F542));
        let (name, _) = meta.commands.resolve("version", Intent::Get).unwrap();
        assert_eq!(name, "GETVERSION");
    }
}
