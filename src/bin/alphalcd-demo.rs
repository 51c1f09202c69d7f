/*
 *  bin/alphalcd-demo.rs
 *
 *  alphalcd - lcdi2c driver bridge
 *  (c) 2024-26 the alphalcd developers
 *
 *  Small exerciser for the bridge: resets the display, paints text or a
 *  ticking wall clock with an animated heartbeat glyph.
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

use std::thread::sleep;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use env_logger::Env;
use log::info;

use alphalcd::Lcd;

// Heartbeat animation frames, one custom glyph redefined per tick.
const HEART_FRAMES: [[u8; 8]; 4] = [
    [0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x04, 0x04, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x0e, 0x0e, 0x04, 0x00, 0x00],
    [0x00, 0x00, 0x0a, 0x1f, 0x1f, 0x0e, 0x04, 0x00],
];
const HEART_GLYPH: u8 = 6;

#[derive(Debug, Parser)]
#[command(name = "alphalcd-demo", about = "Exercise an lcdi2c-driven LCD")]
struct Cli {
    /// I2C bus number the expander sits on
    #[arg(long, default_value_t = 1)]
    bus: u32,
    /// I2C device address
    #[arg(long, default_value_t = 0x27, value_parser = parse_address)]
    address: u16,
    /// Text to paint (rows separated by \n); default is a clock loop
    #[arg(long)]
    text: Option<String>,
    /// How long to run the clock loop
    #[arg(long, default_value_t = 30)]
    seconds: u64,
    /// Leave the backlight off
    #[arg(long)]
    no_backlight: bool,
    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
    match digits {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("bad i2c address {s:?}: {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        Env::default().default_filter_or(if cli.debug { "debug" } else { "info" }),
    )
    .format_timestamp_secs()
    .init();

    info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut lcd = Lcd::open(cli.bus, cli.address)
        .with_context(|| format!("bringing up LCD at bus {} address {:#04x}", cli.bus, cli.address))?;

    let geo = lcd.geometry().clone();
    info!("{} {}x{}", geo.topology, geo.columns, geo.rows);

    lcd.reset()?;
    lcd.clear()?;
    lcd.set_cursor(false)?;
    lcd.set_blink(false)?;
    lcd.set_backlight(!cli.no_backlight)?;

    if let Some(text) = cli.text.as_deref() {
        lcd.paint(text)?;
        return Ok(());
    }

    // Clock loop: time on row 0, heartbeat glyph on the last row.
    lcd.set_custom_char(HEART_GLYPH, HEART_FRAMES[0])?;
    lcd.set_position(0, geo.rows - 1)?;
    // Glyph 6 renders whatever SETCUSTOMCHAR last defined there.
    lcd.write("\u{0006}")?;

    let mut frame = 0usize;
    for tick in 0..cli.seconds * 4 {
        if tick % 4 == 0 {
            lcd.set_position(0, 0)?;
            lcd.write(&Local::now().format("%H:%M:%S").to_string())?;
        }
        lcd.set_custom_char(HEART_GLYPH, HEART_FRAMES[frame])?;
        frame = (frame + 1) % HEART_FRAMES.len();
        sleep(Duration::from_millis(250));
    }

    lcd.clear()?;
    lcd.set_backlight(false)?;
    Ok(())
}
