/*
 *  display/drivers/mod.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Sink implementations and the config-keyed factory
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

pub mod grove;
pub mod mock;

use log::info;

use crate::config::{Config, DriverKind};
use crate::display::error::DisplayError;
use crate::display::traits::{BacklightSink, TextSink};

/// Build the text and (optional) backlight sinks selected by the config.
pub fn sinks_from_config(
    cfg: &Config,
) -> Result<(Box<dyn TextSink>, Option<Box<dyn BacklightSink>>), DisplayError> {
    match cfg.driver() {
        DriverKind::Grove => {
            let bus = cfg.i2c_bus();
            let text = grove::GroveTextLcd::open(&bus, cfg.text_address())?;
            let backlight = match cfg.rgb_address() {
                Some(addr) => {
                    Some(Box::new(grove::GroveRgbBacklight::open(&bus, addr)?)
                        as Box<dyn BacklightSink>)
                }
                None => None,
            };
            info!(
                "grove LCD on {bus}, text 0x{:02x}, rgb {}",
                cfg.text_address(),
                cfg.rgb_address()
                    .map_or("absent".to_string(), |a| format!("0x{a:02x}"))
            );
            Ok((Box::new(text), backlight))
        }
        DriverKind::Mock => {
            info!("mock display sinks selected");
            let sink = mock::MockSink::new();
            Ok((Box::new(sink.clone()), Some(Box::new(sink))))
        }
    }
}
