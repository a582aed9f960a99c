/*
 *  display/drivers/grove.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Real hardware sinks for the Grove RGB LCD: an AiP31068-class text
 *  controller and a PCA9633-class RGB driver, each at its own I2C address.
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

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;

use crate::display::error::DisplayError;
use crate::display::traits::{BacklightSink, TextSink};

/// Control-byte prefix for commands on the text controller.
const REG_COMMAND: u8 = 0x80;
/// Control-byte prefix for character data.
const REG_DATA: u8 = 0x40;

/// Text channel of the LCD over /dev/i2c-N.
pub struct GroveTextLcd {
    i2c: I2cdev,
    address: u8,
}

impl GroveTextLcd {
    pub fn open(bus: &str, address: u8) -> Result<Self, DisplayError> {
        let i2c = I2cdev::new(bus)
            .map_err(|e| DisplayError::Init(format!("open {bus}: {e}")))?;
        Ok(Self { i2c, address })
    }
}

impl TextSink for GroveTextLcd {
    fn send_command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.i2c.write(self.address, &[REG_COMMAND, cmd])?;
        Ok(())
    }

    fn write_char(&mut self, ch: u8) -> Result<(), DisplayError> {
        self.i2c.write(self.address, &[REG_DATA, ch])?;
        Ok(())
    }
}

/// RGB backlight driver. Usually at 0x62, next to the text controller on the
/// same physical bus; the kernel serializes the two file handles.
pub struct GroveRgbBacklight {
    i2c: I2cdev,
    address: u8,
}

impl GroveRgbBacklight {
    pub fn open(bus: &str, address: u8) -> Result<Self, DisplayError> {
        let i2c = I2cdev::new(bus)
            .map_err(|e| DisplayError::Init(format!("open {bus}: {e}")))?;
        Ok(Self { i2c, address })
    }
}

impl BacklightSink for GroveRgbBacklight {
    fn set_backlight(&mut self, r: u8, g: u8, b: u8) -> Result<(), DisplayError> {
        // Fixed register sequence the driver chip expects; the order matters.
        for (reg, value) in [(0u8, 0u8), (1, 0), (0x08, 0xAA), (4, r), (3, g), (2, b)] {
            self.i2c.write(self.address, &[reg, value])?;
        }
        Ok(())
    }
}
