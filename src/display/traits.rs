/*
 *  display/traits.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Hardware sink capabilities consumed by the display core
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

use crate::display::error::DisplayError;

/// Wipe the whole display.
pub const CMD_CLEAR: u8 = 0x01;
/// Return the cursor to the top-left cell.
pub const CMD_HOME: u8 = 0x02;
/// Display on, cursor and blink off.
pub const CMD_DISPLAY_NO_CURSOR: u8 = 0x08 | 0x04;
/// Two-line function set.
pub const CMD_TWO_LINE: u8 = 0x28;
/// Advance the cursor to the start of line 2.
pub const CMD_LINE2: u8 = 0xC0;

/// Character/command channel of the LCD. The device is forgetful between
/// writes, so the refresh task re-issues the mode commands every tick.
pub trait TextSink: Send {
    /// Issue a control command (see the `CMD_*` constants).
    fn send_command(&mut self, cmd: u8) -> Result<(), DisplayError>;

    /// Write one displayable character at the cursor position. The device
    /// charset is 8-bit; callers map anything wider before handing it over.
    fn write_char(&mut self, ch: u8) -> Result<(), DisplayError>;
}

/// RGB backlight channel. Optional: a panel without the RGB driver simply
/// carries no `BacklightSink`.
pub trait BacklightSink: Send {
    fn set_backlight(&mut self, r: u8, g: u8, b: u8) -> Result<(), DisplayError>;
}
