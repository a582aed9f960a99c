/*
 *  display/error.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Error types for the display subsystem
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

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    /// A caller passed an arrow-mode code outside 0..=3.
    #[error("invalid arrow mode {0}: expected 0 (both), 1 (left glyph), 2 (right glyph) or 3 (none)")]
    InvalidArgument(i32),

    /// Opening the bus or addressing the device failed.
    #[error("display init failed: {0}")]
    Init(String),

    /// A bus write failed. The refresh task logs these and carries on.
    #[error("hardware I/O error: {0}")]
    HardwareIo(String),

    /// The refresh task did not observe its stop flag in time. This means a
    /// deadlock or a wedged bus, not a recoverable condition.
    #[error("refresh task failed to stop within {0:?}")]
    ShutdownTimeout(Duration),
}

impl From<linux_embedded_hal::I2CError> for DisplayError {
    fn from(err: linux_embedded_hal::I2CError) -> Self {
        DisplayError::HardwareIo(format!("{err:?}"))
    }
}
