/*
 *  display/drivers/mock.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Recording sink for testing without hardware
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

use std::sync::{Arc, Mutex};

use crate::display::error::DisplayError;
use crate::display::traits::{BacklightSink, CMD_HOME, CMD_LINE2, TextSink};

/// One recorded bus operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkOp {
    Command(u8),
    Char(u8),
    Backlight(u8, u8, u8),
}

/// Shared recorder state, inspectable from tests while a cloned sink is owned
/// by the refresh task.
#[derive(Debug, Default)]
pub struct MockSinkState {
    pub ops: Vec<SinkOp>,
    /// When set, every sink call fails with a HardwareIo error.
    pub fail_writes: bool,
}

/// Mock sink simulating both the text controller and the RGB driver.
///
/// Useful for unit tests, integration tests and desktop runs without a panel
/// attached. Clones share one op log.
#[derive(Clone, Default)]
pub struct MockSink {
    state: Arc<Mutex<MockSinkState>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<SinkOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn op_count(&self) -> usize {
        self.state.lock().unwrap().ops.len()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Reconstruct the rendered frames from the op log. A frame starts at a
    /// home command; characters before the line-2 advance belong to the top
    /// line, the rest to the bottom line. The last frame may be mid-write.
    pub fn frames(&self) -> Vec<(String, String)> {
        let mut frames = Vec::new();
        let mut current: Option<(String, String, bool)> = None;
        for op in self.state.lock().unwrap().ops.iter() {
            match *op {
                SinkOp::Command(CMD_HOME) => {
                    if let Some((top, bottom, _)) = current.take() {
                        frames.push((top, bottom));
                    }
                    current = Some((String::new(), String::new(), false));
                }
                SinkOp::Command(CMD_LINE2) => {
                    if let Some((_, _, on_line2)) = current.as_mut() {
                        *on_line2 = true;
                    }
                }
                SinkOp::Char(ch) => {
                    if let Some((top, bottom, on_line2)) = current.as_mut() {
                        if *on_line2 {
                            bottom.push(ch as char);
                        } else {
                            top.push(ch as char);
                        }
                    }
                }
                _ => {}
            }
        }
        if let Some((top, bottom, _)) = current.take() {
            frames.push((top, bottom));
        }
        frames
    }

    fn record(&self, op: SinkOp) -> Result<(), DisplayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(DisplayError::HardwareIo("injected failure".to_string()));
        }
        state.ops.push(op);
        Ok(())
    }
}

impl TextSink for MockSink {
    fn send_command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.record(SinkOp::Command(cmd))
    }

    fn write_char(&mut self, ch: u8) -> Result<(), DisplayError> {
        self.record(SinkOp::Char(ch))
    }
}

impl BacklightSink for MockSink {
    fn set_backlight(&mut self, r: u8, g: u8, b: u8) -> Result<(), DisplayError> {
        self.record(SinkOp::Backlight(r, g, b))
    }
}
