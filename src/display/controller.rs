/*
 *  display/controller.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Shared display state, the background refresh task, and the controller
 *  facade the rest of the application talks to.
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

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex as TokMutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use crate::display::error::DisplayError;
use crate::display::scroll::{
    ArrowMode, ScrollCursor, TRAILING_PAD, VIEWPORT_MENU, VIEWPORT_SIMPLE, menu_bar, window,
};
use crate::display::traits::{
    BacklightSink, CMD_DISPLAY_NO_CURSOR, CMD_HOME, CMD_LINE2, CMD_TWO_LINE, TextSink,
};

/// The controller needs a beat for the command pair to latch.
const SETTLE: Duration = Duration::from_millis(50);

/// What the refresh task should currently be showing.
///
/// Writers replace `text`/`viewport`/`arrow` under the lock; the refresh task
/// only ever snapshots them under the same lock, so a torn pair is never
/// observed. The stop flag lives here too so one lock covers the whole
/// producer/consumer handshake.
struct DisplayState {
    text: String,
    viewport: usize,
    arrow: ArrowMode,
    stop_flag: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        DisplayState {
            text: String::new(),
            viewport: VIEWPORT_SIMPLE,
            arrow: ArrowMode::Both,
            stop_flag: false,
        }
    }
}

/// Facade over the LCD: buffered text via the refresh task, direct backlight
/// writes, and an explicit shutdown that joins the task.
///
/// The backlight is a runtime capability; a text-only panel passes `None`.
pub struct DisplayController {
    state: Arc<TokMutex<DisplayState>>,
    backlight: Option<TokMutex<Box<dyn BacklightSink>>>,
    refresh: Duration,
    task_handle: Option<JoinHandle<()>>,
}

impl DisplayController {
    /// Create the controller and start its refresh task immediately.
    pub fn new(
        text_sink: Box<dyn TextSink>,
        backlight: Option<Box<dyn BacklightSink>>,
        refresh: Duration,
    ) -> Self {
        let state = Arc::new(TokMutex::new(DisplayState::default()));
        let task_handle = tokio::spawn(refresh_loop(state.clone(), text_sink, refresh));
        Self {
            state,
            backlight: backlight.map(TokMutex::new),
            refresh,
            task_handle: Some(task_handle),
        }
    }

    /// Replace the message, full-width mode. Nothing is written here; the
    /// change becomes visible on the next refresh tick.
    pub async fn set_text(&self, text: &str) {
        let mut s = self.state.lock().await;
        s.text = text.to_string();
        s.viewport = VIEWPORT_SIMPLE;
        debug!("set_text: {:?}", s.text);
    }

    /// Replace the message, menu mode: the text scrolls on line 1 and line 2
    /// carries the cancel/validate bar with the requested arrows.
    pub async fn set_menu_text(&self, text: &str, arrow: ArrowMode) {
        let mut s = self.state.lock().await;
        s.text = text.to_string();
        s.viewport = VIEWPORT_MENU;
        s.arrow = arrow;
        debug!("set_menu_text: {:?} {:?}", s.text, arrow);
    }

    /// Program the RGB backlight right away, bypassing the render state.
    /// A panel without the backlight capability ignores the call.
    pub async fn set_color(&self, r: u8, g: u8, b: u8) -> Result<(), DisplayError> {
        match &self.backlight {
            Some(bl) => bl.lock().await.set_backlight(r, g, b),
            None => {
                debug!("no backlight capability, ignoring set_color({r},{g},{b})");
                Ok(())
            }
        }
    }

    /// Signal the refresh task to stop and wait for it to exit. Once this
    /// returns Ok, no further writes reach the hardware.
    pub async fn shutdown(&mut self) -> Result<(), DisplayError> {
        {
            let mut s = self.state.lock().await;
            s.stop_flag = true;
        }
        let Some(handle) = self.task_handle.take() else {
            return Ok(());
        };
        // The task observes the flag within one period; anything beyond a few
        // periods is a wedged bus or a deadlock.
        let grace = self.refresh.saturating_mul(5).max(Duration::from_secs(1));
        match timeout(grace, handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("refresh task join error: {e}");
                Ok(())
            }
            Err(_) => Err(DisplayError::ShutdownTimeout(grace)),
        }
    }
}

impl Drop for DisplayController {
    fn drop(&mut self) {
        // Callers are expected to shutdown() explicitly; this only covers a
        // controller dropped without one.
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
            debug!("DisplayController dropped, refresh task aborted");
        }
    }
}

/// The periodic repaint loop. Snapshots the shared state under the lock,
/// renders with the lock released, then sleeps one period.
async fn refresh_loop(
    state: Arc<TokMutex<DisplayState>>,
    mut sink: Box<dyn TextSink>,
    period: Duration,
) {
    let mut cursor = ScrollCursor::default();
    let mut last_text = String::new();
    loop {
        let (text, viewport, arrow) = {
            let s = state.lock().await;
            if s.stop_flag {
                info!("refresh task exiting");
                break;
            }
            (s.text.clone(), s.viewport, s.arrow)
        };

        // New content restarts the scroll from the left edge. Detected by
        // inequality, not a dirty flag, so writers stay trivial.
        if text != last_text {
            cursor.reset();
            last_text = text.clone();
        }

        if let Err(e) = render_tick(sink.as_mut(), &text, viewport, arrow, cursor.offset()).await {
            warn!("display refresh failed, skipping tick: {e}");
        }

        cursor.advance(text.chars().count(), viewport, TRAILING_PAD);
        sleep(period).await;
    }
}

/// Paint one frame: re-home, re-apply the display parameters, then write the
/// visible window (and the menu bar in menu mode).
async fn render_tick(
    sink: &mut dyn TextSink,
    text: &str,
    viewport: usize,
    arrow: ArrowMode,
    offset: usize,
) -> Result<(), DisplayError> {
    sink.send_command(CMD_HOME)?;
    sleep(SETTLE).await;
    sink.send_command(CMD_DISPLAY_NO_CURSOR)?;
    sink.send_command(CMD_TWO_LINE)?;
    sleep(SETTLE).await;

    let line = window(text, viewport, offset, TRAILING_PAD);
    if viewport == VIEWPORT_MENU {
        write_chars(sink, line.chars())?;
        sink.send_command(CMD_LINE2)?;
        write_chars(sink, menu_bar(arrow).chars())?;
    } else {
        // A 32-wide window covers both physical lines, split at 16.
        write_chars(sink, line.chars().take(VIEWPORT_MENU))?;
        sink.send_command(CMD_LINE2)?;
        write_chars(sink, line.chars().skip(VIEWPORT_MENU))?;
    }
    Ok(())
}

fn write_chars(
    sink: &mut dyn TextSink,
    chars: impl Iterator<Item = char>,
) -> Result<(), DisplayError> {
    for ch in chars {
        // One byte per cell: anything outside the device's 8-bit charset
        // renders as a replacement glyph rather than a truncated code point.
        let byte = if (ch as u32) <= 0xFF { ch as u8 } else { b'?' };
        sink.write_char(byte)?;
    }
    Ok(())
}
