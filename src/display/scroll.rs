/*
 *  display/scroll.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Text windowing for the 16x2 character LCD: computes which slice of the
 *  message is visible at a given scroll offset.
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

/// Both lines of the display, message on line 1 wrapping onto line 2.
pub const VIEWPORT_SIMPLE: usize = 32;
/// Line 1 only; line 2 carries the menu bar.
pub const VIEWPORT_MENU: usize = 16;
/// Blank gap between the end of a scrolling message and its repeated start.
pub const TRAILING_PAD: usize = 6;

/// Which navigation arrows the menu bar draws.
///
/// Codes match the original panel protocol: 0 both, 1 left glyph only,
/// 2 right glyph only, 3 neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowMode {
    Both,
    RightOnly,
    LeftOnly,
    None,
}

impl TryFrom<i32> for ArrowMode {
    type Error = DisplayError;

    fn try_from(code: i32) -> Result<Self, DisplayError> {
        match code {
            0 => Ok(ArrowMode::Both),
            1 => Ok(ArrowMode::RightOnly),
            2 => Ok(ArrowMode::LeftOnly),
            3 => Ok(ArrowMode::None),
            other => Err(DisplayError::InvalidArgument(other)),
        }
    }
}

/// The fixed 16-character second line shown in menu mode.
///
/// Layout: arrow or space, 4 spaces, `X` (cancel), 4 spaces, `V` (validate),
/// 4 spaces, arrow or space. The bar itself never scrolls.
pub fn menu_bar(arrow: ArrowMode) -> String {
    let left = matches!(arrow, ArrowMode::Both | ArrowMode::RightOnly);
    let right = matches!(arrow, ArrowMode::Both | ArrowMode::LeftOnly);
    format!(
        "{}    X    V    {}",
        if left { '<' } else { ' ' },
        if right { '>' } else { ' ' }
    )
}

/// Scroll position of a message, wrapping modulo `len + TRAILING_PAD`.
///
/// Owned by the refresh task; reset whenever the message content changes.
#[derive(Debug, Default)]
pub struct ScrollCursor {
    offset: usize,
}

impl ScrollCursor {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Step one position forward. A message that fits the viewport does not
    /// scroll, so the cursor stays pinned at zero.
    pub fn advance(&mut self, text_len: usize, width: usize, pad: usize) {
        if text_len <= width {
            self.offset = 0;
        } else {
            self.offset = (self.offset + 1) % (text_len + pad);
        }
    }
}

/// Compute the run of characters visible at `offset`, always exactly `width`
/// characters long.
///
/// Four regimes:
/// 1. the message fits: return it space-padded to `width`, any offset;
/// 2. the window lies inside the message: plain substring;
/// 3. the window runs off the end into the trailing pad: tail plus spaces;
/// 4. the window wraps past the pad: tail, remaining pad spaces, then the
///    start of the message again, giving the illusion of circular text.
pub fn window(text: &str, width: usize, offset: usize, pad: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len <= width {
        let mut out: String = chars.iter().collect();
        out.extend(std::iter::repeat(' ').take(width - len));
        return out;
    }

    let cycle = len + pad;
    let offset = offset % cycle;
    let upper = offset + width;

    if upper < len {
        chars[offset..upper].iter().collect()
    } else if upper < cycle {
        let mut out: String = chars[offset..].iter().collect();
        out.extend(std::iter::repeat(' ').take(width - (len - offset)));
        out
    } else {
        let mut out = String::with_capacity(width);
        if offset < len {
            out.extend(chars[offset..].iter());
            out.extend(std::iter::repeat(' ').take(pad));
        } else {
            out.extend(std::iter::repeat(' ').take(pad - (offset - len)));
        }
        let prefix = upper % cycle;
        out.extend(chars[..prefix].iter());
        out
    }
}
