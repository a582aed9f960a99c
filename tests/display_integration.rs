/*
 *  tests/display_integration.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  End-to-end checks of the display controller against recording sinks.
 */

use std::time::Duration;

use pumphouse::display::drivers::mock::{MockSink, SinkOp};
use pumphouse::display::scroll::{TRAILING_PAD, VIEWPORT_SIMPLE, window};
use pumphouse::display::traits::{CMD_DISPLAY_NO_CURSOR, CMD_HOME, CMD_LINE2, CMD_TWO_LINE};
use pumphouse::display::{ArrowMode, DisplayController};

const TICK: Duration = Duration::from_millis(20);

fn new_controller() -> (DisplayController, MockSink) {
    let sink = MockSink::new();
    let ctl = DisplayController::new(
        Box::new(sink.clone()),
        Some(Box::new(sink.clone())),
        TICK,
    );
    (ctl, sink)
}

/// Each render tick settles for ~100ms on top of the refresh period, so give
/// the task room for a handful of frames.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(900)).await;
}

fn split_simple_window(text: &str, offset: usize) -> (String, String) {
    let win = window(text, VIEWPORT_SIMPLE, offset, TRAILING_PAD);
    let top: String = win.chars().take(16).collect();
    let bottom: String = win.chars().skip(16).collect();
    (top, bottom)
}

#[tokio::test]
async fn text_becomes_visible_within_a_tick() {
    let (mut ctl, sink) = new_controller();
    ctl.set_text("Hello").await;
    settle().await;
    ctl.shutdown().await.unwrap();

    let expected = (format!("Hello{}", " ".repeat(11)), " ".repeat(16));
    let frames = sink.frames();
    assert!(
        frames.contains(&expected),
        "no frame matched {expected:?}: {frames:?}"
    );
    // Fitting text never scrolls: every Hello frame is identical.
    for frame in frames.iter().filter(|f| f.0.starts_with("Hello")) {
        assert_eq!(frame, &expected);
    }
}

#[tokio::test]
async fn frames_reapply_display_parameters_and_split_lines() {
    let (mut ctl, sink) = new_controller();
    ctl.set_text("Hello").await;
    settle().await;
    ctl.shutdown().await.unwrap();

    // Every frame re-homes and re-issues the mode commands, then writes
    // 16 chars, the line-2 advance, and 16 more chars.
    let ops = sink.ops();
    let homes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| **op == SinkOp::Command(CMD_HOME))
        .map(|(i, _)| i)
        .collect();
    assert!(homes.len() >= 2, "expected several frames, got {ops:?}");

    let start = homes[0];
    assert_eq!(ops[start + 1], SinkOp::Command(CMD_DISPLAY_NO_CURSOR));
    assert_eq!(ops[start + 2], SinkOp::Command(CMD_TWO_LINE));
    let body: Vec<SinkOp> = ops[start + 3..start + 3 + 33].to_vec();
    assert!(body[..16].iter().all(|op| matches!(op, SinkOp::Char(_))));
    assert_eq!(body[16], SinkOp::Command(CMD_LINE2));
    assert!(body[17..].iter().all(|op| matches!(op, SinkOp::Char(_))));
}

#[tokio::test]
async fn wide_chars_render_as_replacement_glyph() {
    let (mut ctl, sink) = new_controller();
    // é fits the 8-bit charset and passes through; € does not.
    ctl.set_text("café €5").await;
    settle().await;
    ctl.shutdown().await.unwrap();

    let expected = (format!("café ?5{}", " ".repeat(9)), " ".repeat(16));
    let frames = sink.frames();
    assert!(
        frames.contains(&expected),
        "no frame matched {expected:?}: {frames:?}"
    );
}

#[tokio::test]
async fn menu_mode_renders_static_bar_on_line_two() {
    let (mut ctl, sink) = new_controller();
    ctl.set_menu_text("Save?", ArrowMode::RightOnly).await;
    settle().await;
    ctl.shutdown().await.unwrap();

    let expected = (
        format!("Save?{}", " ".repeat(11)),
        "<    X    V     ".to_string(),
    );
    let frames = sink.frames();
    assert!(
        frames.contains(&expected),
        "no frame matched {expected:?}: {frames:?}"
    );
}

#[tokio::test]
async fn long_text_scrolls_one_column_per_tick() {
    let text = "This is a very long scrolling message for the panel";
    let (mut ctl, sink) = new_controller();
    ctl.set_text(text).await;
    settle().await;
    ctl.shutdown().await.unwrap();

    let frames = sink.frames();
    let first = split_simple_window(text, 0);
    let pos = frames
        .iter()
        .position(|f| f == &first)
        .unwrap_or_else(|| panic!("offset-0 frame missing: {frames:?}"));
    assert_eq!(frames[pos + 1], split_simple_window(text, 1));
    assert_eq!(frames[pos + 2], split_simple_window(text, 2));
}

#[tokio::test]
async fn changed_text_restarts_the_scroll() {
    let first = "first message that overflows the thirty-two cells";
    let second = "second message that also overflows thirty-two cells";
    let (mut ctl, sink) = new_controller();
    ctl.set_text(first).await;
    settle().await;
    ctl.set_text(second).await;
    settle().await;
    ctl.shutdown().await.unwrap();

    // The first frame showing the new message must start at offset 0 even
    // though the old one had already scrolled away from it.
    let frames = sink.frames();
    let switch = frames
        .iter()
        .position(|f| f.0.starts_with("second message t"))
        .unwrap_or_else(|| panic!("new message never rendered: {frames:?}"));
    assert_eq!(frames[switch], split_simple_window(second, 0));
}

#[tokio::test]
async fn no_writes_after_shutdown() {
    let (mut ctl, sink) = new_controller();
    ctl.set_text("Hello").await;
    settle().await;
    ctl.shutdown().await.unwrap();

    let count = sink.op_count();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(sink.op_count(), count);
}

#[tokio::test]
async fn refresh_survives_hardware_failures() {
    let (mut ctl, sink) = new_controller();
    ctl.set_text("Hello").await;
    settle().await;

    sink.set_fail_writes(true);
    tokio::time::sleep(Duration::from_millis(400)).await;
    let during = sink.op_count();
    sink.set_fail_writes(false);
    settle().await;

    // The loop kept ticking through the failures and resumed rendering.
    assert!(sink.op_count() > during);
    // Shutdown is still reachable while the sink misbehaves.
    sink.set_fail_writes(true);
    ctl.shutdown().await.unwrap();
}

#[tokio::test]
async fn set_color_writes_through_immediately() {
    let (mut ctl, sink) = new_controller();
    ctl.set_color(9, 8, 7).await.unwrap();
    assert!(sink.ops().contains(&SinkOp::Backlight(9, 8, 7)));
    ctl.shutdown().await.unwrap();
}

#[tokio::test]
async fn set_color_without_backlight_is_a_no_op() {
    let sink = MockSink::new();
    let mut ctl = DisplayController::new(Box::new(sink.clone()), None, TICK);
    ctl.set_color(1, 2, 3).await.unwrap();
    assert!(!sink.ops().iter().any(|op| matches!(op, SinkOp::Backlight(..))));
    ctl.shutdown().await.unwrap();
}
