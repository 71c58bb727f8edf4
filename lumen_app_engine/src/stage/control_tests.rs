//! Unit tests for controls
//!
//! Verifies open/tick/deactivate semantics against the recording mock driver.

use crate::driver::mock_driver::MockDriver;
use crate::driver::{BringUpStep, WindowHandle};
use crate::error::Error;
use crate::stage::WindowControl;

#[test]
fn test_open_creates_brings_up_then_shows() {
    let mut driver = MockDriver::new();
    let control = WindowControl::open(&mut driver, 800, 600).unwrap();

    assert!(control.is_active());
    assert_eq!(control.width(), 800);
    assert_eq!(control.height(), 600);

    // create_window first, then all 17 bring-up steps, then show_window
    let calls = driver.recorded_calls();
    assert!(calls[0].starts_with("create_window 800x600"));
    assert_eq!(driver.executed_steps().len(), 17);
    assert_eq!(
        calls.last().unwrap(),
        &format!("show_window {}", control.handle())
    );
}

#[test]
fn test_open_propagates_bring_up_failure() {
    let mut driver = MockDriver::new();
    driver.fail_at_step = Some((BringUpStep::CreatePipeline, -2));

    let result = WindowControl::open(&mut driver, 800, 600);

    match result {
        Err(Error::NativeCallFailed { call, code }) => {
            assert_eq!(call, "create_pipeline");
            assert_eq!(code, -2);
        }
        other => panic!("Expected NativeCallFailed, got {:?}", other.map(|_| ())),
    }

    // The window is never shown after a failed bring-up
    let calls = driver.recorded_calls();
    assert!(!calls.iter().any(|c| c.starts_with("show_window")));
}

#[test]
fn test_deactivate_is_idempotent() {
    let mut driver = MockDriver::new();
    let mut control = WindowControl::open(&mut driver, 100, 100).unwrap();

    control.deactivate();
    assert!(!control.is_active());

    // Second deactivation: still false, no error, no new driver call
    let calls_before = driver.recorded_calls().len();
    control.deactivate();
    assert!(!control.is_active());
    assert_eq!(driver.recorded_calls().len(), calls_before);
}

#[test]
fn test_tick_renders_then_pumps() {
    let mut driver = MockDriver::new();
    let mut control = WindowControl::open(&mut driver, 100, 100).unwrap();
    let window = control.handle();

    control.tick(&mut driver).unwrap();

    let calls = driver.recorded_calls();
    assert_eq!(calls[calls.len() - 2], format!("render {}", window));
    assert_eq!(calls[calls.len() - 1], format!("pump {}", window));
    assert!(control.is_active());
}

#[test]
fn test_close_request_destroys_native_window_and_deactivates() {
    let mut driver = MockDriver::new();
    driver.close_after_pumps = Some(1);
    let mut control = WindowControl::open(&mut driver, 100, 100).unwrap();
    let window = control.handle();

    control.tick(&mut driver).unwrap();

    assert!(!control.is_active());
    // Native teardown happens as part of handling the close request
    assert!(driver
        .recorded_calls()
        .contains(&format!("destroy_window {}", window)));
}

#[test]
fn test_tick_render_failure_is_propagated() {
    let mut driver = MockDriver::new();
    driver.fail_render = Some(-7);
    let mut control = WindowControl::open(&mut driver, 100, 100).unwrap();

    let result = control.tick(&mut driver);

    match result {
        Err(Error::NativeCallFailed { call, code }) => {
            assert_eq!(call, "render");
            assert_eq!(code, -7);
        }
        other => panic!("Expected NativeCallFailed, got {:?}", other),
    }
}

#[test]
fn test_handles_are_stable_across_ticks() {
    let mut driver = MockDriver::new();
    let mut control = WindowControl::open(&mut driver, 100, 100).unwrap();
    let window: WindowHandle = control.handle();

    for _ in 0..3 {
        control.tick(&mut driver).unwrap();
    }

    assert_eq!(control.handle(), window);
    assert_eq!(driver.render_count(window), 3);
}
