//! Unit tests for the mock driver itself

use crate::driver::mock_driver::MockDriver;
use crate::driver::{Driver, PumpStatus};

#[test]
fn test_mock_records_calls_in_order() {
    let mut driver = MockDriver::new();
    driver.load().unwrap();
    let window = driver.create_window(320, 240).unwrap();
    driver.show_window(window).unwrap();
    driver.render(window).unwrap();
    driver.pump(window).unwrap();
    driver.hide_window(window).unwrap();
    driver.destroy_window(window).unwrap();

    let calls = driver.recorded_calls();
    assert_eq!(calls[0], "load");
    assert!(calls[1].starts_with("create_window 320x240"));
    assert_eq!(calls[2], format!("show_window {}", window));
    assert_eq!(calls[3], format!("render {}", window));
    assert_eq!(calls[4], format!("pump {}", window));
    assert_eq!(calls[5], format!("hide_window {}", window));
    assert_eq!(calls[6], format!("destroy_window {}", window));
}

#[test]
fn test_mock_handles_are_distinct() {
    let mut driver = MockDriver::new();
    let first = driver.create_window(100, 100).unwrap();
    let second = driver.create_window(100, 100).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_mock_load_failure() {
    let mut driver = MockDriver::new();
    driver.fail_load = Some("libhello missing".to_string());
    let result = driver.load();
    assert_eq!(result, Err("libhello missing".to_string()));
}

#[test]
fn test_mock_close_after_pumps() {
    let mut driver = MockDriver::new();
    driver.close_after_pumps = Some(3);
    let window = driver.create_window(100, 100).unwrap();

    assert_eq!(driver.pump(window).unwrap(), PumpStatus::Continue);
    assert_eq!(driver.pump(window).unwrap(), PumpStatus::Continue);
    assert_eq!(driver.pump(window).unwrap(), PumpStatus::CloseRequested);
}

#[test]
fn test_mock_render_failure() {
    let mut driver = MockDriver::new();
    driver.fail_render = Some(-13);
    let window = driver.create_window(100, 100).unwrap();
    assert_eq!(driver.render(window), Err(-13));
}

#[test]
fn test_mock_render_count_is_per_window() {
    let mut driver = MockDriver::new();
    let first = driver.create_window(100, 100).unwrap();
    let second = driver.create_window(100, 100).unwrap();

    driver.render(first).unwrap();
    driver.render(first).unwrap();
    driver.render(second).unwrap();

    assert_eq!(driver.render_count(first), 2);
    assert_eq!(driver.render_count(second), 1);
}

#[test]
fn test_records_survive_moving_the_driver() {
    let driver = MockDriver::new();
    let calls = driver.calls.clone();

    let mut boxed: Box<dyn Driver> = Box::new(driver);
    boxed.load().unwrap();

    assert_eq!(calls.lock().unwrap().as_slice(), ["load".to_string()]);
}
