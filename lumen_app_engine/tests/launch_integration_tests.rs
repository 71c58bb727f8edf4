//! Integration tests for the launch path
//!
//! These tests drive the public API end to end with a scripted driver.
//! No GPU required.
//!
//! Run with: cargo test --test launch_integration_tests

use lumen_app_engine::lumen::driver::{
    BringUpStep, Driver, DriverResult, PumpStatus, WindowHandle,
};
use lumen_app_engine::lumen::{launch, launch_with, AppContext, Application, Config, Error};
use std::sync::{Arc, Mutex};

// ============================================================================
// SCRIPTED DRIVER
// ============================================================================

/// Driver that records every boundary call and closes each window after a
/// fixed number of pumps
struct ScriptedDriver {
    calls: Arc<Mutex<Vec<String>>>,
    close_after_pumps: u32,
    pumps: u32,
    fail_load: bool,
    next_window: u64,
}

impl ScriptedDriver {
    fn new(close_after_pumps: u32) -> (Self, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
                close_after_pumps,
                pumps: 0,
                fail_load: false,
                next_window: 0,
            },
            calls,
        )
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl Driver for ScriptedDriver {
    fn load(&mut self) -> Result<(), String> {
        self.record("load");
        if self.fail_load {
            return Err("scripted load failure".to_string());
        }
        Ok(())
    }

    fn create_window(&mut self, width: u32, height: u32) -> DriverResult<WindowHandle> {
        self.next_window += 1;
        self.record(format!("create_window {}x{}", width, height));
        Ok(WindowHandle::from_raw(self.next_window))
    }

    fn destroy_window(&mut self, window: WindowHandle) -> DriverResult<()> {
        self.record(format!("destroy_window {}", window));
        Ok(())
    }

    fn show_window(&mut self, window: WindowHandle) -> DriverResult<()> {
        self.record(format!("show_window {}", window));
        Ok(())
    }

    fn hide_window(&mut self, window: WindowHandle) -> DriverResult<()> {
        self.record(format!("hide_window {}", window));
        Ok(())
    }

    fn pump(&mut self, window: WindowHandle) -> DriverResult<PumpStatus> {
        self.record(format!("pump {}", window));
        self.pumps += 1;
        if self.pumps >= self.close_after_pumps {
            return Ok(PumpStatus::CloseRequested);
        }
        Ok(PumpStatus::Continue)
    }

    fn render(&mut self, window: WindowHandle) -> DriverResult<()> {
        self.record(format!("render {}", window));
        Ok(())
    }

    fn run_bring_up_step(&mut self, _window: WindowHandle, step: BringUpStep) -> DriverResult<()> {
        self.record(format!("step {}", step));
        Ok(())
    }
}

// ============================================================================
// TEST APPLICATIONS
// ============================================================================

/// Application that opens one window on start
#[derive(Default)]
struct WindowedApp;

impl Application for WindowedApp {
    fn start(&mut self, ctx: &mut AppContext) {
        ctx.open_window(1024, 768).unwrap();
    }
}

/// Application that opens nothing; the run must still terminate
#[derive(Default)]
struct EmptyApp;

impl Application for EmptyApp {
    fn start(&mut self, _ctx: &mut AppContext) {}
}

// ============================================================================
// LAUNCH TESTS
// ============================================================================

#[test]
fn test_integration_full_run() {
    let (driver, calls) = ScriptedDriver::new(3);

    launch::<WindowedApp>(Box::new(driver), Config { tick_rate: 100 }).unwrap();

    let calls = calls.lock().unwrap();

    // Start of the run: load, then the window bring-up in declared order
    assert_eq!(calls[0], "load");
    assert!(calls[1].starts_with("create_window 1024x768"));
    let steps: Vec<&str> = calls
        .iter()
        .filter_map(|c| c.strip_prefix("step "))
        .collect();
    let expected: Vec<String> = BringUpStep::SEQUENCE.iter().map(|s| s.to_string()).collect();
    assert_eq!(steps, expected);

    // Three passes ran before the close request was honored
    assert_eq!(calls.iter().filter(|c| c.starts_with("render")).count(), 3);
    assert_eq!(calls.iter().filter(|c| c.starts_with("pump")).count(), 3);

    // The closed window was torn down
    assert!(calls.iter().any(|c| c.starts_with("destroy_window")));
}

#[test]
fn test_integration_empty_application_terminates() {
    let (driver, calls) = ScriptedDriver::new(1);

    // An application that never populates the stage must not hang the loop
    launch::<EmptyApp>(Box::new(driver), Config::default()).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.as_slice(), ["load".to_string()]);
}

#[test]
fn test_integration_load_failure_aborts_launch() {
    let (mut driver, calls) = ScriptedDriver::new(1);
    driver.fail_load = true;

    let result = launch::<WindowedApp>(Box::new(driver), Config::default());

    assert!(matches!(result, Err(Error::NativeLoadFailed(_))));
    // Nothing besides the failed load reached the driver
    assert_eq!(calls.lock().unwrap().as_slice(), ["load".to_string()]);
}

#[test]
fn test_integration_factory_failure_aborts_launch() {
    let (driver, calls) = ScriptedDriver::new(1);

    let result = launch_with::<EmptyApp, _>(Box::new(driver), Config::default(), || {
        Err("construction refused".to_string())
    });

    assert!(matches!(result, Err(Error::InstantiationFailed(_))));
    assert_eq!(calls.lock().unwrap().as_slice(), ["load".to_string()]);
}
