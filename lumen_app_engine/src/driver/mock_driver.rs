//! Mock driver for unit tests (no GPU or window system required)
//!
//! Records every boundary call in order and can inject failures at chosen
//! points, which lets the scheduler, the controls and the bring-up runner be
//! tested without a graphics back-end. The records live behind shared
//! handles so tests can keep reading them after the driver moves into an
//! `AppContext`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::driver::{BringUpStep, Driver, DriverResult, NativeCode, PumpStatus, WindowHandle};

/// Recording driver with failure injection
pub struct MockDriver {
    /// Chronological record of every boundary call
    pub calls: Arc<Mutex<Vec<String>>>,
    /// Timestamp of every render call (for pacing assertions)
    pub render_times: Arc<Mutex<Vec<Instant>>>,
    /// When set, load() fails with this message
    pub fail_load: Option<String>,
    /// When set, the given bring-up step fails with the given native code
    pub fail_at_step: Option<(BringUpStep, NativeCode)>,
    /// When set, every render fails with the given native code
    pub fail_render: Option<NativeCode>,
    /// When set, render sleeps this long (simulates a slow tick)
    pub render_delay: Option<Duration>,
    /// When set, a window's pump reports CloseRequested once it has been
    /// pumped this many times
    pub close_after_pumps: Option<u32>,
    pump_counts: HashMap<WindowHandle, u32>,
    next_window: u64,
}

impl MockDriver {
    /// Create a new mock driver that records calls and never fails
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            render_times: Arc::new(Mutex::new(Vec::new())),
            fail_load: None,
            fail_at_step: None,
            fail_render: None,
            render_delay: None,
            close_after_pumps: None,
            pump_counts: HashMap::new(),
            next_window: 0,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Snapshot of the recorded calls
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of the bring-up steps executed so far, in order
    pub fn executed_steps(&self) -> Vec<String> {
        executed_steps(&self.recorded_calls())
    }

    /// Number of render calls recorded for the given window
    pub fn render_count(&self, window: WindowHandle) -> usize {
        render_count(&self.recorded_calls(), window)
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the executed bring-up step names from a call record
pub fn executed_steps(calls: &[String]) -> Vec<String> {
    calls
        .iter()
        .filter_map(|call| call.strip_prefix("step "))
        .map(|s| s.to_string())
        .collect()
}

/// Count the render calls for one window in a call record
pub fn render_count(calls: &[String], window: WindowHandle) -> usize {
    let expected = format!("render {}", window);
    calls.iter().filter(|call| **call == expected).count()
}

impl Driver for MockDriver {
    fn load(&mut self) -> Result<(), String> {
        self.record("load".to_string());
        match &self.fail_load {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }

    fn create_window(&mut self, width: u32, height: u32) -> DriverResult<WindowHandle> {
        self.next_window += 1;
        let window = WindowHandle::from_raw(self.next_window);
        self.record(format!("create_window {}x{} -> {}", width, height, window));
        Ok(window)
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
        let count = self.pump_counts.entry(window).or_insert(0);
        *count += 1;
        if let Some(threshold) = self.close_after_pumps {
            if *count >= threshold {
                return Ok(PumpStatus::CloseRequested);
            }
        }
        Ok(PumpStatus::Continue)
    }

    fn render(&mut self, window: WindowHandle) -> DriverResult<()> {
        self.record(format!("render {}", window));
        self.render_times.lock().unwrap().push(Instant::now());
        if let Some(delay) = self.render_delay {
            std::thread::sleep(delay);
        }
        match self.fail_render {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn run_bring_up_step(&mut self, window: WindowHandle, step: BringUpStep) -> DriverResult<()> {
        if let Some((failing_step, code)) = self.fail_at_step {
            if failing_step == step {
                self.record(format!("failed step {} ({})", step, window));
                return Err(code);
            }
        }
        self.record(format!("step {}", step));
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_driver_tests.rs"]
mod tests;
