//! Driver boundary - the abstract native graphics surface
//!
//! The core never talks to a graphics library directly. Everything native
//! (window create/destroy/show/hide, the per-tick event pump, frame
//! submission and the ordered bring-up steps) is declared here as a trait the
//! back-end crates implement. The core only defines call order and error
//! propagation, never the internals.
//!
//! All drivers are invoked from a single thread; implementations do not need
//! to be Send or Sync.

use std::fmt;

// Module declarations
mod bring_up;

#[cfg(test)]
pub mod mock_driver;

pub use bring_up::{bring_up, BringUpStep};

/// Raw result code returned across the native boundary (VkResult-style,
/// 0 means success). Non-zero codes are wrapped into
/// [`Error::NativeCallFailed`](crate::lumen::Error) by the core.
pub type NativeCode = i32;

/// Result type for raw driver calls
pub type DriverResult<T> = std::result::Result<T, NativeCode>;

/// Opaque handle to a native-backed window
///
/// The driver mints handles; the core never inspects them beyond identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(u64);

impl WindowHandle {
    /// Wrap a raw handle value minted by a driver
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Outcome of one per-tick event pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    /// Nothing of interest; keep ticking
    Continue,
    /// The user asked to close the window
    CloseRequested,
}

/// Abstract native boundary the core depends on but does not implement
///
/// Implemented by back-end crates (e.g., VulkanDriver). Tested in the core
/// against a recording mock.
pub trait Driver {
    /// Bind the native entry points (load the underlying graphics library).
    ///
    /// Must be called once before any other driver call. Failure is fatal to
    /// the launch; the error string describes what could not be loaded.
    fn load(&mut self) -> std::result::Result<(), String>;

    /// Create a native window of the given size (created hidden)
    fn create_window(&mut self, width: u32, height: u32) -> DriverResult<WindowHandle>;

    /// Destroy a native window and every resource brought up for it
    fn destroy_window(&mut self, window: WindowHandle) -> DriverResult<()>;

    /// Show a native window
    fn show_window(&mut self, window: WindowHandle) -> DriverResult<()>;

    /// Hide a native window
    fn hide_window(&mut self, window: WindowHandle) -> DriverResult<()>;

    /// Per-tick native update: pump the window's event queue
    ///
    /// Expected to be non-blocking or briefly blocking for at most one frame
    /// budget.
    fn pump(&mut self, window: WindowHandle) -> DriverResult<PumpStatus>;

    /// Per-tick frame submission for the window
    fn render(&mut self, window: WindowHandle) -> DriverResult<()>;

    /// Execute one named bring-up step for the window
    ///
    /// Steps arrive in the fixed order of [`BringUpStep::SEQUENCE`]; drivers
    /// may rely on that order and fail a step whose preconditions are missing.
    fn run_bring_up_step(&mut self, window: WindowHandle, step: BringUpStep) -> DriverResult<()>;
}
