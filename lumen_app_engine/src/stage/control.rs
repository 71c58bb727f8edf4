//! Controls - the polymorphic units participating in the per-tick lifecycle
//!
//! The control kinds are a closed enum dispatched by match rather than trait
//! objects that would need downcasting on every pass. Only one kind exists
//! today: a native-backed graphics window.

use crate::driver::{bring_up, Driver, PumpStatus, WindowHandle};
use crate::error::{Error, Result};
use crate::{lumen_debug, lumen_info, lumen_warn};

/// Closed set of control kinds
pub enum Control {
    /// A native-backed graphics window
    Window(WindowControl),
}

impl Control {
    /// Whether the control still participates in the lifecycle
    pub fn is_active(&self) -> bool {
        match self {
            Control::Window(window) => window.is_active(),
        }
    }

    /// Flip the control inactive; idempotent, no other side effect
    pub fn deactivate(&mut self) {
        match self {
            Control::Window(window) => window.deactivate(),
        }
    }

    /// One per-tick update, delegated entirely to the driver boundary
    pub fn tick(&mut self, driver: &mut dyn Driver) -> Result<()> {
        match self {
            Control::Window(window) => window.tick(driver),
        }
    }
}

/// A native-backed graphics window control
///
/// Construction runs the full bring-up sequence; after that every tick is a
/// frame submission followed by an event pump. The `active` flag is the only
/// state the core owns - all rendering state lives behind the driver.
pub struct WindowControl {
    window: WindowHandle,
    width: u32,
    height: u32,
    active: bool,
}

impl WindowControl {
    /// Create a native window, run the bring-up sequence and show it
    ///
    /// # Errors
    ///
    /// Returns `NativeCallFailed` if window creation, any bring-up step or
    /// showing the window fails. No rollback of partially created native
    /// resources is attempted.
    pub fn open(driver: &mut dyn Driver, width: u32, height: u32) -> Result<Self> {
        let window = driver
            .create_window(width, height)
            .map_err(|code| Error::NativeCallFailed {
                call: "create_window",
                code,
            })?;

        bring_up(driver, window)?;

        driver
            .show_window(window)
            .map_err(|code| Error::NativeCallFailed {
                call: "show_window",
                code,
            })?;

        lumen_info!(
            "lumen::WindowControl",
            "{} opened ({}x{})",
            window,
            width,
            height
        );

        Ok(Self {
            window,
            width,
            height,
            active: true,
        })
    }

    /// The native handle backing this control
    pub fn handle(&self) -> WindowHandle {
        self.window
    }

    /// Window width at creation time
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Window height at creation time
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the window still participates in the lifecycle
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flip the window inactive; idempotent
    ///
    /// Does not touch native resources - native teardown is a separate
    /// `destroy_window` call made by whoever triggers the deactivation.
    pub fn deactivate(&mut self) {
        if self.active {
            lumen_debug!("lumen::WindowControl", "{} deactivated", self.window);
        }
        self.active = false;
    }

    /// One per-tick update: submit a frame, then pump the event queue
    ///
    /// A close request tears the native window down and deactivates the
    /// control; the stage prunes it on a following scan.
    pub fn tick(&mut self, driver: &mut dyn Driver) -> Result<()> {
        driver
            .render(self.window)
            .map_err(|code| Error::NativeCallFailed {
                call: "render",
                code,
            })?;

        let status = driver
            .pump(self.window)
            .map_err(|code| Error::NativeCallFailed { call: "pump", code })?;

        if status == PumpStatus::CloseRequested {
            lumen_info!("lumen::WindowControl", "{} close requested", self.window);
            if let Err(code) = driver.destroy_window(self.window) {
                lumen_warn!(
                    "lumen::WindowControl",
                    "{} native teardown failed (native result {})",
                    self.window,
                    code
                );
            }
            self.deactivate();
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
