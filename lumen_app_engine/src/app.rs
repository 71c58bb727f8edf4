//! Application entry point, lifecycle hooks and run context
//!
//! Run state lives in an explicit context rather than globals: it is
//! constructed by [`launch`], handed to the lifecycle hooks and the
//! scheduler, and dropped when the run ends.

use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::stage::{Control, Stage, WindowControl};
use crate::{lumen_error, lumen_info};

/// Launch configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Target tick rate in passes per second (the frame budget is derived
    /// from this)
    pub tick_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { tick_rate: 30 }
    }
}

/// Lifecycle hooks an application type implements
pub trait Application {
    /// Runs at application start, before the first scheduler pass
    fn start(&mut self, ctx: &mut AppContext);

    /// Runs at application stop.
    /// By default there is no stop action.
    fn stop(&mut self, _ctx: &mut AppContext) {}
}

/// Context for one application run
///
/// Owns the driver, the stage and the running flag for the duration of a
/// [`launch`] call.
pub struct AppContext {
    pub(crate) driver: Box<dyn Driver>,
    pub(crate) stage: Stage,
    pub(crate) running: bool,
}

impl AppContext {
    /// Create a context around an already-loaded driver
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            stage: Stage::new(),
            running: true,
        }
    }

    /// The driver boundary
    pub fn driver_mut(&mut self) -> &mut dyn Driver {
        self.driver.as_mut()
    }

    /// The stage of active controls
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Mutable access to the stage
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Whether the lifecycle loop is (still) supposed to run
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Request termination; takes effect at the next pass boundary
    pub fn exit(&mut self) {
        self.running = false;
    }

    /// Open a window control: create the native window, run the bring-up
    /// sequence, show it and register it on the stage
    pub fn open_window(&mut self, width: u32, height: u32) -> Result<()> {
        let control = WindowControl::open(self.driver.as_mut(), width, height)?;
        self.stage.add_child(Control::Window(control));
        Ok(())
    }
}

/// Launch an application type with a zero-argument constructor
///
/// Loads the driver's native entry points, constructs the application via
/// `Default`, invokes its start hook, runs the scheduler to completion and
/// invokes its stop hook.
///
/// # Errors
///
/// Returns `NativeLoadFailed` if the native library cannot be bound; the run
/// never continues with a partially-initialized driver.
pub fn launch<A>(driver: Box<dyn Driver>, config: Config) -> Result<()>
where
    A: Application + Default,
{
    launch_with(driver, config, || Ok(A::default()))
}

/// Launch an application produced by a fallible factory
///
/// Like [`launch`], but for application types without a `Default` impl.
///
/// # Errors
///
/// Returns `InstantiationFailed` if the factory fails, `NativeLoadFailed` if
/// the native library cannot be bound.
pub fn launch_with<A, F>(mut driver: Box<dyn Driver>, config: Config, factory: F) -> Result<()>
where
    A: Application,
    F: FnOnce() -> std::result::Result<A, String>,
{
    driver.load().map_err(|message| {
        lumen_error!("lumen::launch", "Failed to load native library: {}", message);
        Error::NativeLoadFailed(message)
    })?;

    let mut app = factory().map_err(|message| {
        lumen_error!(
            "lumen::launch",
            "Failed to construct application: {}",
            message
        );
        Error::InstantiationFailed(message)
    })?;

    let mut ctx = AppContext::new(driver);

    lumen_info!("lumen::launch", "Application starting");
    app.start(&mut ctx);

    Scheduler::from_tick_rate(config.tick_rate).run(&mut ctx);

    app.stop(&mut ctx);
    lumen_info!("lumen::launch", "Application stopped");

    Ok(())
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
