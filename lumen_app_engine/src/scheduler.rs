//! Lifecycle scheduler - drives all active controls at a fixed cadence
//!
//! One thread runs everything: each pass scans the stage's children once in
//! insertion order, ticks the active ones and removes the ones observed
//! inactive during that same scan. Between passes the scheduler sleeps
//! `max(0, frame_budget - elapsed)`; an over-budget pass simply starts the
//! next one immediately. There is no background timer thread and no mid-pass
//! cancellation - clearing the running flag takes effect at the next pass
//! boundary.

use std::thread;
use std::time::{Duration, Instant};

use crate::app::AppContext;
use crate::driver::Driver;
use crate::stage::Stage;
use crate::{lumen_debug, lumen_error};

/// Fixed-cadence lifecycle scheduler
pub struct Scheduler {
    frame_budget: Duration,
}

impl Scheduler {
    /// Create a scheduler with an explicit frame budget
    pub fn new(frame_budget: Duration) -> Self {
        Self { frame_budget }
    }

    /// Create a scheduler from a target tick rate in passes per second
    pub fn from_tick_rate(ticks_per_second: u32) -> Self {
        let millis = 1000 / u64::from(ticks_per_second.max(1));
        Self::new(Duration::from_millis(millis))
    }

    /// The configured frame budget
    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Run the lifecycle loop to completion
    ///
    /// Returns once the context stops running: either because the stage ran
    /// out of controls or because something called `exit()` on the context.
    /// An empty stage at entry returns on the first pass without invoking any
    /// control, and the final pass is never followed by a sleep.
    pub fn run(&self, ctx: &mut AppContext) {
        lumen_debug!(
            "lumen::Scheduler",
            "Entering lifecycle loop ({} ms frame budget)",
            self.frame_budget.as_millis()
        );

        while ctx.running {
            let pass_started = Instant::now();

            if ctx.stage.is_empty() {
                ctx.running = false;
                break;
            }

            Self::pass(&mut ctx.stage, ctx.driver.as_mut());

            if ctx.stage.is_empty() {
                ctx.running = false;
            }
            if !ctx.running {
                break;
            }

            // A slow pass gets no sleep; never negative, never an error
            let remaining = self.frame_budget.saturating_sub(pass_started.elapsed());
            if !remaining.is_zero() {
                thread::sleep(remaining);
            }
        }

        lumen_debug!("lumen::Scheduler", "Lifecycle loop finished");
    }

    /// One pass: scan the children once, tick the active ones, compact out
    /// the inactive ones in place
    fn pass(stage: &mut Stage, driver: &mut dyn Driver) {
        let mut index = 0;
        while let Some(control) = stage.child_mut(index) {
            if !control.is_active() {
                stage.remove_child(index);
                continue;
            }

            if let Err(error) = control.tick(driver) {
                // A failing control is cut loose; the rest keep running
                lumen_error!(
                    "lumen::Scheduler",
                    "Tick failed, deactivating control: {}",
                    error
                );
                control.deactivate();
            }
            index += 1;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
