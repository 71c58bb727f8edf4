//! Bring-up sequence - the fixed ordered one-time initialization of a native
//! graphics context
//!
//! The sequence is data, not control flow: [`BringUpStep::SEQUENCE`] is the
//! single source of truth for the order, and [`bring_up`] walks it. Each step
//! is unconditional and sequential - no step is retried, no step is skipped,
//! and the first failure aborts the whole sequence as one
//! `NativeCallFailed` carrying the step name and the native result code.
//! Partially created native resources are not rolled back; teardown is the
//! driver's `destroy_window` (see DESIGN.md).

use std::fmt;

use crate::driver::{Driver, WindowHandle};
use crate::error::{Error, Result};
use crate::{lumen_error, lumen_trace};

/// One step of the native bring-up sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BringUpStep {
    CreateInstance,
    CreateDebugger,
    CreateSurface,
    CreateLogicalDevice,
    CreateSwapchain,
    CreateCommandPool,
    AllocateCommandBuffers,
    CreateHostBuffers,
    CreateDeviceBuffers,
    CreateDescriptorPool,
    AllocateDescriptorSets,
    CreateRenderPass,
    CreateFramebuffers,
    CreatePipeline,
    UploadInputData,
    RecordCommandBuffers,
    CreateSemaphores,
}

impl BringUpStep {
    /// The strict total order of the bring-up sequence
    pub const SEQUENCE: [BringUpStep; 17] = [
        BringUpStep::CreateInstance,
        BringUpStep::CreateDebugger,
        BringUpStep::CreateSurface,
        BringUpStep::CreateLogicalDevice,
        BringUpStep::CreateSwapchain,
        BringUpStep::CreateCommandPool,
        BringUpStep::AllocateCommandBuffers,
        BringUpStep::CreateHostBuffers,
        BringUpStep::CreateDeviceBuffers,
        BringUpStep::CreateDescriptorPool,
        BringUpStep::AllocateDescriptorSets,
        BringUpStep::CreateRenderPass,
        BringUpStep::CreateFramebuffers,
        BringUpStep::CreatePipeline,
        BringUpStep::UploadInputData,
        BringUpStep::RecordCommandBuffers,
        BringUpStep::CreateSemaphores,
    ];

    /// Stable step name used in errors and logs
    pub fn name(self) -> &'static str {
        match self {
            BringUpStep::CreateInstance => "create_instance",
            BringUpStep::CreateDebugger => "create_debugger",
            BringUpStep::CreateSurface => "create_surface",
            BringUpStep::CreateLogicalDevice => "create_logical_device",
            BringUpStep::CreateSwapchain => "create_swapchain",
            BringUpStep::CreateCommandPool => "create_command_pool",
            BringUpStep::AllocateCommandBuffers => "allocate_command_buffers",
            BringUpStep::CreateHostBuffers => "create_host_buffers",
            BringUpStep::CreateDeviceBuffers => "create_device_buffers",
            BringUpStep::CreateDescriptorPool => "create_descriptor_pool",
            BringUpStep::AllocateDescriptorSets => "allocate_descriptor_sets",
            BringUpStep::CreateRenderPass => "create_render_pass",
            BringUpStep::CreateFramebuffers => "create_framebuffers",
            BringUpStep::CreatePipeline => "create_pipeline",
            BringUpStep::UploadInputData => "upload_input_data",
            BringUpStep::RecordCommandBuffers => "record_command_buffers",
            BringUpStep::CreateSemaphores => "create_semaphores",
        }
    }
}

impl fmt::Display for BringUpStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run the full bring-up sequence for a window
///
/// Walks [`BringUpStep::SEQUENCE`] in order and stops at the first failing
/// step.
///
/// # Errors
///
/// Returns `NativeCallFailed` with the failing step's name and the native
/// result code. Steps after the failing one are never executed.
pub fn bring_up(driver: &mut dyn Driver, window: WindowHandle) -> Result<()> {
    for step in BringUpStep::SEQUENCE {
        lumen_trace!("lumen::bring_up", "{}: {}", window, step);
        if let Err(code) = driver.run_bring_up_step(window, step) {
            lumen_error!(
                "lumen::bring_up",
                "{}: bring-up aborted at '{}' (native result {})",
                window,
                step,
                code
            );
            return Err(Error::NativeCallFailed {
                call: step.name(),
                code,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "bring_up_tests.rs"]
mod tests;
