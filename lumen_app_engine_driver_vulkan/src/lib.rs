/*!
# Lumen App Engine - Vulkan Driver Backend

Vulkan implementation of the Lumen driver boundary.

This crate provides a Vulkan back-end that implements the lumen_app_engine
`Driver` trait using the Ash library for Vulkan bindings, winit for window
management and gpu-allocator for memory management.

Windows are created hidden and shown only after their bring-up sequence has
completed. Each window owns its own full Vulkan context, populated step by
step as the core dispatches the bring-up sequence.
*/

// Vulkan implementation modules
mod vulkan_driver;
mod vulkan_window;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_driver::{DriverConfig, VulkanDriver};

#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, ValidationStats};
