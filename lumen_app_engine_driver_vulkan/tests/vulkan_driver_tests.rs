//! Tests for the VulkanDriver backend
//!
//! These tests verify that VulkanDriver correctly implements the Driver
//! boundary. All tests require a GPU and a display and are marked with
//! #[ignore].
//!
//! Run with: cargo test --test vulkan_driver_tests -- --ignored

use ash::vk;
use lumen_app_engine::lumen::driver::{BringUpStep, Driver, PumpStatus};
use lumen_app_engine_driver_vulkan::{DriverConfig, VulkanDriver};
use serial_test::serial;

/// Config with placeholder shader bytes; enough for every step before
/// pipeline creation
fn test_config() -> DriverConfig {
    DriverConfig::new("Vulkan Driver Test", Vec::new(), Vec::new())
}

/// The bring-up prefix that needs no shader binaries
const SHADERLESS_PREFIX: [BringUpStep; 13] = [
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
];

// ============================================================================
// DRIVER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_load_and_create_window() {
    let mut driver = VulkanDriver::new(test_config());
    driver.load().unwrap();

    let window = driver.create_window(640, 480).unwrap();
    assert_eq!(driver.pump(window).unwrap(), PumpStatus::Continue);

    driver.destroy_window(window).unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_shaderless_bring_up_prefix() {
    let mut driver = VulkanDriver::new(test_config());
    driver.load().unwrap();
    let window = driver.create_window(640, 480).unwrap();

    for step in SHADERLESS_PREFIX {
        driver
            .run_bring_up_step(window, step)
            .unwrap_or_else(|code| panic!("step {} failed with native code {}", step, code));
    }

    driver.destroy_window(window).unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_out_of_order_step_is_rejected() {
    let mut driver = VulkanDriver::new(test_config());
    driver.load().unwrap();
    let window = driver.create_window(640, 480).unwrap();

    // Swapchain before instance/device must fail cleanly, not panic
    let result = driver.run_bring_up_step(window, BringUpStep::CreateSwapchain);
    assert_eq!(
        result,
        Err(vk::Result::ERROR_INITIALIZATION_FAILED.as_raw())
    );

    driver.destroy_window(window).unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_unknown_window_is_rejected() {
    let mut driver = VulkanDriver::new(test_config());
    driver.load().unwrap();

    let window = driver.create_window(640, 480).unwrap();
    driver.destroy_window(window).unwrap();

    // The handle is stale now; every call against it must fail
    assert!(driver.render(window).is_err());
    assert!(driver.show_window(window).is_err());
    assert!(driver.destroy_window(window).is_err());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_show_and_hide() {
    let mut driver = VulkanDriver::new(test_config());
    driver.load().unwrap();
    let window = driver.create_window(320, 240).unwrap();

    driver.show_window(window).unwrap();
    driver.hide_window(window).unwrap();

    driver.destroy_window(window).unwrap();
}
