/// Vulkan Debug Messenger - handles validation layer messages with colored output
///
/// Compiled only with the `vulkan-validation` feature. The callback counts
/// messages per severity so tests and tools can assert on a clean run.

use ash::vk;
use colored::*;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Counts of validation messages seen since process start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }
}

/// Get current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Debug messenger callback registered during the bring-up sequence
///
/// # Safety
///
/// Called by the Vulkan loader; the callback data pointer is valid for the
/// duration of the call per the VK_EXT_debug_utils contract.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        "(no message)".to_string()
    } else {
        CStr::from_ptr((*p_callback_data).p_message)
            .to_string_lossy()
            .into_owned()
    };

    let type_label = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "VALIDATION",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "PERFORMANCE",
        _ => "GENERAL",
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            VALIDATION_STATS.errors.fetch_add(1, Ordering::Relaxed);
            eprintln!(
                "{} [{}] {}",
                "[VULKAN ERROR]".red().bold(),
                type_label,
                message
            );
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            VALIDATION_STATS.warnings.fetch_add(1, Ordering::Relaxed);
            eprintln!(
                "{} [{}] {}",
                "[VULKAN WARNING]".yellow().bold(),
                type_label,
                message
            );
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            VALIDATION_STATS.info.fetch_add(1, Ordering::Relaxed);
            println!("{} [{}] {}", "[VULKAN INFO]".cyan(), type_label, message);
        }
        _ => {
            VALIDATION_STATS.verbose.fetch_add(1, Ordering::Relaxed);
            println!(
                "{} [{}] {}",
                "[VULKAN VERBOSE]".bright_black(),
                type_label,
                message
            );
        }
    }

    vk::FALSE
}
