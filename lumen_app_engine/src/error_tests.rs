//! Unit tests for Error types
//!
//! Tests Display formatting and the std::error::Error impl.

use crate::error::Error;

#[test]
fn test_native_load_failed_display() {
    let error = Error::NativeLoadFailed("libhello not found".to_string());
    assert_eq!(error.to_string(), "Native load failed: libhello not found");
}

#[test]
fn test_native_call_failed_display_carries_step_and_code() {
    let error = Error::NativeCallFailed {
        call: "create_swapchain",
        code: -4,
    };
    let msg = error.to_string();
    assert!(msg.contains("create_swapchain"));
    assert!(msg.contains("-4"));
}

#[test]
fn test_filesystem_failed_display() {
    let error = Error::FilesystemFailed("cannot write temp file".to_string());
    assert_eq!(error.to_string(), "Filesystem failure: cannot write temp file");
}

#[test]
fn test_instantiation_failed_display() {
    let error = Error::InstantiationFailed("no default state".to_string());
    assert_eq!(error.to_string(), "Instantiation failed: no default state");
}

#[test]
fn test_error_is_std_error() {
    fn assert_std_error<E: std::error::Error>(_e: &E) {}
    let error = Error::NativeLoadFailed("x".to_string());
    assert_std_error(&error);
}

#[test]
fn test_error_is_cloneable() {
    let error = Error::NativeCallFailed {
        call: "create_instance",
        code: -3,
    };
    let clone = error.clone();
    assert_eq!(error.to_string(), clone.to_string());
}
