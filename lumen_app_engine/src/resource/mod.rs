//! Payload extraction
//!
//! Bundled native payloads (dynamic libraries, shader binaries) cannot be
//! handed to the OS loader or the graphics stack in-memory; they first have
//! to exist as real files. The [`Extractor`] materializes them into the OS
//! temp directory.

// ===== Modules =====

mod extractor;

// ===== Re-exports =====

pub use extractor::{Extractor, PayloadKind};
