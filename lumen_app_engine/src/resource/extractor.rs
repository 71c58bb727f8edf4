//! Extractor - materializes bundled payloads into the OS temp directory

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::lumen_debug;

/// Monotonic counter that keeps concurrent extractions from colliding on a
/// temp-file name within one process
static EXTRACTION_COUNTER: AtomicU64 = AtomicU64::new(0);

// ===== Payload kinds =====

/// Kind of payload the extractor can materialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// A dynamic library loadable by the OS loader
    NativeLibrary,
    /// A compiled shader binary
    ShaderBinary,
}

impl PayloadKind {
    /// Subdirectory this kind lives under inside a search root
    pub fn subdir(&self) -> &'static str {
        match self {
            PayloadKind::NativeLibrary => "native",
            PayloadKind::ShaderBinary => "shaders",
        }
    }

    /// Platform file extension for this kind
    pub fn extension(&self) -> &'static str {
        match self {
            #[cfg(target_os = "windows")]
            PayloadKind::NativeLibrary => "dll",
            #[cfg(target_os = "macos")]
            PayloadKind::NativeLibrary => "dylib",
            #[cfg(not(any(target_os = "windows", target_os = "macos")))]
            PayloadKind::NativeLibrary => "so",
            PayloadKind::ShaderBinary => "spv",
        }
    }

    /// Prefix for the materialized temp-file name
    pub fn temp_prefix(&self) -> &'static str {
        match self {
            PayloadKind::NativeLibrary => "lib",
            PayloadKind::ShaderBinary => "shdr",
        }
    }
}

// ===== Extractor =====

/// Locates bundled payloads and materializes them as real files
///
/// Lookup order is registered in-memory bytes first, then the configured
/// search roots in the order they were added. The materialized file lands in
/// the OS temp directory under a name unique to this process and extraction.
///
/// # Example
///
/// ```no_run
/// use lumen_app_engine::lumen::resource::{Extractor, PayloadKind};
///
/// let mut extractor = Extractor::new();
/// extractor.register_payload(PayloadKind::ShaderBinary, "triangle_vert", vec![0x03, 0x02, 0x23, 0x07]);
/// let path = extractor.extract(PayloadKind::ShaderBinary, "triangle_vert").unwrap();
/// ```
pub struct Extractor {
    bundled: HashMap<(PayloadKind, String), Vec<u8>>,
    search_roots: Vec<PathBuf>,
}

impl Extractor {
    /// Create an extractor with no payloads and no search roots
    pub fn new() -> Self {
        Self {
            bundled: HashMap::new(),
            search_roots: Vec::new(),
        }
    }

    /// Register in-memory payload bytes under a logical name
    ///
    /// Registered bytes take precedence over search roots for the same name.
    pub fn register_payload(
        &mut self,
        kind: PayloadKind,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) {
        self.bundled.insert((kind, name.into()), bytes.into());
    }

    /// Add a directory to search for payloads not registered in memory
    ///
    /// A root is expected to hold payloads under the kind's subdirectory,
    /// e.g. `<root>/shaders/triangle_vert.spv`.
    pub fn add_search_root(&mut self, root: impl Into<PathBuf>) {
        self.search_roots.push(root.into());
    }

    /// Materialize the named payload into the OS temp directory
    ///
    /// Returns the path of the created file. The file is not cleaned up; it
    /// lives for as long as the OS keeps its temp directory.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemFailed` if the payload cannot be found or the
    /// temp file cannot be written.
    pub fn extract(&self, kind: PayloadKind, name: &str) -> Result<PathBuf> {
        let bytes = self.locate(kind, name)?;
        let target = Self::temp_path(kind, name);

        fs::write(&target, &bytes).map_err(|error| {
            Error::FilesystemFailed(format!(
                "Failed to write payload '{}' to {}: {}",
                name,
                target.display(),
                error
            ))
        })?;

        lumen_debug!(
            "lumen::Extractor",
            "Extracted payload '{}' to {}",
            name,
            target.display()
        );
        Ok(target)
    }

    /// Find the payload bytes: registered bytes first, then the search roots
    fn locate(&self, kind: PayloadKind, name: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.bundled.get(&(kind, name.to_string())) {
            return Ok(bytes.clone());
        }

        let file_name = format!("{}.{}", name, kind.extension());
        for root in &self.search_roots {
            let candidate = root.join(kind.subdir()).join(&file_name);
            if candidate.is_file() {
                return Self::read_payload(name, &candidate);
            }
        }

        Err(Error::FilesystemFailed(format!(
            "Payload '{}' not found (not registered, {} search root(s) checked)",
            name,
            self.search_roots.len()
        )))
    }

    fn read_payload(name: &str, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|error| {
            Error::FilesystemFailed(format!(
                "Failed to read payload '{}' from {}: {}",
                name,
                path.display(),
                error
            ))
        })
    }

    /// Unique temp path for one extraction of one payload
    fn temp_path(kind: PayloadKind, name: &str) -> PathBuf {
        let sequence = EXTRACTION_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "{}{}-{}-{}.{}",
            kind.temp_prefix(),
            name,
            std::process::id(),
            sequence,
            kind.extension()
        ))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
