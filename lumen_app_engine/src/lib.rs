/*!
# Lumen App Engine

Core types for the Lumen application engine.

This crate provides the platform-agnostic application lifecycle: a fixed-cadence
scheduler that drives a stage of controls, and the abstract driver boundary the
controls delegate to. Driver implementations (Vulkan, etc.) live in separate
back-end crates and are handed to [`lumen::launch`] by the hosting binary.

## Architecture

- **Application / AppContext**: entry point, lifecycle hooks and the context
  owned for the duration of a run
- **Scheduler**: fixed frame-budget tick loop over the stage
- **Stage / Control**: ordered container of active controls
- **Driver**: abstract native boundary (window management, per-tick update,
  the ordered bring-up sequence)
- **Extractor**: materializes bundled payloads (native libraries, shader
  binaries) into loadable temp files

Back-end crates provide concrete `Driver` implementations.
*/

// Internal modules
mod error;
mod app;
mod scheduler;
pub mod log;
pub mod driver;
pub mod stage;
pub mod resource;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Entry point, lifecycle hooks and context
    pub use crate::app::{launch, launch_with, AppContext, Application, Config};

    // Lifecycle scheduler
    pub use crate::scheduler::Scheduler;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
        // Note: lumen_* macros are NOT re-exported here - they live at the crate root
    }

    // Driver boundary sub-module
    pub mod driver {
        pub use crate::driver::*;
    }

    // Stage sub-module
    pub mod stage {
        pub use crate::stage::*;
    }

    // Resource extraction sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}
