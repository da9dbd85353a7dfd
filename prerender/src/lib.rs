pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{exit_code, handle_mirror, load_config, log_level, partial_config_from_args};

// Re-export mirror functionality from prerender-core
pub use prerender_core::{
    MirrorConfig, MirrorOptions, MirrorProgressCallback, PartialConfig, ReportFormat,
    execute_mirror,
};
