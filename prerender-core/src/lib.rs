pub mod config;
pub mod error;
pub mod mirror;
pub mod report;

pub use config::{MirrorConfig, PartialConfig};
pub use error::MirrorError;
pub use mirror::{MirrorOptions, MirrorProgressCallback, execute_mirror, reset_output_dir};
pub use report::{ReportFormat, generate_json_report, generate_mirror_report};
