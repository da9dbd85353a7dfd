pub mod crawler;
pub mod error;
pub mod extract;
pub mod path;
pub mod result;
pub mod rewrite;
pub mod sink;

pub use crawler::{Crawler, ProgressCallback};
pub use error::ScanError;
pub use path::{ContentClass, OutputPlan};
pub use result::{CrawlOutcome, CrawlResult};
pub use rewrite::OriginRewriter;
pub use sink::{FsSink, OutputSink};
