/*!
 * treedump - Snapshot a directory into a single text report
 *
 * The report holds an ASCII tree of the directory and, depending on the mode,
 * the fenced contents of every selected file. Walks can be stopped at any
 * point through a [`CancellationToken`].
 */

pub mod cancel;
pub mod config;
pub mod error;
pub mod language;
pub mod matcher;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod report;
pub mod scanner;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use cancel::{CancellationToken, Cancelled};
pub use config::{Config, Mode};
pub use error::{Result, TreeDumpError};
pub use matcher::{FilterSet, TargetSet};
pub use pipeline::{Generator, RunOutcome, RunStatus};
pub use progress::{NullProgress, Phase, ProgressSink};
pub use render::render;
pub use report::{ReportFormat, Reporter, RunSummary};
pub use scanner::{ExcludePolicy, ExclusionWalker, IncludePolicy, InclusionWalker, Scanner};
pub use types::{FileEntry, FileList, Node, ScanResult, ScanWarning, Tree, WarningKind};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
