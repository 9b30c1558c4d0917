use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced per file or per artifact. None of these abort a batch;
/// the driver reports them and moves on.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("sitemap write failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("menu serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The rewritten document would read differently; the write was aborted.
    #[error("visible text would change: {}", .0.display())]
    TextNotPreserved(PathBuf),
}
