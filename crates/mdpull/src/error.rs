//! CLI error types.

use mdpull_config::ConfigError;
use mdpull_renderer::HighlightError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Highlight(#[from] HighlightError),

    #[error("{failed} of {total} documents failed to load")]
    Failed { failed: usize, total: usize },
}
