//! Load state and its presentation.

use std::sync::Arc;

use mdpull_renderer::{Node, RenderedDocument, escape_html};

/// State of one mounted document.
///
/// `Pending` moves to exactly one of `Ready` or `Failed`. Only a new
/// locator brings the state back to `Pending`.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Failed {
        reason: String,
    },
    Ready {
        document: Arc<Vec<Node>>,
    },
}

impl LoadState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Failure reason, if failed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Parsed nodes, if ready.
    #[must_use]
    pub fn document(&self) -> Option<&[Node]> {
        match self {
            Self::Ready { document } => Some(document.as_slice()),
            _ => None,
        }
    }
}

/// What a host displays for the current state.
#[derive(Debug, Clone)]
pub enum View {
    /// Load in progress; show the placeholder text.
    Placeholder(String),
    /// Inline failure indicator with the reason.
    Error(String),
    /// Fully rendered document.
    Content(RenderedDocument),
}

impl View {
    /// HTML for embedding in a page.
    ///
    /// ```
    /// use mdpull_remote::View;
    ///
    /// let view = View::Error("Failed to fetch".to_owned());
    /// assert_eq!(
    ///     view.html(),
    ///     r#"<div class="mdpull-error" role="alert">Failed to fetch</div>"#
    /// );
    /// ```
    #[must_use]
    pub fn html(&self) -> String {
        match self {
            Self::Placeholder(text) => {
                format!(
                    r#"<div class="mdpull-placeholder">{}</div>"#,
                    escape_html(text)
                )
            }
            Self::Error(reason) => format!(
                r#"<div class="mdpull-error" role="alert">{}</div>"#,
                escape_html(reason)
            ),
            Self::Content(doc) => doc.html(),
        }
    }

    #[must_use]
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }
}
