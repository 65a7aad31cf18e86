use crate::transform::Transform;

/// Default text shown while a document is loading.
pub const DEFAULT_PLACEHOLDER: &str = "Loading...";

/// What to load and how to present it while pending.
///
/// A new `locator` starts a new load epoch. Changing only the transform or
/// placeholder does not.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    /// Address of the remote document.
    pub locator: String,
    /// Applied to the fetched text before parsing.
    pub transform: Option<Transform>,
    /// Shown while the load is pending.
    pub placeholder: String,
}

impl ContentRequest {
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            transform: None,
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}
