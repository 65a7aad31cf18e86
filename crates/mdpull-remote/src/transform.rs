//! Text transforms applied to fetched content before parsing.
//!
//! A [`Transform`] wraps any `Fn(&str) -> String`. It runs exactly once per
//! successful fetch and never on the failure path.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Leading YAML front matter block (`---` ... `---`).
static FRONT_MATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\u{feff}?---[ \t]*\r?\n(?:.*?\r?\n)?---[ \t]*(?:\r?\n|\z)").unwrap()
});

/// Leading ATX level-1 heading, optionally preceded by blank lines.
static FIRST_H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A(?:[ \t]*\r?\n)*[ ]{0,3}#[ \t]+[^\r\n]*(?:\r?\n|\z)").unwrap());

/// Pure text-to-text function applied before parsing.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Transform {
    /// Wrap a closure.
    ///
    /// ```
    /// use mdpull_remote::Transform;
    ///
    /// let upper = Transform::new(str::to_uppercase);
    /// assert_eq!(upper.apply("hello"), "HELLO");
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Apply the transform.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        (self.0)(text)
    }

    /// Run `self`, then `next` on its output.
    #[must_use]
    pub fn then(self, next: Transform) -> Self {
        Self::new(move |text| next.apply(&self.apply(text)))
    }

    /// Compose transforms left to right. An empty chain is `None`.
    pub fn chain(transforms: impl IntoIterator<Item = Transform>) -> Option<Self> {
        transforms.into_iter().reduce(Transform::then)
    }

    /// Remove a leading YAML front matter block.
    #[must_use]
    pub fn strip_front_matter() -> Self {
        Self::new(|text| FRONT_MATTER_RE.replace(text, "").into_owned())
    }

    /// Remove a leading `# Title` line so the host page keeps its own title.
    #[must_use]
    pub fn drop_first_heading() -> Self {
        Self::new(|text| FIRST_H1_RE.replace(text, "").into_owned())
    }

    /// Replace every occurrence of `from` with `to`.
    #[must_use]
    pub fn replace(from: impl Into<String>, to: impl Into<String>) -> Self {
        let from = from.into();
        let to = to.into();
        Self::new(move |text| {
            if from.is_empty() {
                text.to_owned()
            } else {
                text.replace(&from, &to)
            }
        })
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}
