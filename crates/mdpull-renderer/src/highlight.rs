//! Code highlighting for fenced code nodes.
//!
//! [`CodeHighlighter`] is the seam between the node renderer and whatever
//! produces highlighted markup. [`SyntectHighlighter`] emits inline-styled
//! spans; [`PlainHighlighter`] emits an unstyled block.

use std::fmt::Write;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::state::escape_html;

/// Theme used when none is configured.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Renders a code sample to an HTML fragment.
pub trait CodeHighlighter: Send + Sync {
    /// Render `code` as a block.
    ///
    /// `language` is `None` when the fence carried no tag. Implementations
    /// must still produce a `<pre>` block in that case.
    fn highlight(&self, language: Option<&str>, code: &str) -> String;
}

/// Error creating a highlighter.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("unknown highlight theme: {0}")]
    UnknownTheme(String),
}

/// Unstyled `<pre><code>` output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainHighlighter;

impl CodeHighlighter for PlainHighlighter {
    fn highlight(&self, language: Option<&str>, code: &str) -> String {
        plain_block(language, code)
    }
}

fn plain_block(language: Option<&str>, code: &str) -> String {
    match language {
        Some(lang) => format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_html(lang),
            escape_html(code)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(code)),
    }
}

/// Syntax highlighter backed by `syntect` default syntaxes and themes.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntectHighlighter {
    /// Create a highlighter with [`DEFAULT_THEME`].
    #[must_use]
    pub fn new() -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(DEFAULT_THEME)
            .or_else(|| themes.into_values().next())
            .unwrap_or_default();
        Self { syntax_set, theme }
    }

    /// Create a highlighter with a named theme.
    pub fn with_theme(name: &str) -> Result<Self, HighlightError> {
        let theme = ThemeSet::load_defaults()
            .themes
            .remove(name)
            .ok_or_else(|| HighlightError::UnknownTheme(name.to_owned()))?;
        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    /// Names of the bundled themes, sorted.
    #[must_use]
    pub fn theme_names() -> Vec<String> {
        let mut names: Vec<String> = ThemeSet::load_defaults().themes.into_keys().collect();
        names.sort();
        names
    }

    fn syntax_for(&self, language: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language))
    }

    fn highlight_lines(
        &self,
        syntax: &SyntaxReference,
        code: &str,
    ) -> Result<String, syntect::Error> {
        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut html = String::with_capacity(code.len() * 2);
        for line in LinesWithEndings::from(code) {
            let regions = highlighter.highlight_line(line, &self.syntax_set)?;
            html.push_str(&styled_line_to_highlighted_html(
                &regions,
                IncludeBackground::No,
            )?);
        }
        Ok(html)
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, language: Option<&str>, code: &str) -> String {
        let Some(lang) = language else {
            return plain_block(None, code);
        };
        let Some(syntax) = self.syntax_for(lang) else {
            tracing::debug!(language = lang, "No syntax for language, rendering unstyled");
            return plain_block(Some(lang), code);
        };

        match self.highlight_lines(syntax, code) {
            Ok(spans) => {
                let mut out = String::from(r#"<pre class="highlight""#);
                if let Some(bg) = self.theme.settings.background {
                    write!(
                        out,
                        r#" style="background-color:#{:02x}{:02x}{:02x}""#,
                        bg.r, bg.g, bg.b
                    )
                    .unwrap();
                }
                write!(
                    out,
                    r#"><code class="language-{}">{spans}</code></pre>"#,
                    escape_html(lang)
                )
                .unwrap();
                out
            }
            Err(e) => {
                tracing::warn!(language = lang, error = %e, "Highlighting failed, rendering unstyled");
                plain_block(Some(lang), code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_with_language() {
        assert_eq!(
            PlainHighlighter.highlight(Some("rust"), "fn main() {}"),
            r#"<pre><code class="language-rust">fn main() {}</code></pre>"#
        );
    }

    #[test]
    fn test_plain_without_language() {
        assert_eq!(
            PlainHighlighter.highlight(None, "a < b"),
            "<pre><code>a &lt; b</code></pre>"
        );
    }

    #[test]
    fn test_syntect_known_language() {
        let html = SyntectHighlighter::new().highlight(Some("rust"), "fn main() {}");
        assert!(html.starts_with(r#"<pre class="highlight""#));
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.contains("<span style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_syntect_without_language_is_unstyled_block() {
        let html = SyntectHighlighter::new().highlight(None, "echo hi");
        assert_eq!(html, "<pre><code>echo hi</code></pre>");
    }

    #[test]
    fn test_syntect_unknown_language_falls_back() {
        let html = SyntectHighlighter::new().highlight(Some("no-such-lang"), "x");
        assert_eq!(html, r#"<pre><code class="language-no-such-lang">x</code></pre>"#);
    }

    #[test]
    fn test_syntect_escapes_content() {
        let html = SyntectHighlighter::new().highlight(Some("html"), "<div>");
        assert!(!html.contains("<div>"));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn test_unknown_theme() {
        let err = SyntectHighlighter::with_theme("missing").err().unwrap();
        assert_eq!(err.to_string(), "unknown highlight theme: missing");
    }

    #[test]
    fn test_theme_names_include_default() {
        assert!(SyntectHighlighter::theme_names().contains(&DEFAULT_THEME.to_owned()));
    }
}
