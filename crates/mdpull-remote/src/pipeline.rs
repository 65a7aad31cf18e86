//! Fetch, transform, parse and render stages shared by mounted documents.

use std::sync::Arc;

use mdpull_renderer::{
    CodeHighlighter, DocumentParser, HtmlBackend, MarkdownParser, Node, NodeRenderer,
    RenderedDocument, Url,
};

use crate::error::LoadError;
use crate::fetcher::Fetcher;
use crate::transform::Transform;

/// Collaborators used to load and render a remote document.
///
/// Cloning is cheap; clones share the fetcher, parser and highlighter.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn DocumentParser>,
    highlighter: Arc<dyn CodeHighlighter>,
    extract_title: bool,
    resolve_links: bool,
    raw_html: bool,
}

impl Pipeline {
    /// Pipeline with the default markdown parser.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, highlighter: Arc<dyn CodeHighlighter>) -> Self {
        Self {
            fetcher,
            parser: Arc::new(MarkdownParser::new()),
            highlighter,
            extract_title: false,
            resolve_links: true,
            raw_html: false,
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_title_extraction(mut self, enabled: bool) -> Self {
        self.extract_title = enabled;
        self
    }

    /// Resolve relative links against the locator (on by default).
    #[must_use]
    pub fn with_link_resolution(mut self, enabled: bool) -> Self {
        self.resolve_links = enabled;
        self
    }

    /// Pass HTML embedded in fetched markdown through unescaped (off by
    /// default).
    #[must_use]
    pub fn with_raw_html(mut self, enabled: bool) -> Self {
        self.raw_html = enabled;
        self
    }

    /// Fetch `locator`, apply `transform`, and parse the result.
    ///
    /// The transform runs only after a successful fetch. Blocks on network
    /// I/O.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Fetch`] when retrieval fails and
    /// [`LoadError::Parse`] when the parser rejects the text.
    pub fn load(
        &self,
        locator: &str,
        transform: Option<&Transform>,
    ) -> Result<Vec<Node>, LoadError> {
        let raw = self.fetcher.fetch(locator)?;

        let text = match transform {
            Some(transform) => transform.apply(&raw),
            None => raw,
        };

        let nodes = self.parser.parse(&text)?;
        tracing::debug!(locator, nodes = nodes.len(), "Parsed remote document");
        Ok(nodes)
    }

    /// Renderer for a document loaded from `locator`.
    #[must_use]
    pub fn renderer(&self, locator: &str) -> NodeRenderer<HtmlBackend> {
        let mut renderer = NodeRenderer::<HtmlBackend>::new(Arc::clone(&self.highlighter))
            .with_raw_html(self.raw_html);
        if self.extract_title {
            renderer = renderer.with_title_extraction();
        }
        if self.resolve_links {
            match Url::parse(locator) {
                Ok(base) => renderer = renderer.with_base_url(base),
                Err(e) => {
                    tracing::debug!(locator, error = %e, "Locator is not a URL, links left as-is");
                }
            }
        }
        renderer
    }

    /// Render nodes loaded from `locator`.
    #[must_use]
    pub fn render(&self, locator: &str, nodes: &[Node]) -> RenderedDocument {
        self.renderer(locator).render(nodes)
    }
}
