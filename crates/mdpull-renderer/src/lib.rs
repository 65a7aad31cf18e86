//! Node-level markdown rendering with a pluggable code highlighter.
//!
//! Documents are parsed into an ordered sequence of block-level [`Node`]s by a
//! [`DocumentParser`], then rendered by a [`NodeRenderer`]:
//!
//! - [`Node::Code`] goes to a [`CodeHighlighter`] ([`SyntectHighlighter`] or
//!   [`PlainHighlighter`])
//! - every other node goes through the default path of a [`RenderBackend`]
//!   ([`HtmlBackend`])
//!
//! The renderer produces one HTML fragment per node, in order.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mdpull_renderer::{
//!     DocumentParser, HtmlBackend, MarkdownParser, NodeRenderer, SyntectHighlighter,
//! };
//!
//! let nodes = MarkdownParser::new()
//!     .parse("# Hello\n\n```rust\nfn main() {}\n```")
//!     .unwrap();
//! let doc = NodeRenderer::<HtmlBackend>::new(Arc::new(SyntectHighlighter::new())).render(&nodes);
//! assert_eq!(doc.len(), 2);
//! ```

mod backend;
mod highlight;
mod html;
mod node;
mod parser;
mod renderer;
mod state;
mod util;

pub use backend::{AlertKind, RenderBackend};
pub use highlight::{
    CodeHighlighter, DEFAULT_THEME, HighlightError, PlainHighlighter, SyntectHighlighter,
};
pub use html::HtmlBackend;
pub use node::{Block, BlockKind, CodeNode, Node};
pub use parser::{DocumentParser, MarkdownParser, ParseError};
pub use renderer::{NodeRenderer, RenderedDocument, RenderedNode};
pub use state::{TocEntry, escape_html, slugify};
pub use url::Url;
