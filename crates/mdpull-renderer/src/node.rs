//! Parsed document nodes.
//!
//! A document is an ordered sequence of block-level [`Node`]s. Only code
//! blocks get a dedicated shape; every other block keeps its parser events
//! and is rendered through the default path.

use pulldown_cmark::Event;

/// One block-level unit of a parsed document.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Fenced or indented code sample.
    Code(CodeNode),
    /// Any other block, rendered by the default path.
    Block(Block),
}

impl Node {
    /// Whether this node is routed to the code highlighter.
    #[must_use]
    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code(_))
    }

    /// Kind of the node, for presentation and diagnostics.
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Code(_) => BlockKind::Code,
            Self::Block(block) => block.kind,
        }
    }
}

/// Code sample with an optional language tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeNode {
    /// First word of the fence info string, `None` when empty or indented.
    pub language: Option<String>,
    /// Exact code text as produced by the parser.
    pub text: String,
}

impl CodeNode {
    #[must_use]
    pub fn new(language: Option<impl Into<String>>, text: impl Into<String>) -> Self {
        Self {
            language: language.map(Into::into),
            text: text.into(),
        }
    }

    /// Code text with at most one trailing newline removed.
    ///
    /// ```
    /// use mdpull_renderer::CodeNode;
    ///
    /// assert_eq!(CodeNode::new(Some("bash"), "echo hi\n").display_text(), "echo hi");
    /// assert_eq!(CodeNode::new(None::<&str>, "a\n\n").display_text(), "a\n");
    /// ```
    #[must_use]
    pub fn display_text(&self) -> &str {
        strip_trailing_newline(&self.text)
    }
}

/// Remove at most one trailing `\n` or `\r\n`.
pub(crate) fn strip_trailing_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Coarse classification of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    List,
    BlockQuote,
    Table,
    Html,
    Rule,
    Code,
    Other,
}

/// Non-code block, kept as the parser's event stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub events: Vec<Event<'static>>,
}

impl Block {
    #[must_use]
    pub fn new(kind: BlockKind, events: Vec<Event<'static>>) -> Self {
        Self { kind, events }
    }
}
