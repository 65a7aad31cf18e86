//! Document parsing into block-level nodes.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::node::{Block, BlockKind, CodeNode, Node};
use crate::util::heading_level_to_num;

/// Error returned when a document cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("parse error: {0}")]
pub struct ParseError(pub String);

/// Converts raw text into an ordered sequence of nodes.
///
/// Implementations must preserve source order and must be deterministic for
/// a given input.
pub trait DocumentParser: Send + Sync {
    /// Parse the document text.
    fn parse(&self, text: &str) -> Result<Vec<Node>, ParseError>;
}

/// `CommonMark` parser backed by `pulldown-cmark`.
#[derive(Clone, Debug)]
pub struct MarkdownParser {
    gfm: bool,
}

impl MarkdownParser {
    /// Create a parser with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    /// - Alerts (`> [!NOTE]`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Parser options based on GFM configuration.
    #[must_use]
    pub fn options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, text: &str) -> Result<Vec<Node>, ParseError> {
        let mut splitter = NodeSplitter::default();
        for event in Parser::new_ext(text, self.options()) {
            splitter.push(event);
        }
        splitter.finish()
    }
}

/// Groups a flat event stream into top-level nodes.
#[derive(Default)]
struct NodeSplitter {
    nodes: Vec<Node>,
    depth: usize,
    kind: Option<BlockKind>,
    events: Vec<Event<'static>>,
    code: Option<CodeNode>,
}

impl NodeSplitter {
    fn push(&mut self, event: Event<'_>) {
        if self.depth == 0 {
            self.start_node(event);
            return;
        }

        match &event {
            Event::Start(_) => self.depth += 1,
            Event::End(_) => self.depth -= 1,
            _ => {}
        }

        if self.code.is_some() {
            match event {
                Event::Text(text) => {
                    if let Some(code) = self.code.as_mut() {
                        code.text.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if self.depth == 0 => {
                    if let Some(code) = self.code.take() {
                        self.nodes.push(Node::Code(code));
                    }
                }
                _ => {}
            }
            return;
        }

        self.events.push(event.into_static());
        if self.depth == 0 {
            self.flush_block();
        }
    }

    fn start_node(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => fence_language(&info),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeNode {
                    language,
                    text: String::new(),
                });
                self.depth = 1;
            }
            Event::Start(tag) => {
                self.kind = Some(block_kind(&tag));
                self.events.push(Event::Start(tag).into_static());
                self.depth = 1;
            }
            Event::Rule => {
                self.nodes.push(Node::Block(Block::new(BlockKind::Rule, vec![Event::Rule])));
            }
            // Stray inline events at the top level become their own block.
            other => {
                self.nodes.push(Node::Block(Block::new(
                    BlockKind::Other,
                    vec![other.into_static()],
                )));
            }
        }
    }

    fn flush_block(&mut self) {
        let kind = self.kind.take().unwrap_or(BlockKind::Other);
        let events = std::mem::take(&mut self.events);
        self.nodes.push(Node::Block(Block::new(kind, events)));
    }

    fn finish(self) -> Result<Vec<Node>, ParseError> {
        if self.depth != 0 {
            return Err(ParseError(format!(
                "unbalanced event stream ({} open blocks)",
                self.depth
            )));
        }
        Ok(self.nodes)
    }
}

fn block_kind(tag: &Tag<'_>) -> BlockKind {
    match tag {
        Tag::Paragraph => BlockKind::Paragraph,
        Tag::Heading { level, .. } => BlockKind::Heading(heading_level_to_num(*level)),
        Tag::List(_) => BlockKind::List,
        Tag::BlockQuote(_) => BlockKind::BlockQuote,
        Tag::Table(_) => BlockKind::Table,
        Tag::HtmlBlock => BlockKind::Html,
        Tag::CodeBlock(_) => BlockKind::Code,
        _ => BlockKind::Other,
    }
}

/// Language tag from a fence info string (`rust ignore` -> `rust`).
#[must_use]
pub(crate) fn fence_language(info: &str) -> Option<String> {
    info.split_whitespace()
        .next()
        .map(|lang| lang.trim_start_matches('{').trim_end_matches('}'))
        .filter(|lang| !lang.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(markdown: &str) -> Vec<Node> {
        MarkdownParser::new().parse(markdown).unwrap()
    }

    #[test]
    fn test_heading_and_code_block() {
        let nodes = parse("# Title\n\n```js\nconsole.log(1)\n```");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind(), BlockKind::Heading(1));
        let Node::Code(code) = &nodes[1] else {
            panic!("expected code node, got {:?}", nodes[1]);
        };
        assert_eq!(code.language.as_deref(), Some("js"));
        assert_eq!(code.display_text(), "console.log(1)");
    }

    #[test]
    fn test_preserves_source_order() {
        let nodes = parse("para one\n\n- a\n- b\n\n---\n\n> quote\n\n## Sub");
        let kinds: Vec<BlockKind> = nodes.iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Paragraph,
                BlockKind::List,
                BlockKind::Rule,
                BlockKind::BlockQuote,
                BlockKind::Heading(2),
            ]
        );
    }

    #[test]
    fn test_code_block_without_language() {
        let nodes = parse("```\nplain\n```");
        assert_eq!(nodes, vec![Node::Code(CodeNode::new(None::<&str>, "plain\n"))]);
    }

    #[test]
    fn test_indented_code_block() {
        let nodes = parse("    let x = 1;\n");
        let Node::Code(code) = &nodes[0] else {
            panic!("expected code node");
        };
        assert_eq!(code.language, None);
        assert_eq!(code.display_text(), "let x = 1;");
    }

    #[test]
    fn test_fence_info_attributes_ignored() {
        let nodes = parse("```rust title=\"main.rs\"\nfn main() {}\n```");
        let Node::Code(code) = &nodes[0] else {
            panic!("expected code node");
        };
        assert_eq!(code.language.as_deref(), Some("rust"));
    }

    #[test]
    fn test_nested_code_stays_in_block() {
        let nodes = parse("- item\n\n  ```sh\n  ls\n  ```\n");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), BlockKind::List);
    }

    #[test]
    fn test_table_with_gfm() {
        let nodes = parse("| A | B |\n|---|---|\n| 1 | 2 |");
        assert_eq!(nodes[0].kind(), BlockKind::Table);
    }

    #[test]
    fn test_table_without_gfm_is_paragraph() {
        let nodes = MarkdownParser::new()
            .with_gfm(false)
            .parse("| A | B |\n|---|---|\n| 1 | 2 |")
            .unwrap();
        assert_eq!(nodes[0].kind(), BlockKind::Paragraph);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let text = "# A\n\n```rust\nfn a() {}\n```\n\ntext";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("rust"), Some("rust".to_owned()));
        assert_eq!(fence_language("  "), None);
        assert_eq!(fence_language("{python}"), Some("python".to_owned()));
        assert_eq!(fence_language("toml filename=x"), Some("toml".to_owned()));
    }
}
