//! Node renderer with code-node interception.

use std::fmt::Write;
use std::marker::PhantomData;
use std::sync::Arc;

use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};
use url::Url;

use crate::backend::{AlertKind, RenderBackend};
use crate::highlight::CodeHighlighter;
use crate::html::HtmlBackend;
use crate::node::{BlockKind, Node, strip_trailing_newline};
use crate::parser::fence_language;
use crate::state::{HeadingState, ImageState, NestedCode, TableState, TocEntry, escape_html};
use crate::util::heading_level_to_num;

/// One rendered node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedNode {
    /// Kind of the source node.
    pub kind: BlockKind,
    /// HTML fragment for the node.
    pub html: String,
}

/// Result of rendering a node sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    /// One entry per input node, in input order.
    pub nodes: Vec<RenderedNode>,
    /// Title extracted from the first H1 heading (if enabled).
    pub title: Option<String>,
    /// Table of contents entries.
    pub toc: Vec<TocEntry>,
}

impl RenderedDocument {
    /// Concatenated HTML of all nodes.
    #[must_use]
    pub fn html(&self) -> String {
        self.nodes.iter().map(|node| node.html.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Renders parsed nodes, sending code nodes to a [`CodeHighlighter`].
///
/// Every other node goes through the default path of backend `B`. Code
/// blocks nested inside other blocks (list items, blockquotes) are also
/// highlighted so samples look the same wherever they appear.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use mdpull_renderer::{
///     DocumentParser, HtmlBackend, MarkdownParser, NodeRenderer, PlainHighlighter,
/// };
///
/// let nodes = MarkdownParser::new().parse("# Hi\n\n```sh\nls\n```").unwrap();
/// let doc = NodeRenderer::<HtmlBackend>::new(Arc::new(PlainHighlighter)).render(&nodes);
/// assert_eq!(doc.len(), 2);
/// assert_eq!(doc.nodes[1].html, r#"<pre><code class="language-sh">ls</code></pre>"#);
/// ```
pub struct NodeRenderer<B: RenderBackend = HtmlBackend> {
    highlighter: Arc<dyn CodeHighlighter>,
    base_url: Option<Url>,
    extract_title: bool,
    raw_html: bool,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> NodeRenderer<B> {
    #[must_use]
    pub fn new(highlighter: Arc<dyn CodeHighlighter>) -> Self {
        Self {
            highlighter,
            base_url: None,
            extract_title: false,
            raw_html: false,
            _backend: PhantomData,
        }
    }

    /// Enable title extraction from the first H1 heading.
    ///
    /// The heading is still rendered; it is only left out of the ToC.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.extract_title = true;
        self
    }

    /// Resolve relative links and images against the document URL.
    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Pass HTML embedded in the markdown through unescaped.
    ///
    /// Off by default: fetched documents are untrusted, so their HTML is
    /// shown as text.
    #[must_use]
    pub fn with_raw_html(mut self, enabled: bool) -> Self {
        self.raw_html = enabled;
        self
    }

    /// Render nodes in order, producing exactly one [`RenderedNode`] each.
    pub fn render(&self, nodes: &[Node]) -> RenderedDocument {
        let mut writer = BlockWriter::<B>::new(
            self.highlighter.as_ref(),
            self.base_url.as_ref(),
            self.extract_title,
            self.raw_html,
        );

        let rendered = nodes
            .iter()
            .map(|node| match node {
                Node::Code(code) => RenderedNode {
                    kind: BlockKind::Code,
                    html: self
                        .highlighter
                        .highlight(code.language.as_deref(), code.display_text()),
                },
                Node::Block(block) => RenderedNode {
                    kind: block.kind,
                    html: writer.write_block(&block.events),
                },
            })
            .collect();

        RenderedDocument {
            nodes: rendered,
            title: writer.heading.take_title(),
            toc: writer.heading.take_toc(),
        }
    }
}

/// Default rendering path for non-code blocks.
///
/// Heading ids are deduplicated across all blocks of one pass.
struct BlockWriter<'r, B: RenderBackend> {
    output: String,
    highlighter: &'r dyn CodeHighlighter,
    base_url: Option<&'r Url>,
    raw_html: bool,
    code: NestedCode,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    /// Alert kinds for nested blockquotes (regular blockquote uses None).
    alert_stack: Vec<Option<AlertKind>>,
    _backend: PhantomData<B>,
}

impl<'r, B: RenderBackend> BlockWriter<'r, B> {
    fn new(
        highlighter: &'r dyn CodeHighlighter,
        base_url: Option<&'r Url>,
        extract_title: bool,
        raw_html: bool,
    ) -> Self {
        Self {
            output: String::with_capacity(1024),
            highlighter,
            base_url,
            raw_html,
            code: NestedCode::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(extract_title),
            alert_stack: Vec::new(),
            _backend: PhantomData,
        }
    }

    fn write_block(&mut self, events: &[Event<'_>]) -> String {
        for event in events {
            self.process_event(event);
        }
        std::mem::take(&mut self.output)
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: &Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(*tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.inline_code(code),
            Event::Html(html) | Event::InlineHtml(html) => self.html(html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(*checked, &mut self.output),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the id is known.
                self.heading.start(heading_level_to_num(*level));
            }
            Tag::BlockQuote(kind) => {
                if let Some(kind) = kind {
                    let alert = AlertKind::from(*kind);
                    self.alert_stack.push(Some(alert));
                    B::alert_start(alert, &mut self.output);
                } else {
                    self.alert_stack.push(None);
                    B::blockquote_start(&mut self.output);
                }
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => fence_language(info),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(language);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments.clone());
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.alignment_attr();
                let cell = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{cell}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link { dest_url, .. } => {
                let href = B::transform_link(dest_url, self.base_url);
                let link = format!(r#"<a href="{}">"#, escape_html(&href));
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the matching end tag.
                let src = B::transform_link(dest_url, self.base_url).into_owned();
                self.image.start(src, title.to_string());
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{html}</h{level}>"#,
                        level = heading.level,
                        id = heading.id,
                        html = heading.html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => match self.alert_stack.pop() {
                Some(Some(alert)) => B::alert_end(alert, &mut self.output),
                _ => B::blockquote_end(&mut self.output),
            },
            TagEnd::CodeBlock => {
                let (language, text) = self.code.end();
                let html = self
                    .highlighter
                    .highlight(language.as_deref(), strip_trailing_newline(&text));
                self.output.push_str(&html);
            }
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                if let Some((src, title, alt)) = self.image.end() {
                    let mut img = String::new();
                    B::image(&src, &alt, &title, &mut img);
                    self.push_inline(&img);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn html(&mut self, html: &str) {
        if self.raw_html {
            self.push_inline(html);
        } else {
            let escaped = escape_html(html);
            self.push_inline(&escaped);
        }
    }

    fn hard_break(&mut self) {
        if self.heading.is_active() {
            let mut br = String::new();
            B::hard_break(&mut br);
            self.heading.push_text(" ");
            self.heading.push_html(&br);
        } else {
            B::hard_break(&mut self.output);
        }
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_str("\n");
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else {
            self.output.push('\n');
        }
    }
}
