//! # mdast: markdown document tree
//!
//! The converter's input grammar: a [`Root`] holding block-level [`Node`]s, with
//! [`Phrasing`] (inline) nodes nested inside paragraphs, headings and table cells.
//!
//! [`parse`] builds this tree from markdown text with `pulldown-cmark`, normalising the
//! event stream into the shape of a standard markdown syntax tree:
//! - tight list items get an implicit paragraph around their inline content
//! - adjacent text runs are merged, soft breaks become `"\n"` inside the text
//! - reference links/images keep their reference kind, so the converter can drop them
//! - link reference definitions are placed in their enclosing container in source order

use std::collections::VecDeque;
use std::mem;
use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag};
use tracing::trace;

/// Document root: ordered block-level children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Root {
    pub children: Vec<Node>,
}

/// Block-level node kinds.
///
/// `Inline` only appears where malformed input places a phrasing node directly in a
/// block container; the document walker skips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Paragraph(Vec<Phrasing>),
    Heading {
        depth: u8,
        children: Vec<Phrasing>,
    },
    Blockquote(Vec<Node>),
    Code {
        value: String,
        lang: Option<String>,
    },
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    ThematicBreak,
    Table(Vec<TableRow>),
    Html(String),
    Definition {
        label: String,
        url: String,
        title: Option<String>,
    },
    FootnoteDefinition {
        label: String,
        children: Vec<Node>,
    },
    Inline(Phrasing),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableCell {
    pub children: Vec<Phrasing>,
}

/// Inline node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phrasing {
    Text(String),
    Strong(Vec<Phrasing>),
    Emphasis(Vec<Phrasing>),
    Strikethrough(Vec<Phrasing>),
    InlineCode(String),
    Link {
        url: String,
        children: Vec<Phrasing>,
    },
    Break,
    Image {
        url: String,
        alt: String,
    },
    ImageReference {
        label: String,
        alt: String,
    },
    LinkReference {
        label: String,
        children: Vec<Phrasing>,
    },
    FootnoteReference(String),
    Html(String),
}

impl Phrasing {
    pub fn text(value: impl Into<String>) -> Self {
        Phrasing::Text(value.into())
    }
}

impl Node {
    /// Paragraph holding a single text run.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Paragraph(vec![Phrasing::text(text)])
    }

    pub fn is_block(&self) -> bool {
        !matches!(self, Node::Inline(_))
    }
}

/// Parse markdown text into a document tree. Total over any input.
pub fn parse(markdown: &str) -> Root {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(markdown, options).into_offset_iter();

    // Definitions never appear as events; the first pass has already collected them.
    let mut definitions: Vec<(usize, Node)> = events
        .reference_definitions()
        .iter()
        .map(|(label, def)| {
            (
                def.span.start,
                Node::Definition {
                    label: label.to_string(),
                    url: def.dest.to_string(),
                    title: def.title.as_ref().map(|t| t.to_string()),
                },
            )
        })
        .collect();
    definitions.sort_by_key(|(offset, _)| *offset);

    let mut builder = TreeBuilder::new(definitions);
    for (event, range) in events {
        builder.process_event(event, range);
    }
    builder.finish()
}

/// Block container accumulating child nodes, with inline content that arrived outside
/// any paragraph (tight list items) held in `pending` until the next block boundary.
#[derive(Debug, Default)]
struct Container {
    nodes: Vec<Node>,
    pending: Vec<Phrasing>,
}

impl Container {
    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let inline = mem::take(&mut self.pending);
            self.nodes.push(Node::Paragraph(inline));
        }
    }

    fn push_node(&mut self, node: Node) {
        self.flush();
        self.nodes.push(node);
    }

    fn into_nodes(mut self) -> Vec<Node> {
        self.flush();
        self.nodes
    }
}

#[derive(Debug)]
enum Frame {
    Root(Container),
    Blockquote(Container),
    Item(Container),
    FootnoteDefinition { label: String, body: Container },
    List { ordered: bool, items: Vec<ListItem> },
    Paragraph(Vec<Phrasing>),
    Heading { depth: u8, children: Vec<Phrasing> },
    Code { lang: Option<String>, value: String },
    Html(String),
    Table(Vec<TableRow>),
    Row(Vec<TableCell>),
    Cell(Vec<Phrasing>),
    Strong(Vec<Phrasing>),
    Emphasis(Vec<Phrasing>),
    Strikethrough(Vec<Phrasing>),
    Link { url: String, reference: Option<String>, children: Vec<Phrasing> },
    Image { url: String, reference: Option<String>, alt: Vec<Phrasing> },
    Ignored,
}

impl Frame {
    fn is_block_container(&self) -> bool {
        matches!(
            self,
            Frame::Root(_)
                | Frame::Blockquote(_)
                | Frame::Item(_)
                | Frame::FootnoteDefinition { .. }
        )
    }
}

struct TreeBuilder {
    stack: Vec<Frame>,
    /// Link reference definitions not yet placed, ordered by source offset.
    definitions: VecDeque<(usize, Node)>,
}

impl TreeBuilder {
    fn new(definitions: Vec<(usize, Node)>) -> Self {
        Self {
            stack: vec![Frame::Root(Container::default())],
            definitions: definitions.into(),
        }
    }

    fn process_event(&mut self, event: Event<'_>, range: Range<usize>) {
        // A container's end event still covers definitions written as its last children.
        let boundary = match event {
            Event::End(_) => range.end,
            _ => range.start,
        };
        self.place_definitions(boundary);

        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(_) => self.close(),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_inline(Phrasing::InlineCode(code.into_string())),
            Event::Html(html) => match self.stack.last_mut() {
                Some(Frame::Html(value)) => value.push_str(&html),
                _ => self.push_node(Node::Html(html.into_string())),
            },
            Event::InlineHtml(html) => self.push_inline(Phrasing::Html(html.into_string())),
            Event::FootnoteReference(label) => {
                self.push_inline(Phrasing::FootnoteReference(label.into_string()))
            }
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.push_inline(Phrasing::Break),
            Event::Rule => self.push_node(Node::ThematicBreak),
            Event::TaskListMarker(_) => {}
            other => trace!(event = ?other, "Ignoring markdown event"),
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading {
                depth: heading_depth(level),
                children: Vec::new(),
            },
            Tag::BlockQuote(_) => Frame::Blockquote(Container::default()),
            Tag::CodeBlock(kind) => Frame::Code {
                lang: match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                },
                value: String::new(),
            },
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::List(first_number) => Frame::List {
                ordered: first_number.is_some(),
                items: Vec::new(),
            },
            Tag::Item => Frame::Item(Container::default()),
            Tag::FootnoteDefinition(label) => Frame::FootnoteDefinition {
                label: label.into_string(),
                body: Container::default(),
            },
            Tag::Table(_) => Frame::Table(Vec::new()),
            Tag::TableHead | Tag::TableRow => Frame::Row(Vec::new()),
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Emphasis => Frame::Emphasis(Vec::new()),
            Tag::Strong => Frame::Strong(Vec::new()),
            Tag::Strikethrough => Frame::Strikethrough(Vec::new()),
            Tag::Link {
                link_type,
                dest_url,
                id,
                ..
            } => Frame::Link {
                url: dest_url.into_string(),
                reference: reference_label(link_type, &id),
                children: Vec::new(),
            },
            Tag::Image {
                link_type,
                dest_url,
                id,
                ..
            } => Frame::Image {
                url: dest_url.into_string(),
                reference: reference_label(link_type, &id),
                alt: Vec::new(),
            },
            other => {
                trace!(tag = ?other, "Ignoring markdown container");
                Frame::Ignored
            }
        };
        self.stack.push(frame);
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Root(_) | Frame::Ignored => {}
            Frame::Paragraph(children) => self.push_node(Node::Paragraph(children)),
            Frame::Heading { depth, children } => {
                self.push_node(Node::Heading { depth, children })
            }
            Frame::Blockquote(body) => self.push_node(Node::Blockquote(body.into_nodes())),
            Frame::Code { lang, mut value } => {
                if value.ends_with('\n') {
                    value.pop();
                }
                self.push_node(Node::Code { value, lang })
            }
            Frame::Html(value) => self.push_node(Node::Html(value)),
            Frame::List { ordered, items } => self.push_node(Node::List { ordered, items }),
            Frame::Item(body) => {
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(ListItem {
                        children: body.into_nodes(),
                    });
                }
            }
            Frame::FootnoteDefinition { label, body } => {
                self.push_node(Node::FootnoteDefinition {
                    label,
                    children: body.into_nodes(),
                })
            }
            Frame::Table(rows) => self.push_node(Node::Table(rows)),
            Frame::Row(cells) => {
                if let Some(Frame::Table(rows)) = self.stack.last_mut() {
                    rows.push(TableRow { cells });
                }
            }
            Frame::Cell(children) => {
                if let Some(Frame::Row(cells)) = self.stack.last_mut() {
                    cells.push(TableCell { children });
                }
            }
            Frame::Strong(children) => self.push_inline(Phrasing::Strong(children)),
            Frame::Emphasis(children) => self.push_inline(Phrasing::Emphasis(children)),
            Frame::Strikethrough(children) => {
                self.push_inline(Phrasing::Strikethrough(children))
            }
            Frame::Link {
                url,
                reference,
                children,
            } => self.push_inline(match reference {
                Some(label) => Phrasing::LinkReference { label, children },
                None => Phrasing::Link { url, children },
            }),
            Frame::Image {
                url,
                reference,
                alt,
            } => {
                let alt = alt_text(&alt);
                self.push_inline(match reference {
                    Some(label) => Phrasing::ImageReference { label, alt },
                    None => Phrasing::Image { url, alt },
                })
            }
        }
    }

    /// Moves every definition that starts before `offset` into the innermost open
    /// block container. Inside inline or leaf frames they wait for the next boundary.
    fn place_definitions(&mut self, offset: usize) {
        if !self.stack.last().is_some_and(Frame::is_block_container) {
            return;
        }
        while self
            .definitions
            .front()
            .is_some_and(|(start, _)| *start < offset)
        {
            if let Some((_, definition)) = self.definitions.pop_front() {
                self.push_node(definition);
            }
        }
    }

    fn push_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(Frame::Root(body))
            | Some(Frame::Blockquote(body))
            | Some(Frame::Item(body))
            | Some(Frame::FootnoteDefinition { body, .. }) => body.push_node(node),
            _ => trace!(node = ?node, "Dropping block node outside a block container"),
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Frame::Code { value, .. }) | Some(Frame::Html(value)) => value.push_str(text),
            _ => self.push_inline(Phrasing::Text(text.to_string())),
        }
    }

    fn push_inline(&mut self, inline: Phrasing) {
        let target = match self.stack.last_mut() {
            Some(Frame::Paragraph(children))
            | Some(Frame::Heading { children, .. })
            | Some(Frame::Cell(children))
            | Some(Frame::Strong(children))
            | Some(Frame::Emphasis(children))
            | Some(Frame::Strikethrough(children))
            | Some(Frame::Link { children, .. })
            | Some(Frame::Image { alt: children, .. }) => children,
            Some(Frame::Root(body))
            | Some(Frame::Blockquote(body))
            | Some(Frame::Item(body))
            | Some(Frame::FootnoteDefinition { body, .. }) => &mut body.pending,
            _ => return,
        };
        append_merging_text(target, inline);
    }

    fn finish(mut self) -> Root {
        while self.stack.len() > 1 {
            self.close();
        }
        self.place_definitions(usize::MAX);
        let children = match self.stack.pop() {
            Some(Frame::Root(body)) => body.into_nodes(),
            _ => Vec::new(),
        };
        Root { children }
    }
}

fn append_merging_text(target: &mut Vec<Phrasing>, inline: Phrasing) {
    if let (Some(Phrasing::Text(previous)), Phrasing::Text(next)) = (target.last_mut(), &inline) {
        previous.push_str(next);
        return;
    }
    target.push(inline);
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn reference_label(link_type: LinkType, id: &str) -> Option<String> {
    match link_type {
        LinkType::Reference | LinkType::Collapsed | LinkType::Shortcut => Some(id.to_string()),
        _ => None,
    }
}

fn alt_text(children: &[Phrasing]) -> String {
    children
        .iter()
        .map(|child| match child {
            Phrasing::Text(value) | Phrasing::InlineCode(value) => value.clone(),
            Phrasing::Strong(inner)
            | Phrasing::Emphasis(inner)
            | Phrasing::Strikethrough(inner)
            | Phrasing::Link { children: inner, .. }
            | Phrasing::LinkReference { children: inner, .. } => alt_text(inner),
            _ => String::new(),
        })
        .collect()
}
