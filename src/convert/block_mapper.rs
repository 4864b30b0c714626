//! Block mapper: one block-level node to zero or more output blocks.

use crate::annotations::RichText;
use crate::block::{Block, PLAIN_TEXT_LANGUAGE};
use crate::mdast::{ListItem, Node, TableRow};

use super::inline::rich_text;
use super::plain_text::plain_text;

const CELL_SEPARATOR: &str = " | ";
const ROW_SEPARATOR: &str = "\n";

/// Maps a single block-level node.
///
/// Returns an empty list only for stray inline nodes; every other kind yields at least
/// one block, with unsupported kinds mapped to a blank placeholder paragraph.
pub fn map_block(node: &Node) -> Vec<Block> {
    match node {
        Node::Paragraph(children) => vec![Block::Paragraph {
            rich_text: non_empty(rich_text(children)),
        }],
        Node::Heading { depth, children } => {
            let rich_text = non_empty(rich_text(children));
            vec![match depth {
                1 => Block::Heading1 { rich_text },
                2 => Block::Heading2 { rich_text },
                _ => Block::Heading3 { rich_text },
            }]
        }
        Node::Blockquote(children) => vec![Block::Quote {
            rich_text: non_empty(quote_text(children)),
        }],
        Node::Code { value, lang } => vec![Block::Code {
            rich_text: vec![RichText::plain(value.as_str())],
            language: lang
                .clone()
                .unwrap_or_else(|| PLAIN_TEXT_LANGUAGE.to_string()),
        }],
        Node::List { ordered, items } => items
            .iter()
            .map(|item| {
                let rich_text = non_empty(list_item_text(item));
                if *ordered {
                    Block::NumberedListItem { rich_text }
                } else {
                    Block::BulletedListItem { rich_text }
                }
            })
            .collect(),
        Node::ThematicBreak => vec![Block::Divider],
        Node::Table(rows) => vec![Block::Paragraph {
            rich_text: vec![table_text(rows)],
        }],
        Node::Html(_) | Node::Definition { .. } | Node::FootnoteDefinition { .. } => {
            vec![Block::placeholder()]
        }
        Node::Inline(_) => Vec::new(),
    }
}

/// Pads an empty span list with a single blank span.
fn non_empty(mut spans: Vec<RichText>) -> Vec<RichText> {
    if spans.is_empty() {
        spans.push(RichText::blank());
    }
    spans
}

/// Flattens a blockquote into one span list.
///
/// Paragraphs are followed by a newline span unless they are the last child. Any other
/// child contributes the spans of the first block it maps to; the rest of its blocks
/// are dropped.
fn quote_text(children: &[Node]) -> Vec<RichText> {
    let mut spans = Vec::new();
    let last = children.len().saturating_sub(1);
    for (i, child) in children.iter().enumerate() {
        match child {
            Node::Paragraph(inline) => {
                spans.extend(rich_text(inline));
                if i < last {
                    spans.push(RichText::newline());
                }
            }
            other => {
                if let Some(first) = map_block(other).first().and_then(Block::rich_text) {
                    spans.extend_from_slice(first);
                }
            }
        }
    }
    spans
}

/// Only a leading paragraph contributes; later paragraphs and nested lists are dropped.
fn list_item_text(item: &ListItem) -> Vec<RichText> {
    match item.children.first() {
        Some(Node::Paragraph(inline)) => rich_text(inline),
        _ => Vec::new(),
    }
}

fn table_text(rows: &[TableRow]) -> RichText {
    let text = rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| plain_text(&cell.children))
                .collect::<Vec<_>>()
                .join(CELL_SEPARATOR)
        })
        .collect::<Vec<_>>()
        .join(ROW_SEPARATOR);
    if text.is_empty() {
        RichText::blank()
    } else {
        RichText::plain(text)
    }
}
