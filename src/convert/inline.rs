//! Inline span converter: flattens nested phrasing nodes into an ordered span list.

use crate::annotations::{Flag, RichText};
use crate::mdast::Phrasing;

/// Converts `nodes` into spans, in source order.
///
/// Formatting wrappers switch their flag on for every span they contain; links attach
/// their URL without touching annotations. Images, references and inline HTML
/// contribute nothing.
pub fn rich_text(nodes: &[Phrasing]) -> Vec<RichText> {
    nodes.iter().flat_map(convert).collect()
}

fn convert(node: &Phrasing) -> Vec<RichText> {
    match node {
        Phrasing::Text(value) => vec![RichText::plain(value.as_str())],
        Phrasing::Strong(children) => flagged(children, Flag::Bold),
        Phrasing::Emphasis(children) => flagged(children, Flag::Italic),
        Phrasing::Strikethrough(children) => flagged(children, Flag::Strikethrough),
        Phrasing::InlineCode(value) => vec![RichText::plain(value.as_str()).with_flag(Flag::Code)],
        Phrasing::Link { url, children } => rich_text(children)
            .into_iter()
            .map(|span| span.with_link(url))
            .collect(),
        Phrasing::Break => vec![RichText::newline()],
        Phrasing::Image { .. }
        | Phrasing::ImageReference { .. }
        | Phrasing::LinkReference { .. }
        | Phrasing::FootnoteReference(_)
        | Phrasing::Html(_) => Vec::new(),
    }
}

fn flagged(children: &[Phrasing], flag: Flag) -> Vec<RichText> {
    rich_text(children)
        .into_iter()
        .map(|span| span.with_flag(flag))
        .collect()
}
