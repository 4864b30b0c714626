//! Plain-text extractor: the same walk as the span converter, without annotations.

use crate::mdast::Phrasing;

/// Concatenated raw text of `nodes`. Breaks become `"\n"`; images, references and
/// inline HTML contribute nothing.
pub fn plain_text(nodes: &[Phrasing]) -> String {
    let mut out = String::new();
    collect(nodes, &mut out);
    out
}

fn collect(nodes: &[Phrasing], out: &mut String) {
    for node in nodes {
        match node {
            Phrasing::Text(value) | Phrasing::InlineCode(value) => out.push_str(value),
            Phrasing::Strong(children)
            | Phrasing::Emphasis(children)
            | Phrasing::Strikethrough(children)
            | Phrasing::Link { children, .. } => collect(children, out),
            Phrasing::Break => out.push('\n'),
            Phrasing::Image { .. }
            | Phrasing::ImageReference { .. }
            | Phrasing::LinkReference { .. }
            | Phrasing::FootnoteReference(_)
            | Phrasing::Html(_) => {}
        }
    }
}
