//! # convert: markdown tree to target blocks
//!
//! A pure, synchronous fold over a [`Root`]:
//! - [`inline::rich_text`] flattens nested phrasing into annotated spans
//! - [`plain_text::plain_text`] extracts raw text where no span slot exists (table cells)
//! - [`block_mapper::map_block`] maps one block-level node to its output blocks
//! - [`convert`] walks the root children in order and concatenates the results
//!
//! Conversion never fails. Unsupported block kinds become blank placeholder paragraphs
//! so they keep their position; unsupported inline leaves are dropped.

pub mod block_mapper;
pub mod inline;
pub mod plain_text;

use tracing::debug;

use crate::block::Block;
use crate::mdast::{self, Root};

pub use block_mapper::map_block;
pub use inline::rich_text;
pub use plain_text::plain_text;

/// Converts a document tree into blocks, in document order.
///
/// Inline nodes sitting directly at root level are skipped.
pub fn convert(root: &Root) -> Vec<Block> {
    let blocks: Vec<Block> = root
        .children
        .iter()
        .filter(|node| node.is_block())
        .flat_map(map_block)
        .collect();
    debug!(
        nodes = root.children.len(),
        blocks = blocks.len(),
        "Converted document tree to blocks"
    );
    blocks
}

/// Parses `markdown` and converts the resulting tree.
pub fn markdown_to_blocks(markdown: &str) -> Vec<Block> {
    convert(&mdast::parse(markdown))
}
