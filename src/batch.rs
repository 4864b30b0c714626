//! Batch emitter: sends converted blocks to the store in bounded, ordered chunks.
//!
//! Replacing a page's content is not atomic on the store side. [`replace_page_content`]
//! deletes every existing child, appends the new chunks in order and only then writes
//! the modification marker. A reader may see an empty page between the first two
//! phases. On failure nothing is rolled back; the marker is left untouched so the next
//! run sees the page as stale and redoes the whole replacement.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::block::Block;
use crate::contract::{DocumentStore, ServiceError};

/// Largest number of blocks the store accepts per append call.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("listing existing blocks of {page_id} failed: {source}")]
    List {
        page_id: String,
        #[source]
        source: ServiceError,
    },
    #[error("deleting block {block_id} failed after {deleted} deletions: {source}")]
    Delete {
        block_id: String,
        deleted: usize,
        #[source]
        source: ServiceError,
    },
    #[error("appending chunk {chunk} of {total} failed: {source}")]
    Append {
        chunk: usize,
        total: usize,
        #[source]
        source: ServiceError,
    },
    #[error("updating modification marker of {page_id} failed: {source}")]
    UpdateMarker {
        page_id: String,
        #[source]
        source: ServiceError,
    },
}

/// Splits `blocks` into ordered chunks of at most [`MAX_BLOCKS_PER_REQUEST`].
pub fn chunk_blocks(blocks: &[Block]) -> std::slice::Chunks<'_, Block> {
    blocks.chunks(MAX_BLOCKS_PER_REQUEST)
}

/// Number of append calls needed for `len` blocks.
pub fn batch_count(len: usize) -> usize {
    len.div_ceil(MAX_BLOCKS_PER_REQUEST)
}

/// Appends `blocks` to `parent_id` one chunk at a time, in order.
///
/// Stops at the first failed chunk; later chunks are not attempted. Returns the number
/// of chunks sent.
pub async fn append_in_batches<S>(
    store: &S,
    parent_id: &str,
    blocks: &[Block],
) -> Result<usize, BatchError>
where
    S: DocumentStore + ?Sized,
{
    let total = batch_count(blocks.len());
    for (index, chunk) in chunk_blocks(blocks).enumerate() {
        debug!(
            parent_id,
            chunk = index + 1,
            total,
            size = chunk.len(),
            "Appending block chunk"
        );
        if let Err(e) = store.append_children(parent_id, chunk).await {
            error!(parent_id, chunk = index + 1, total, error = %e, "Appending block chunk failed");
            return Err(BatchError::Append {
                chunk: index + 1,
                total,
                source: e,
            });
        }
    }
    info!(parent_id, blocks = blocks.len(), chunks = total, "Appended all blocks");
    Ok(total)
}

/// Deletes every existing child of `page_id`, appends `blocks`, then stores
/// `last_modified` as the page's modification marker.
pub async fn replace_page_content<S>(
    store: &S,
    page_id: &str,
    blocks: &[Block],
    last_modified: &str,
) -> Result<usize, BatchError>
where
    S: DocumentStore + ?Sized,
{
    let existing = store
        .list_child_blocks(page_id)
        .await
        .map_err(|source| BatchError::List {
            page_id: page_id.to_string(),
            source,
        })?;
    debug!(page_id, existing = existing.len(), "Deleting existing page content");

    for (deleted, block_id) in existing.iter().enumerate() {
        store
            .delete_block(block_id)
            .await
            .map_err(|source| BatchError::Delete {
                block_id: block_id.clone(),
                deleted,
                source,
            })?;
    }

    let chunks = append_in_batches(store, page_id, blocks).await?;
    write_marker(store, page_id, last_modified).await?;
    Ok(chunks)
}

/// Stores the modification marker. Always the last write for a page.
pub async fn write_marker<S>(store: &S, page_id: &str, last_modified: &str) -> Result<(), BatchError>
where
    S: DocumentStore + ?Sized,
{
    store
        .update_last_modified(page_id, last_modified)
        .await
        .map_err(|source| BatchError::UpdateMarker {
            page_id: page_id.to_string(),
            source,
        })
}
