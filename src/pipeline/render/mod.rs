//! DOCX rendering: blocks + metadata → GOST 7.32 formatted `.docx` bytes.
//!
//! ## Layout of the generated document
//!
//! ```text
//!  title page ─▶ page break ─▶ СОДЕРЖАНИЕ ─▶ page break ─▶ body ─▶ sectPr
//! ```
//!
//! WordprocessingML is written directly as strings and zipped; no document
//! object model is kept in memory. Element order inside property blocks is
//! handled once in [`xml`].
//!
//! ## Why fetch images first?
//!
//! Image downloads are the only I/O in rendering. Doing them all up front,
//! concurrently, keeps the XML writers synchronous and lets each failure
//! degrade its own block to a placeholder without touching anything else.

mod body;
mod images;
mod numbering;
mod package;
mod title;
mod toc;
mod xml;

use crate::config::RenderConfig;
use crate::error::Md2GostError;
use crate::model::{Block, Metadata, WorkType};
use std::time::Instant;
use tracing::info;

/// Render blocks into a complete `.docx` package held in memory.
///
/// Remote images are fetched according to `config.image_policy`; any image
/// that cannot be embedded is replaced by an italic text placeholder.
pub async fn build_document(
    blocks: &[Block],
    metadata: &Metadata,
    work_type: WorkType,
    config: &RenderConfig,
) -> Result<Vec<u8>, Md2GostError> {
    let start = Instant::now();

    let images = images::fetch_images(blocks, config).await;

    let mut document = xml::Body::default();
    title::write_title_page(&mut document, metadata, work_type, &config.defaults);
    document.page_break();
    toc::write_toc(&mut document, blocks);
    document.page_break();
    body::write_body(&mut document, blocks, images, config);

    let bytes = package::assemble(document, metadata)?;

    info!(
        "Rendered {} blocks into {} bytes in {}ms",
        blocks.len(),
        bytes.len(),
        start.elapsed().as_millis()
    );
    Ok(bytes)
}

/// Synchronous wrapper around [`build_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn build_document_sync(
    blocks: &[Block],
    metadata: &Metadata,
    work_type: WorkType,
    config: &RenderConfig,
) -> Result<Vec<u8>, Md2GostError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2GostError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(build_document(blocks, metadata, work_type, config))
}
