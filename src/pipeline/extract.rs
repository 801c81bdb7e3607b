//! Plain-text extraction from uploaded source material (.docx, .pdf, .txt).
//!
//! The extracted text only feeds the report-generation prompt, so layout is
//! discarded: one line per paragraph (DOCX) or the raw page text (PDF).
//!
//! ## Why spawn_blocking for PDF?
//!
//! pdfium is a C++ library with thread-local state and no async API. Text
//! extraction runs on tokio's blocking pool so a large upload cannot stall
//! the worker threads.

use crate::error::Md2GostError;
use pdfium_render::prelude::*;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::{debug, info};
use zip::ZipArchive;

/// Source formats accepted by [`extract_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Docx,
    Pdf,
    Txt,
}

impl SourceFormat {
    /// Detect the format from a file name (case-insensitive extension).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let name = filename.to_lowercase();
        if name.ends_with(".docx") {
            Some(SourceFormat::Docx)
        } else if name.ends_with(".pdf") {
            Some(SourceFormat::Pdf)
        } else if name.ends_with(".txt") {
            Some(SourceFormat::Txt)
        } else {
            None
        }
    }
}

/// Extract plain text from an uploaded file, dispatching on its extension.
pub async fn extract_text(bytes: &[u8], filename: &str) -> Result<String, Md2GostError> {
    let format = SourceFormat::from_filename(filename).ok_or_else(|| {
        Md2GostError::UnsupportedInput {
            filename: filename.to_string(),
        }
    })?;

    let text = match format {
        SourceFormat::Txt => String::from_utf8_lossy(bytes).into_owned(),
        SourceFormat::Docx => docx_text(bytes).map_err(|detail| Md2GostError::ExtractionFailed {
            filename: filename.to_string(),
            detail,
        })?,
        SourceFormat::Pdf => {
            let owned = bytes.to_vec();
            let name = filename.to_string();
            tokio::task::spawn_blocking(move || pdf_text(&owned, &name))
                .await
                .map_err(|e| Md2GostError::Internal(format!("PDF task panicked: {}", e)))??
        }
    };

    info!(
        "Extracted {} chars from '{}' ({:?})",
        text.chars().count(),
        filename,
        format
    );
    Ok(text)
}

/// Text of the top-level body paragraphs of `word/document.xml`; blank
/// paragraphs are skipped and table content is ignored.
fn docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX archive: {e}"))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("word/document.xml: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("word/document.xml: {e}"))?;

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut table_depth = 0usize;
    let mut in_paragraph = false;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"p" if table_depth == 0 => {
                    in_paragraph = true;
                    current.clear();
                }
                b"r" => in_run = in_paragraph,
                b"t" => in_text = in_run,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if in_run => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| format!("word/document.xml: {e}"))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" if in_paragraph && table_depth == 0 => {
                    in_paragraph = false;
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("word/document.xml: {e}")),
            _ => {}
        }
        buf.clear();
    }

    debug!("DOCX: {} non-blank paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

fn bind_pdfium() -> Result<Pdfium, Md2GostError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Md2GostError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Blocking PDF text extraction; pages without text are skipped.
fn pdf_text(bytes: &[u8], filename: &str) -> Result<String, Md2GostError> {
    let pdfium = bind_pdfium()?;
    let failed = |detail: String| Md2GostError::ExtractionFailed {
        filename: filename.to_string(),
        detail,
    };

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| failed(format!("{:?}", e)))?;

    let mut pages = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| failed(format!("page {}: {:?}", index + 1, e)))?
            .all();
        if !text.is_empty() {
            pages.push(text);
        }
    }

    debug!("PDF: {} pages with text", pages.len());
    Ok(pages.join("\n"))
}
