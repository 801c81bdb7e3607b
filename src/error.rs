//! Error types for the md2gost library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`FrontmatterError`]: the YAML header at the top of the Markdown could
//!   not be decoded. Its message is written for the end user (in Russian, like
//!   the rest of the generated document) and must be shown verbatim.
//!
//! * [`Md2GostError`]: **Fatal**: the conversion cannot proceed at all
//!   (empty document, unsupported upload, provider not configured, the DOCX
//!   package could not be assembled). Returned as `Err` from the top-level
//!   entry points in [`crate::convert`].
//!
//! * [`ImageFetchError`]: **Non-fatal**: a single remote image could not be
//!   embedded. The renderer logs it and falls back to a text placeholder; it
//!   never aborts the document.

use std::path::PathBuf;
use thiserror::Error;

/// The YAML frontmatter header is present but cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Ошибка в YAML-заголовке документа: {cause}\nПроверьте формат YAML между маркерами ---.")]
pub struct FrontmatterError {
    /// The underlying YAML parser complaint.
    pub cause: String,
}

impl FrontmatterError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// All fatal errors returned by the md2gost library.
#[derive(Debug, Error)]
pub enum Md2GostError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Frontmatter decoding failed; parsing stops before any rendering.
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),

    /// Parsing succeeded but produced no content blocks.
    #[error("Document is empty: no headings, paragraphs, lists, tables or images were found")]
    EmptyDocument,

    /// An uploaded source file has an extension we cannot extract text from.
    #[error("Unsupported input format: '{filename}'\nSupported formats: .docx, .pdf, .txt")]
    UnsupportedInput { filename: String },

    /// The source file was recognised but text extraction failed.
    #[error("Failed to extract text from '{filename}': {detail}")]
    ExtractionFailed { filename: String, detail: String },

    /// Could not read the input file from disk.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind to a pdfium library for PDF extraction.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF uploads need the pdfium shared library. You can:\n\
  • Install pdfium system-wide, or\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API kept failing after all retries.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { retries: u32, message: String },

    /// The model answered with an empty completion.
    #[error("LLM returned an empty report")]
    EmptyGeneration,

    // ── Render errors ─────────────────────────────────────────────────────
    /// Assembling the DOCX package failed; no partial output is produced.
    #[error("Failed to render document: {detail}")]
    RenderFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output DOCX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for Md2GostError {
    fn from(e: zip::result::ZipError) -> Self {
        Md2GostError::RenderFailed {
            detail: format!("zip: {e}"),
        }
    }
}

/// Why a remote image ended up as a text placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageFetchError {
    /// Only http:// and https:// URLs are fetched.
    #[error("unsupported URL scheme: '{url}'")]
    UnsupportedScheme { url: String },

    /// Remote fetching is disabled or the host is not on the allow-list.
    #[error("remote images are not allowed for '{url}'")]
    NotAllowed { url: String },

    #[error("timed out after {secs}s fetching '{url}'")]
    Timeout { url: String, secs: u64 },

    #[error("HTTP {status} fetching '{url}'")]
    HttpStatus { url: String, status: u16 },

    #[error("network error fetching '{url}': {detail}")]
    Network { url: String, detail: String },

    /// The body exceeded the configured byte cap.
    #[error("'{url}' is larger than {limit} bytes")]
    TooLarge { url: String, limit: usize },

    /// The bytes are not an image format a DOCX can embed.
    #[error("'{url}' is not an embeddable image: {detail}")]
    Undecodable { url: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmatter_error_mentions_yaml_and_delimiters() {
        let e = FrontmatterError::new("mapping values are not allowed here");
        let msg = e.to_string();
        assert!(msg.contains("YAML"), "got: {msg}");
        assert!(msg.contains("---"), "got: {msg}");
        assert!(msg.contains("mapping values are not allowed here"));
    }

    #[test]
    fn frontmatter_error_is_transparent_in_fatal_error() {
        let inner = FrontmatterError::new("bad indent");
        let outer: Md2GostError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());
    }

    #[test]
    fn unsupported_input_display() {
        let e = Md2GostError::UnsupportedInput {
            filename: "slides.pptx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("slides.pptx"), "got: {msg}");
        assert!(msg.contains(".docx"));
    }

    #[test]
    fn llm_api_error_display() {
        let e = Md2GostError::LlmApiError {
            retries: 3,
            message: "503 overloaded".into(),
        };
        assert!(e.to_string().contains("3 retries"));
        assert!(e.to_string().contains("503 overloaded"));
    }

    #[test]
    fn image_fetch_error_display() {
        let e = ImageFetchError::Timeout {
            url: "https://example.org/a.png".into(),
            secs: 10,
        };
        assert!(e.to_string().contains("10s"));
        let e = ImageFetchError::TooLarge {
            url: "https://example.org/big.png".into(),
            limit: 5 * 1024 * 1024,
        };
        assert!(e.to_string().contains("5242880"));
    }
}
