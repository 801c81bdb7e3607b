//! # md2gost
//!
//! Turn a Markdown report with a YAML frontmatter header into a `.docx`
//! formatted to the Russian academic standard GOST 7.32-2017.
//!
//! ## Why this crate?
//!
//! Student reports are easy to write in Markdown and tedious to format by
//! hand: Times New Roman 14, 1.5 spacing, 1.25 cm indents, fixed margins, a
//! title page with the university block, a table of contents and numbered
//! headings. This crate does all of it from plain text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Frontmatter  YAML header → Metadata (11 string fields)
//!  ├─ 2. Parse        CommonMark + tables → Vec<Block>
//!  ├─ 3. Images       concurrent, policy-gated fetch; failures → placeholder
//!  ├─ 4. Render       title page, СОДЕРЖАНИЕ, numbered body
//!  └─ 5. Package      WordprocessingML parts zipped into .docx bytes
//! ```
//!
//! An optional front stage drafts the Markdown itself from lecture notes
//! (`.docx`, `.pdf`, `.txt`) through an LLM; see [`draft_from_source`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2gost::{convert_markdown, Metadata, RenderConfig, WorkType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let text = "---\ntitle: Сортировки\nauthor: Иванов И.И.\n---\n# Введение\n\nТекст.";
//!     let docx = convert_markdown(text, WorkType::Lab, &Metadata::default(), &RenderConfig::default()).await?;
//!     std::fs::write("report.docx", docx)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2gost` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2gost = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod style;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    GenerationConfig, GenerationConfigBuilder, ImagePolicy, RenderConfig, RenderConfigBuilder,
    TitleDefaults,
};
pub use convert::{convert_markdown, convert_markdown_sync, convert_to_file, draft_from_source};
pub use error::{FrontmatterError, ImageFetchError, Md2GostError};
pub use model::{Block, Metadata, Run, WorkType};
pub use pipeline::extract::extract_text;
pub use pipeline::llm::generate_report;
pub use pipeline::parse::parse_markdown;
pub use pipeline::postprocess::clean_markdown;
pub use pipeline::render::{build_document, build_document_sync};
pub use template::EXAMPLE_TEMPLATE;
