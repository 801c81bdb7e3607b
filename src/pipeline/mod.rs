//! Pipeline stages for Markdown-to-GOST-DOCX conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//!             ┌────────── optional AI draft ──────────┐
//!  upload ──▶ extract ──▶ llm ──▶ postprocess ──┐
//!                                               ▼
//!  Markdown ─────────────────────────────▶ frontmatter ──▶ parse ──▶ render ──▶ .docx
//!                                          (Metadata)     (Blocks)   (zip)
//! ```
//!
//! 1. [`extract`]: plain text out of .docx / .pdf / .txt uploads
//! 2. [`llm`]: draft a report from that text, with retry/backoff
//! 3. [`postprocess`]: deterministic clean-up of the model's Markdown
//! 4. [`frontmatter`]: split the YAML header into [`crate::model::Metadata`]
//! 5. [`parse`]: lower the Markdown AST into [`crate::model::Block`]s
//! 6. [`render`]: title page, contents, body; fetch images; zip it up

pub mod extract;
pub mod frontmatter;
pub mod llm;
pub mod parse;
pub mod postprocess;
pub mod render;
