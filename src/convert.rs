//! Top-level conversion entry points.
//!
//! * [`convert_markdown`]: Markdown text in, `.docx` bytes out.
//! * [`convert_to_file`]: the same, written atomically to disk.
//! * [`draft_from_source`]: uploaded lecture notes in, Markdown draft out.
//!   The draft is meant to be reviewed and then passed to [`convert_markdown`].

use crate::config::{GenerationConfig, RenderConfig};
use crate::error::Md2GostError;
use crate::model::{Metadata, WorkType};
use crate::pipeline::{extract, llm, parse, postprocess, render};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Convert a Markdown report with optional YAML frontmatter to DOCX bytes.
///
/// Non-empty fields of `overrides` replace the frontmatter values, so a
/// caller can fill in a name or group the author left out.
///
/// # Errors
/// * [`Md2GostError::Frontmatter`]: the YAML header is malformed
/// * [`Md2GostError::EmptyDocument`]: nothing renderable after the header
/// * [`Md2GostError::RenderFailed`]: the package could not be assembled
///
/// # Example
/// ```rust,no_run
/// use md2gost::{convert_markdown, Metadata, RenderConfig, WorkType};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let text = std::fs::read_to_string("report.md")?;
/// let docx = convert_markdown(&text, WorkType::Lab, &Metadata::default(), &RenderConfig::default()).await?;
/// std::fs::write("report.docx", docx)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_markdown(
    text: &str,
    work_type: WorkType,
    overrides: &Metadata,
    config: &RenderConfig,
) -> Result<Vec<u8>, Md2GostError> {
    let start = Instant::now();

    let (mut metadata, blocks) = parse::parse_markdown(text)?;
    metadata.apply_overrides(overrides);
    debug!("Parsed {} blocks in {}ms", blocks.len(), start.elapsed().as_millis());

    if blocks.is_empty() {
        return Err(Md2GostError::EmptyDocument);
    }

    render::build_document(&blocks, &metadata, work_type, config).await
}

/// Synchronous wrapper around [`convert_markdown`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_markdown_sync(
    text: &str,
    work_type: WorkType,
    overrides: &Metadata,
    config: &RenderConfig,
) -> Result<Vec<u8>, Md2GostError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2GostError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_markdown(text, work_type, overrides, config))
}

/// Convert Markdown and write the `.docx` to `output_path`.
///
/// The document is written to a temp file in the target directory and then
/// renamed over the destination, so a failed run never leaves a truncated file.
/// Returns the number of bytes written.
pub async fn convert_to_file(
    text: &str,
    output_path: impl AsRef<Path>,
    work_type: WorkType,
    overrides: &Metadata,
    config: &RenderConfig,
) -> Result<usize, Md2GostError> {
    let bytes = convert_markdown(text, work_type, overrides, config).await?;
    let path = output_path.as_ref();
    write_atomic(path, &bytes)?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2GostError> {
    let write_err = |source: std::io::Error| Md2GostError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Draft a Markdown report from an uploaded `.docx`, `.pdf` or `.txt` file.
///
/// The returned Markdown has no frontmatter; metadata is supplied when the
/// draft is converted.
///
/// # Errors
/// * [`Md2GostError::UnsupportedInput`]: unknown file extension
/// * [`Md2GostError::ExtractionFailed`]: unreadable file or no text in it
/// * [`Md2GostError::ProviderNotConfigured`]: no LLM provider available
/// * [`Md2GostError::LlmApiError`] / [`Md2GostError::EmptyGeneration`]
pub async fn draft_from_source(
    bytes: &[u8],
    filename: &str,
    work_type: WorkType,
    config: &GenerationConfig,
) -> Result<String, Md2GostError> {
    let text = extract::extract_text(bytes, filename).await?;
    if text.trim().is_empty() {
        return Err(Md2GostError::ExtractionFailed {
            filename: filename.to_string(),
            detail: "no text found".to_string(),
        });
    }

    let provider = resolve_provider(config)?;
    let raw = llm::generate_report(&provider, &text, work_type, config).await?;
    let draft = postprocess::clean_markdown(&raw);

    info!(
        "Drafted {} chars of Markdown from '{}'",
        draft.chars().count(),
        filename
    );
    Ok(draft)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Md2GostError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Md2GostError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is
/// 2. `config.provider_name` with `config.model`
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. Gemini, when `GEMINI_API_KEY` is set
/// 5. whatever [`ProviderFactory::from_env`] detects
fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, Md2GostError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Md2GostError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
