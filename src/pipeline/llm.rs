//! Report drafting: source text → Markdown report via an LLM.
//!
//! The call is a single user turn built from [`crate::prompts`]. All prompt
//! wording lives there; this module owns only retry and error mapping.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 answers are transient. Waits grow as
//! `retry_backoff_ms * 2^(attempt-1)`: with the defaults (500 ms, 3 retries)
//! that is 500 ms → 1 s → 2 s before giving up.

use crate::config::GenerationConfig;
use crate::error::Md2GostError;
use crate::model::WorkType;
use crate::prompts::report_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Ask the provider for a structured report on `source_text`.
///
/// Returns the raw completion; run it through
/// [`crate::pipeline::postprocess::clean_markdown`] before parsing.
pub async fn generate_report(
    provider: &Arc<dyn LLMProvider>,
    source_text: &str,
    work_type: WorkType,
    config: &GenerationConfig,
) -> Result<String, Md2GostError> {
    let start = Instant::now();
    let prompt = report_prompt(config.prompt_template.as_deref(), work_type, source_text);
    let messages = vec![ChatMessage::user(prompt)];
    let options = build_options(config);

    info!(
        "Generating {} draft from {} source chars",
        work_type.key(),
        source_text.chars().count()
    );

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Report generation: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "Report generation: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                if response.content.trim().is_empty() {
                    return Err(Md2GostError::EmptyGeneration);
                }
                return Ok(response.content);
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Report generation: attempt {} failed: {}", attempt + 1, message);
                last_err = Some(message);
            }
        }
    }

    Err(Md2GostError::LlmApiError {
        retries: config.max_retries,
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&GenerationConfig::default());
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(u64::MAX, 5), u64::MAX);
    }
}
