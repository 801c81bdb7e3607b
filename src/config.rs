//! Configuration types for rendering and draft generation.
//!
//! Rendering is controlled through [`RenderConfig`], AI draft generation
//! through [`GenerationConfig`]. Both are built via builders so callers set
//! only what they care about and rely on documented defaults for the rest.
//! A config is an immutable value: build it once at start-up and share it
//! across every document the process renders.

use crate::error::Md2GostError;
use crate::style;
use chrono::Datelike;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for rendering blocks into a DOCX document.
///
/// # Example
/// ```rust
/// use md2gost::{ImagePolicy, RenderConfig};
///
/// let config = RenderConfig::builder()
///     .university("Московский государственный университет")
///     .image_policy(ImagePolicy::Disabled)
///     .build()
///     .unwrap();
/// assert_eq!(config.image_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Title-page values used when the frontmatter leaves a field blank.
    pub defaults: TitleDefaults,

    /// Which image URLs may be fetched while rendering. Default: [`ImagePolicy::AllowAll`].
    ///
    /// Fetching means the renderer performs network requests to URLs taken
    /// verbatim from the Markdown. Services rendering untrusted input should
    /// switch to [`ImagePolicy::Disabled`] or an explicit host allow-list.
    pub image_policy: ImagePolicy,

    /// Per-image HTTP timeout in seconds. Default: 10.
    pub image_timeout_secs: u64,

    /// Maximum accepted image body in bytes. Default: 5 MiB.
    ///
    /// A larger body is treated as unavailable and replaced by the text
    /// placeholder rather than truncated into a corrupt picture.
    pub image_max_bytes: usize,

    /// Width of embedded images in centimetres. Default: 14.
    pub image_width_cm: f64,

    /// Number of images fetched concurrently. Default: 4.
    pub image_concurrency: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            defaults: TitleDefaults::default(),
            image_policy: ImagePolicy::default(),
            image_timeout_secs: 10,
            image_max_bytes: 5 * 1024 * 1024,
            image_width_cm: style::IMAGE_WIDTH_CM,
            image_concurrency: 4,
        }
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Title-page fallbacks for blank metadata fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDefaults {
    pub university: String,
    pub institute: String,
    pub department: String,
    pub city: String,
    pub group: String,
    /// Defaults to the current calendar year.
    pub year: String,
}

impl Default for TitleDefaults {
    fn default() -> Self {
        Self {
            university: style::DEFAULT_UNIVERSITY.to_string(),
            institute: style::DEFAULT_INSTITUTE.to_string(),
            department: style::DEFAULT_DEPARTMENT.to_string(),
            city: style::DEFAULT_CITY.to_string(),
            group: style::DEFAULT_GROUP.to_string(),
            year: chrono::Local::now().year().to_string(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn university(mut self, v: impl Into<String>) -> Self {
        self.config.defaults.university = v.into();
        self
    }

    pub fn institute(mut self, v: impl Into<String>) -> Self {
        self.config.defaults.institute = v.into();
        self
    }

    pub fn department(mut self, v: impl Into<String>) -> Self {
        self.config.defaults.department = v.into();
        self
    }

    pub fn city(mut self, v: impl Into<String>) -> Self {
        self.config.defaults.city = v.into();
        self
    }

    pub fn group(mut self, v: impl Into<String>) -> Self {
        self.config.defaults.group = v.into();
        self
    }

    pub fn year(mut self, v: impl Into<String>) -> Self {
        self.config.defaults.year = v.into();
        self
    }

    pub fn image_policy(mut self, policy: ImagePolicy) -> Self {
        self.config.image_policy = policy;
        self
    }

    pub fn image_timeout_secs(mut self, secs: u64) -> Self {
        self.config.image_timeout_secs = secs;
        self
    }

    pub fn image_max_bytes(mut self, bytes: usize) -> Self {
        self.config.image_max_bytes = bytes;
        self
    }

    pub fn image_width_cm(mut self, cm: f64) -> Self {
        self.config.image_width_cm = cm;
        self
    }

    pub fn image_concurrency(mut self, n: usize) -> Self {
        self.config.image_concurrency = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, Md2GostError> {
        let c = &self.config;
        if c.image_timeout_secs == 0 {
            return Err(Md2GostError::InvalidConfig(
                "Image timeout must be ≥ 1 second".into(),
            ));
        }
        if !(1.0..=16.5).contains(&c.image_width_cm) {
            return Err(Md2GostError::InvalidConfig(format!(
                "Image width must be 1–16.5 cm, got {}",
                c.image_width_cm
            )));
        }
        if c.image_max_bytes == 0 {
            return Err(Md2GostError::InvalidConfig(
                "Image byte cap must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Which remote image URLs the renderer may fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePolicy {
    /// Never fetch; every image renders as a placeholder.
    Disabled,
    /// Fetch any http/https URL. (default)
    #[default]
    AllowAll,
    /// Fetch only from these hosts (exact, case-insensitive match).
    AllowHosts(Vec<String>),
}

impl ImagePolicy {
    /// Whether a URL with the given host may be fetched.
    pub fn allows_host(&self, host: &str) -> bool {
        match self {
            ImagePolicy::Disabled => false,
            ImagePolicy::AllowAll => true,
            ImagePolicy::AllowHosts(hosts) => hosts.iter().any(|h| h.eq_ignore_ascii_case(host)),
        }
    }
}

/// Configuration for AI draft generation.
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier. If None, uses "gemini-2.5-flash" for named
    /// providers and the provider default otherwise.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.3.
    ///
    /// A report needs readable prose rather than a verbatim transcription,
    /// but it still has to stay close to the source material.
    pub temperature: f32,

    /// Maximum tokens for the generated report. Default: 8192.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient API failure. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom prompt template. Must contain `{work_type_label}` and `{text}`.
    pub prompt_template: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            prompt_template: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("prompt_template", &self.prompt_template.is_some())
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Md2GostError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(Md2GostError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if let Some(ref template) = c.prompt_template {
            if !template.contains("{text}") {
                return Err(Md2GostError::InvalidConfig(
                    "Prompt template must contain the {text} placeholder".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
