//! CLI binary for md2gost.
//!
//! A thin shim over the library crate that maps CLI flags onto
//! `RenderConfig` / `GenerationConfig` / `Metadata` and writes the `.docx`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2gost::{
    convert_to_file, draft_from_source, parse_markdown, GenerationConfig, ImagePolicy, Metadata,
    RenderConfig, WorkType, EXAMPLE_TEMPLATE,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

fn spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("md2gost");
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a report (writes report.docx next to it)
  md2gost report.md

  # Coursework with the author filled in from the command line
  md2gost report.md -o out/kursovaya.docx --work-type coursework --author "Иванов И.И."

  # Print a starter document with every frontmatter field
  md2gost --template > report.md

  # Draft a report from lecture notes with an LLM, keep the Markdown for editing
  md2gost --from-source lecture.pdf --save-draft draft.md -o report.docx

  # Inspect what the parser sees
  md2gost --dump-blocks report.md

  # Offline build: every image becomes a text placeholder
  md2gost --no-remote-images report.md

FRONTMATTER KEYS:
  title, author, group, teacher, subject, university, year,
  work_number, institute, department, city

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred for --from-source)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium (for .pdf sources)
  RUST_LOG                Log filter; overrides --verbose / --quiet
"#;

/// Convert Markdown reports into GOST 7.32-2017 formatted DOCX.
#[derive(Parser, Debug)]
#[command(
    name = "md2gost",
    version,
    about = "Convert Markdown reports into GOST 7.32-2017 formatted DOCX",
    long_about = "Convert a Markdown report with a YAML frontmatter header into a .docx with a \
GOST 7.32-2017 title page, table of contents, numbered headings and standard page layout. \
Optionally draft the Markdown from .docx/.pdf/.txt lecture notes with an LLM first.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    #[arg(required_unless_present_any = ["from_source", "template"], conflicts_with = "from_source")]
    input: Option<PathBuf>,

    /// Output .docx path. Defaults to the input path with a .docx extension.
    #[arg(short, long, env = "MD2GOST_OUTPUT")]
    output: Option<PathBuf>,

    /// Kind of work; selects the title-page wording.
    #[arg(short = 't', long, env = "MD2GOST_WORK_TYPE", value_enum, default_value = "lab")]
    work_type: WorkTypeArg,

    // ── Metadata overrides (win over the frontmatter) ──────────────────────
    /// Report title.
    #[arg(long)]
    title: Option<String>,

    /// Student name, e.g. "Иванов И.И.".
    #[arg(long, env = "MD2GOST_AUTHOR")]
    author: Option<String>,

    /// Supervisor name.
    #[arg(long, env = "MD2GOST_TEACHER")]
    teacher: Option<String>,

    /// Student group.
    #[arg(long, env = "MD2GOST_GROUP")]
    group: Option<String>,

    /// Subject (discipline).
    #[arg(long)]
    subject: Option<String>,

    /// Work number shown after "№".
    #[arg(long)]
    work_number: Option<String>,

    // ── Title-page defaults (used when neither frontmatter nor flags set them)
    /// University name.
    #[arg(long, env = "MD2GOST_UNIVERSITY")]
    university: Option<String>,

    /// Institute name.
    #[arg(long, env = "MD2GOST_INSTITUTE")]
    institute: Option<String>,

    /// Department name.
    #[arg(long, env = "MD2GOST_DEPARTMENT")]
    department: Option<String>,

    /// City printed above the year.
    #[arg(long, env = "MD2GOST_CITY")]
    city: Option<String>,

    // ── Images ─────────────────────────────────────────────────────────────
    /// Never fetch remote images; render every image as a placeholder.
    #[arg(long, env = "MD2GOST_NO_REMOTE_IMAGES", conflicts_with = "allow_image_host")]
    no_remote_images: bool,

    /// Fetch images only from this host (repeatable).
    #[arg(long = "allow-image-host", value_name = "HOST")]
    allow_image_host: Vec<String>,

    /// Per-image download timeout in seconds.
    #[arg(long, env = "MD2GOST_IMAGE_TIMEOUT", default_value_t = 10)]
    image_timeout: u64,

    // ── AI drafting ────────────────────────────────────────────────────────
    /// Draft the report from a .docx, .pdf or .txt file with an LLM.
    #[arg(long, value_name = "FILE")]
    from_source: Option<PathBuf>,

    /// Also save the generated Markdown draft here.
    #[arg(long, value_name = "FILE", requires = "from_source")]
    save_draft: Option<PathBuf>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gemini-2.5-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "MD2GOST_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, env = "MD2GOST_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    // ── Other modes ────────────────────────────────────────────────────────
    /// Print the parsed metadata and blocks as JSON instead of converting.
    #[arg(long)]
    dump_blocks: bool,

    /// Print an example Markdown report and exit.
    #[arg(long)]
    template: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2GOST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2GOST_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum WorkTypeArg {
    Lab,
    Coursework,
    Practice,
    Report,
}

impl From<WorkTypeArg> for WorkType {
    fn from(v: WorkTypeArg) -> Self {
        match v {
            WorkTypeArg::Lab => WorkType::Lab,
            WorkTypeArg::Coursework => WorkType::Coursework,
            WorkTypeArg::Practice => WorkType::Practice,
            WorkTypeArg::Report => WorkType::Report,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers progress; library INFO logs would tear it.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Template mode ────────────────────────────────────────────────────
    if cli.template {
        io::stdout()
            .lock()
            .write_all(EXAMPLE_TEMPLATE.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    let work_type = WorkType::from(cli.work_type);
    let overrides = build_overrides(&cli);
    let total_start = Instant::now();

    // ── Obtain Markdown ──────────────────────────────────────────────────
    let (markdown, source_path) = if let Some(ref source) = cli.from_source {
        let draft = draft(&cli, source, work_type).await?;
        (draft, source.clone())
    } else if let Some(ref input) = cli.input {
        let text = tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;
        (text, input.clone())
    } else {
        bail!("No input file given");
    };

    // ── Dump mode ────────────────────────────────────────────────────────
    if cli.dump_blocks {
        let (mut metadata, blocks) = parse_markdown(&markdown)?;
        metadata.apply_overrides(&overrides);
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "metadata": metadata,
            "blocks": blocks,
        }))
        .context("Failed to serialise blocks")?;
        println!("{json}");
        return Ok(());
    }

    // ── Convert ──────────────────────────────────────────────────────────
    let config = build_render_config(&cli)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| source_path.with_extension("docx"));

    let bar = spinner(cli.quiet, "Rendering document…");
    let result = convert_to_file(&markdown, &output_path, work_type, &overrides, &config).await;
    bar.finish_and_clear();
    let written = result.context("Conversion failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            dim(&format!("{} KiB", written.div_ceil(1024))),
            dim(&format!("{}ms", total_start.elapsed().as_millis())),
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Run the AI drafting stage and optionally save its Markdown.
async fn draft(cli: &Cli, source: &Path, work_type: WorkType) -> Result<String> {
    let bytes = tokio::fs::read(source)
        .await
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let filename = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let config = build_generation_config(cli)?;
    let bar = spinner(cli.quiet, &format!("Drafting report from {filename}…"));
    let result = draft_from_source(&bytes, &filename, work_type, &config).await;
    bar.finish_and_clear();
    let markdown = result.context("Draft generation failed")?;

    if let Some(ref path) = cli.save_draft {
        tokio::fs::write(path, &markdown)
            .await
            .with_context(|| format!("Failed to save draft to {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{}  draft  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    }
    Ok(markdown)
}

/// Map metadata flags to a patch applied over the frontmatter.
fn build_overrides(cli: &Cli) -> Metadata {
    let mut meta = Metadata::default();
    let fields = [
        ("title", &cli.title),
        ("author", &cli.author),
        ("teacher", &cli.teacher),
        ("group", &cli.group),
        ("subject", &cli.subject),
        ("work_number", &cli.work_number),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            meta.set(key, v.as_str());
        }
    }
    meta
}

/// Map CLI args to `RenderConfig`.
fn build_render_config(cli: &Cli) -> Result<RenderConfig> {
    let policy = if cli.no_remote_images {
        ImagePolicy::Disabled
    } else if !cli.allow_image_host.is_empty() {
        ImagePolicy::AllowHosts(cli.allow_image_host.clone())
    } else {
        ImagePolicy::AllowAll
    };

    let mut builder = RenderConfig::builder()
        .image_policy(policy)
        .image_timeout_secs(cli.image_timeout);
    if let Some(ref v) = cli.university {
        builder = builder.university(v);
    }
    if let Some(ref v) = cli.institute {
        builder = builder.institute(v);
    }
    if let Some(ref v) = cli.department {
        builder = builder.department(v);
    }
    if let Some(ref v) = cli.city {
        builder = builder.city(v);
    }
    builder.build().context("Invalid render configuration")
}

/// Map CLI args to `GenerationConfig`.
fn build_generation_config(cli: &Cli) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .temperature(cli.temperature)
        .max_retries(cli.max_retries);
    if let Some(ref p) = cli.provider {
        builder = builder.provider_name(p);
    }
    if let Some(ref m) = cli.model {
        builder = builder.model(m);
    }
    builder.build().context("Invalid generation configuration")
}
