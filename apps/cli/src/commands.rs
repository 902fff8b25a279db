//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use econpub_core::pipeline::{Pipeline, PipelineResult, ProgressReporter, SilentProgress};
use econpub_shared::{
    AppConfig, EditionId, EditionPaths, PipelineConfig, init_config, load_config, resolve_cookie,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// econpub: the Economist weekly edition as an EPUB.
#[derive(Parser)]
#[command(
    name = "econpub",
    version,
    about = "Download the latest Economist weekly edition and compile it into an EPUB.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Session cookie header value. Falls back to the env var named in the config.
    #[arg(long, global = true)]
    pub cookie: Option<String>,

    /// Root directory for edition artifacts (overrides the config).
    #[arg(long, global = true, env = "ECONPUB_EDITIONS_DIR")]
    pub editions_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve, download, assemble and compile the latest edition (default).
    Latest,

    /// Print the identifier of the latest edition.
    Resolve,

    /// Download the articles of an edition.
    Fetch {
        /// Edition identifier, e.g. 2024-08-31. Defaults to the latest.
        #[arg(long)]
        edition: Option<String>,
    },

    /// Assemble the Markdown document from an edition's downloaded articles.
    Assemble {
        /// Edition identifier, e.g. 2024-08-31.
        edition: String,
    },

    /// Compile an assembled edition document into an EPUB.
    Epub {
        /// Edition identifier, e.g. 2024-08-31.
        edition: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "econpub=info",
        1 => "econpub=debug",
        _ => "econpub=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let cookie = cli.cookie.as_deref();
    let editions_dir = cli.editions_dir.as_deref();

    match cli.command.unwrap_or(Command::Latest) {
        Command::Latest => cmd_latest(cookie, editions_dir).await,
        Command::Resolve => cmd_resolve(cookie, editions_dir).await,
        Command::Fetch { edition } => cmd_fetch(cookie, editions_dir, edition.as_deref()).await,
        Command::Assemble { edition } => cmd_assemble(cookie, editions_dir, &edition).await,
        Command::Epub { edition } => cmd_epub(editions_dir, &edition),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Load the config file and merge it with the session cookie and CLI overrides.
fn pipeline(cookie: Option<&str>, editions_dir: Option<&Path>) -> Result<Pipeline> {
    let config = load_config()?;
    let cookie = resolve_cookie(&config, cookie)?;
    let pipeline_config = PipelineConfig::from_app(&config, cookie, editions_dir)?;
    Ok(Pipeline::new(pipeline_config)?)
}

fn parse_edition(edition: &str) -> Result<EditionId> {
    edition
        .parse::<EditionId>()
        .wrap_err_with(|| format!("invalid edition identifier '{edition}'"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_latest(cookie: Option<&str>, editions_dir: Option<&Path>) -> Result<()> {
    let pipeline = pipeline(cookie, editions_dir)?;
    info!(root = %pipeline.config().editions_root.display(), "building latest edition");

    let reporter = CliProgress::new();
    let result = pipeline.create_latest_edition_epub(&reporter).await?;

    println!();
    println!("  Edition EPUB created successfully!");
    println!("  Edition:  {}", result.edition);
    println!("  Articles: {}", result.articles_written);
    if !result.articles_skipped.is_empty() {
        println!("  Skipped:  {}", result.articles_skipped.len());
    }
    println!("  Markdown: {}", result.markdown_path.display());
    println!("  EPUB:     {}", result.epub_path.display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_resolve(cookie: Option<&str>, editions_dir: Option<&Path>) -> Result<()> {
    let pipeline = pipeline(cookie, editions_dir)?;
    let edition = pipeline.get_latest_edition().await?;
    println!("{edition}");
    Ok(())
}

async fn cmd_fetch(
    cookie: Option<&str>,
    editions_dir: Option<&Path>,
    edition: Option<&str>,
) -> Result<()> {
    let pipeline = pipeline(cookie, editions_dir)?;

    let fetched = match edition {
        Some(edition) => pipeline.fetch_edition(&parse_edition(edition)?).await?,
        None => pipeline.fetch_all_articles_in_edition().await?,
    };

    let paths = pipeline.paths(&fetched.edition);
    println!();
    println!("  Edition:  {}", fetched.edition);
    println!("  Articles: {}", fetched.files.len());
    println!("  Path:     {}", paths.edition_dir().display());
    println!();

    Ok(())
}

async fn cmd_assemble(
    cookie: Option<&str>,
    editions_dir: Option<&Path>,
    edition: &str,
) -> Result<()> {
    let edition = parse_edition(edition)?;
    let pipeline = pipeline(cookie, editions_dir)?;

    let document = pipeline
        .write_articles_to_markdown(&edition, &SilentProgress)
        .await?;

    println!();
    println!("  Articles: {}", document.articles_written);
    if !document.articles_skipped.is_empty() {
        println!("  Skipped:  {}", document.articles_skipped.len());
    }
    println!("  Markdown: {}", document.path.display());
    println!();

    Ok(())
}

/// Compilation needs no session, so this skips cookie resolution.
fn cmd_epub(editions_dir: Option<&Path>, edition: &str) -> Result<()> {
    let edition = parse_edition(edition)?;
    let config = load_config()?;

    let paths = EditionPaths::new(config.editions_root(editions_dir), edition);

    let epub = econpub_core::compiler::create_epub(&paths, &config.compiler)?;
    println!("EPUB written to: {}", epub.display());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn article_rendered(&self, headline: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Assembling [{current}/{total}] {headline}"));
    }

    fn done(&self, _result: &PipelineResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
