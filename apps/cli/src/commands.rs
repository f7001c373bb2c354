//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use enricher_core::batch::{BatchJob, EntryLocks, enrich_catalog};
use enricher_core::pipeline::{EnrichOutcome, Enricher, ExternalOutcome, ProgressReporter};
use enricher_markdown::Labels;
use enricher_shared::{
    AppConfig, EntryId, PipelineConfig, config_file_path, init_config, init_config_at,
    load_config, load_config_from,
};
use enricher_storage::RecordStore;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// vault-enricher: pull web signals into markdown vault entries.
#[derive(Parser)]
#[command(
    name = "enricher",
    version,
    about = "Enrich markdown vault entries with titles, tags, links and previews from the web.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.vault-enricher/enricher.toml.
    #[arg(long, global = true, env = "ENRICHER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
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
    /// Enrich one entry from its primary URL.
    Enrich {
        /// Entry identifier (letters, digits, '.', '_' or '-').
        id: EntryId,

        /// Absolute URL of the primary document.
        url: Url,

        /// Extra substring qualifying an external link (repeatable).
        #[arg(long = "marker")]
        markers: Vec<String>,

        /// Output directory (overrides defaults.output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip the external-site pass.
        #[arg(long)]
        no_external: bool,
    },

    /// Run only the external-site pass for an already enriched entry.
    External {
        /// Entry identifier.
        id: EntryId,

        /// Extra substring qualifying an external link (repeatable).
        #[arg(long = "marker")]
        markers: Vec<String>,

        /// Output directory (overrides defaults.output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Re-render an entry's markdown from its stored record.
    Render {
        /// Entry identifier.
        id: EntryId,

        /// Output directory (overrides defaults.output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Enrich every [[entries]] item from the config file.
    Batch {
        /// Number of entries processed at once.
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,

        /// Output directory (overrides defaults.output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List stored records and their status.
    List {
        /// Output directory (overrides defaults.output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,
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
        0 => "enricher=info",
        1 => "enricher=debug",
        _ => "enricher=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Enrich {
            id,
            url,
            markers,
            out,
            no_external,
        } => {
            let config = load_app_config(config_path)?;
            cmd_enrich(&config, &id, &url, &markers, out, no_external).await
        }
        Command::External { id, markers, out } => {
            let config = load_app_config(config_path)?;
            cmd_external(&config, &id, &markers, out).await
        }
        Command::Render { id, out } => {
            let config = load_app_config(config_path)?;
            cmd_render(&config, &id, out)
        }
        Command::Batch { concurrency, out } => {
            let config = load_app_config(config_path)?;
            cmd_batch(&config, concurrency, out).await
        }
        Command::List { out } => {
            let config = load_app_config(config_path)?;
            cmd_list(&config, out)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config from `--config`, or from the default location.
fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Merge file config and CLI flags into the runtime pipeline config.
fn pipeline_config(config: &AppConfig, out: Option<PathBuf>) -> PipelineConfig {
    let mut pipeline = PipelineConfig::from(config);
    if let Some(out) = out {
        pipeline.output_root = out;
    }
    pipeline
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_enrich(
    config: &AppConfig,
    id: &EntryId,
    url: &Url,
    markers: &[String],
    out: Option<PathBuf>,
    no_external: bool,
) -> Result<()> {
    let mut pipeline = pipeline_config(config, out);
    pipeline.follow_external = !no_external;

    info!(%id, %url, output = %pipeline.output_root.display(), "enriching entry");

    let enricher = Enricher::new(pipeline)?;
    let reporter = CliProgress::new();
    let outcome = enricher.enrich(id, url, markers, &reporter).await?;
    reporter.finish();

    print_outcome(&outcome);
    Ok(())
}

async fn cmd_external(
    config: &AppConfig,
    id: &EntryId,
    markers: &[String],
    out: Option<PathBuf>,
) -> Result<()> {
    let enricher = Enricher::new(pipeline_config(config, out))?;
    let reporter = CliProgress::new();
    let outcome = enricher.enrich_external(id, markers, &reporter).await?;
    reporter.finish();

    if outcome.is_failed() {
        println!("  {id}: primary enrichment failed earlier; nothing to follow.");
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn cmd_render(config: &AppConfig, id: &EntryId, out: Option<PathBuf>) -> Result<()> {
    let pipeline = pipeline_config(config, out);
    let store = RecordStore::new(pipeline.output_root.clone());
    let labels = Labels::for_language(pipeline.language);

    let record = store
        .load(id)?
        .ok_or_else(|| eyre!("no enrichment record for '{id}' in {}", store.root().display()))?;

    let Some(markdown) = enricher_markdown::render_document(id, &record, labels) else {
        println!("  {id}: record holds a fetch error; no markdown rendered.");
        return Ok(());
    };

    let path = store.paths(id).markdown();
    enricher_markdown::write_document(&path, &markdown)?;
    println!("  Rendered {}", path.display());
    Ok(())
}

async fn cmd_batch(config: &AppConfig, concurrency: usize, out: Option<PathBuf>) -> Result<()> {
    if config.entries.is_empty() {
        let path = config_file_path()?;
        println!("No [[entries]] configured (see {}).", path.display());
        return Ok(());
    }

    let jobs = config
        .entries
        .iter()
        .map(BatchJob::from_catalog)
        .collect::<enricher_shared::Result<Vec<_>>>()?;

    let enricher = Arc::new(Enricher::new(pipeline_config(config, out))?);
    let reporter = Arc::new(CliProgress::new());

    let report = enrich_catalog(
        enricher,
        jobs,
        concurrency,
        EntryLocks::new(),
        Arc::clone(&reporter) as Arc<dyn ProgressReporter>,
    )
    .await;
    reporter.finish();

    for (id, result) in &report.results {
        match result {
            Ok(outcome) if outcome.is_failed() => println!(
                "  {id:<24} fetch failed: {}",
                outcome.primary_error.as_deref().unwrap_or_default()
            ),
            Ok(outcome) => println!("  {id:<24} ok{}", external_suffix(&outcome.external)),
            Err(e) => println!("  {id:<24} aborted: {e}"),
        }
    }
    println!();
    println!(
        "  {} enriched, {} fetch failures, {} aborted",
        report.succeeded(),
        report.fetch_failed(),
        report.errored()
    );

    if report.errored() > 0 {
        return Err(eyre!("{} entries aborted", report.errored()));
    }
    Ok(())
}

fn cmd_list(config: &AppConfig, out: Option<PathBuf>) -> Result<()> {
    let pipeline = pipeline_config(config, out);
    let store = RecordStore::new(pipeline.output_root);

    let ids = store.list()?;
    if ids.is_empty() {
        println!("No records in {}", store.root().display());
        return Ok(());
    }

    for id in ids {
        let status = match store.load(&id) {
            Ok(Some(record)) if record.is_failed() => {
                format!("error: {}", record.error.unwrap_or_default())
            }
            Ok(Some(record)) => {
                let external = match &record.external_site_data {
                    Some(site) if site.error.is_some() => " +external (failed)",
                    Some(_) => " +external",
                    None => "",
                };
                format!("ok{external}")
            }
            Ok(None) => "missing".to_string(),
            Err(e) => format!("unreadable: {e}"),
        };
        println!("  {id:<24} {status}");
    }
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = load_app_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_outcome(outcome: &EnrichOutcome) {
    println!();
    match &outcome.primary_error {
        Some(error) => {
            println!("  {}: primary fetch failed", outcome.id);
            println!("  Error:    {error}");
        }
        None => {
            println!("  {} enriched{}", outcome.id, external_suffix(&outcome.external));
            if let Some(path) = &outcome.markdown_path {
                println!("  Markdown: {}", path.display());
            }
        }
    }
    println!("  Record:   {}", outcome.record_path.display());
    println!("  Time:     {:.1}s", outcome.elapsed.as_secs_f64());
    println!();
}

fn external_suffix(external: &ExternalOutcome) -> String {
    match external {
        ExternalOutcome::Skipped => String::new(),
        ExternalOutcome::Enriched { url, images } => format!(" (+ {url}, {images} images)"),
        ExternalOutcome::Failed { url, error } => format!(" ({url} failed: {error})"),
    }
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, outcome: &EnrichOutcome) {
        self.spinner
            .set_message(format!("{} done in {:.1}s", outcome.id, outcome.elapsed.as_secs_f64()));
    }
}
