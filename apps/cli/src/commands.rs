//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use energydocs_core::pipeline::{self, ProgressReporter};
use energydocs_crawler::{SourceSite, default_sources};
use energydocs_shared::{PipelineConfig, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// energydocs — harvest Thai energy-sector documents into a screened corpus.
#[derive(Parser)]
#[command(
    name = "energydocs",
    version,
    about = "Harvest Thai energy-sector documents, screen for personal data, and distribute the corpus.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Run the full harvest pipeline.
    Run {
        /// Limit the run to these source organizations (repeatable).
        #[arg(short, long)]
        source: Vec<String>,
    },

    /// List the configured harvest sources.
    Sources,

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
    /// Show resolved configuration (secrets redacted).
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "energydocs=info",
        1 => "energydocs=debug",
        _ => "energydocs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { source } => cmd_run(&source).await,
        Command::Sources => cmd_sources(),
        Command::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn cmd_run(only: &[String]) -> Result<()> {
    let config = PipelineConfig::from_env()?;
    let sources = select_sources(only)?;

    info!(sources = sources.len(), "starting harvest run");

    // Ctrl-C flips the shutdown flag; the harvest stops between fetches and
    // the run flushes whatever was collected.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current page and flushing");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let reporter = CliProgress::new();
    let summary = pipeline::run_pipeline(&config, &sources, &shutdown, &reporter).await?;

    print_summary(&summary);
    Ok(())
}

fn select_sources(only: &[String]) -> Result<Vec<SourceSite>> {
    let all = default_sources();
    if only.is_empty() {
        return Ok(all);
    }
    let mut selected = Vec::new();
    for name in only {
        match all.iter().find(|s| s.organization.eq_ignore_ascii_case(name)) {
            Some(source) => selected.push(source.clone()),
            None => {
                let known: Vec<&str> = all.iter().map(|s| s.organization.as_str()).collect();
                return Err(eyre!(
                    "unknown source '{name}': expected one of {}",
                    known.join(", ")
                ));
            }
        }
    }
    Ok(selected)
}

fn print_summary(summary: &RunSummary) {
    let link = |value: &Option<String>| match value {
        Some(link) => link.clone(),
        None => "(not distributed)".to_string(),
    };

    println!();
    println!("  Harvest run {} complete", summary.run_id);
    println!("  Collected:  {}", summary.documents_collected);
    println!("  Sanitized:  {}", summary.documents_sanitized);
    println!("  Excluded:   {}", summary.documents_excluded);
    println!("  Raw:        {}", summary.raw_file.display());
    println!("  Processed:  {}", summary.processed_file.display());
    println!("  PDPA:       {}", summary.compliance_report.display());
    println!("  Drive raw:  {}", link(&summary.drive_raw_link));
    println!("  Drive proc: {}", link(&summary.drive_processed_link));
    println!("  Drive PDPA: {}", link(&summary.drive_report_link));
    println!("  Dataset:    {}", link(&summary.dataset_link));
    if let Some(response) = &summary.training_response {
        println!("  Training:   {response}");
    }
    println!();
}

fn cmd_sources() -> Result<()> {
    for source in default_sources() {
        println!("{:<20} {}", source.organization, source.start_url);
        println!("{:<20} folder: {}", "", source.folder_path);
        println!("{:<20} keywords: {}", "", source.keywords.join(", "));
    }
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = PipelineConfig::from_env()?;
    let set_or_unset = |present: bool| if present { "set" } else { "unset" };

    println!("raw_output_dir:        {}", config.raw_output_dir.display());
    println!("processed_output_dir:  {}", config.processed_output_dir.display());
    println!("compliance_output_dir: {}", config.compliance_output_dir.display());
    println!("timezone:              {}", config.timezone);
    println!("dataset_repo:          {}", config.dataset_repo);
    println!("dataset_token:         {}", set_or_unset(config.dataset_token.is_some()));
    println!(
        "service_account_file:  {}",
        config
            .service_account_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unset".into())
    );
    println!("oauth_client:          {}", set_or_unset(config.oauth_client_id.is_some()));
    println!(
        "drive_folders:         raw={} processed={} pdpa={}",
        set_or_unset(config.drive_raw_folder_id.is_some()),
        set_or_unset(config.drive_processed_folder_id.is_some()),
        set_or_unset(config.drive_compliance_folder_id.is_some()),
    );
    match &config.training_webhook {
        Some(webhook) => println!("training_webhook:      {} {}", webhook.method, webhook.url),
        None => println!("training_webhook:      unset"),
    }
    println!(
        "crawl:                 concurrency={} rate_limit_ms={} timeout_s={} subpage_limit={}",
        config.crawl.concurrency,
        config.crawl.rate_limit_ms,
        config.crawl.request_timeout_secs,
        config.crawl.subpage_limit,
    );
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn harvested(&self, documents: usize, pages_visited: usize, pages_failed: usize) {
        self.spinner.set_message(format!(
            "harvested {documents} documents ({pages_visited} pages, {pages_failed} failed)"
        ));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_selection_is_case_insensitive() {
        let selected = select_sources(&["egat".to_string(), "EPPO".to_string()]).expect("sources");
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].organization, "EGAT");
        assert_eq!(selected[1].organization, "EPPO");
    }

    #[test]
    fn unknown_source_lists_the_known_ones() {
        let err = select_sources(&["ACME".to_string()]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown source 'ACME'"));
        assert!(msg.contains("EGAT"));
    }

    #[test]
    fn empty_selection_means_all_sources() {
        assert_eq!(select_sources(&[]).expect("sources").len(), 6);
    }
}
