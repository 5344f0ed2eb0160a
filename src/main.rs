use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tyre_rules::config::DEFAULT_CONFIG_FILE;
use tyre_rules::source::is_plain_text;
use tyre_rules::{check_deps, emit_run, install_help_for, load_config, run_pipeline, AutoSource, DiscoverError};

/// Extract tyre allocation rules from sporting regulation PDFs.
#[derive(Debug, Parser)]
#[command(name = "tyrerules", version)]
struct Cli {
    /// Run configuration (YAML)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output JSON file, overrides `output` in the config
    #[arg(long)]
    output: Option<PathBuf>,

    /// Worker threads, overrides `jobs` in the config (1 = sequential)
    #[arg(long)]
    jobs: Option<usize>,

    /// Pass -layout to pdftotext
    #[arg(long)]
    layout: bool,

    /// Only check the Poppler tools and exit
    #[arg(long)]
    check_deps: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if cli.check_deps {
        let deps = check_deps();
        println!("{}", serde_json::json!({"tool": "check_deps", "ok": deps.ok, "missing": deps.missing}));
        let help = install_help_for(&deps.missing);
        if !help.is_empty() {
            eprintln!("{}", help);
        }
        std::process::exit(if deps.ok { 0 } else { 2 });
    }

    // 1) Config
    let cfg = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(file = %cli.config.display(), error = %e, "invalid configuration");
            std::process::exit(3);
        }
    };

    // 2) Documents
    let docs = match cfg.resolve_documents() {
        Ok(docs) => docs,
        Err(DiscoverError::NoFilesFound { guidance }) => {
            tracing::error!("no regulation files found");
            eprintln!("{}", guidance);
            std::process::exit(1);
        }
    };

    // 3) Poppler is only needed when some input is a PDF. Without it those
    //    documents fail individually; text inputs are still extracted.
    if docs.iter().any(|d| !is_plain_text(&d.path)) {
        let deps = check_deps();
        if !deps.ok {
            tracing::warn!(missing = ?deps.missing, "pdf tools missing; pdf documents will be recorded as read failures");
            eprintln!("{}", install_help_for(&deps.missing));
        }
    }

    // 4) Pipeline
    let source = AutoSource::new(cli.layout || cfg.layout);
    let jobs = cli.jobs.filter(|&n| n > 0).or_else(|| cfg.worker_threads());
    let run = run_pipeline(&source, &docs, jobs);

    // 5) Emit
    let output = cli.output.clone().unwrap_or_else(|| cfg.output_path());
    match emit_run(&run, &output) {
        Ok(paths) => {
            println!(
                "{}",
                serde_json::json!({
                    "tool": "emit_run",
                    "documents": docs.len(),
                    "extracted": run.database.len(),
                    "warnings": run.warnings(),
                    "database_path": paths.database_path,
                    "report_path": paths.report_path,
                    "database_sha256": paths.database_sha256,
                })
            );
        }
        Err(e) => {
            tracing::error!(file = %output.display(), error = %e, "failed to write results");
            std::process::exit(6);
        }
    }
}
