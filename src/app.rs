//! Application orchestrator.
//! Loads the config, applies CLI overrides, initializes logging, starts the
//! pipeline and drives the two-phase shutdown on interrupt.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use file_uploader::cli::Args;
use file_uploader::config::{CONFIG_ENV_VAR, LoadResult, load_or_init};
use file_uploader::output as out;
use file_uploader::{Service, default_config_path};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location(&args);
        return Ok(());
    }

    let mut cfg = match load_or_init(args.config.as_deref())? {
        LoadResult::Loaded(cfg) => *cfg,
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!("A template file_uploader config was written to: {}", path.display()));
            out::print_info("Edit `source_dir`, `completed_dir`, `failed_dir` and `upload_url`, then re-run.");
            out::print_info(&format!("To use a different location pass --config or set {CONFIG_ENV_VAR}."));
            return Ok(());
        }
    };
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).inspect_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
    })?;
    debug!(?args, "Starting file_uploader");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Couldn't start the async runtime")?;

    let result = runtime.block_on(async move {
        let service = Service::start(cfg)?;
        let shutdown = service.shutdown_signal();

        let interrupted = Arc::new(AtomicBool::new(false));
        {
            let shutdown = shutdown.clone();
            let interrupted = Arc::clone(&interrupted);
            ctrlc::set_handler(move || {
                if interrupted.swap(true, Ordering::SeqCst) {
                    out::print_warn("Second interrupt; exiting without waiting for the current upload.");
                    std::process::exit(130);
                }
                out::print_warn("Received interrupt; finishing the current file before exiting...");
                shutdown.request();
            })
            .context("failed to install signal handler")?;
        }

        shutdown.requested().await;
        let stats = service.stop().await;
        info!(
            uploaded = stats.uploaded,
            failed = stats.failed,
            lock_failures = stats.lock_failures,
            move_failures = stats.move_failures,
            "Exiting"
        );
        Ok::<_, anyhow::Error>(())
    });

    // Ensure logs are flushed before exit
    drop(guard);
    result
}

fn print_config_location(args: &Args) {
    if let Some(p) = &args.config {
        out::print_info(&format!("Using --config (explicit):\n  {}\n", p.display()));
        return;
    }
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV_VAR) {
        out::print_info(&format!("Using {CONFIG_ENV_VAR} (explicit):\n  {cfg_env}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV_VAR} or set it to another file."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default file_uploader config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}
