//! X-Series CLI - JSON bridge to the layout engine
//!
//! Commands: patterns, base-layouts, generate, get, list, delete, bind
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 0 success, 2 validation/not-found, 1 internal/unavailable

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use xseries_core::{
    logging, EngineConfig, EngineError, ErrorStatus, FileLayoutStore, GenerateRequest,
    LayoutEngine, LayoutFilter,
};

const DEFAULT_STORE_DIR: &str = "layouts";

#[derive(Parser)]
#[command(name = "xseries-cli")]
#[command(about = "X-Series CLI - Dynamic layout zone engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding stored layouts (overrides config)
    #[arg(short, long)]
    store_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `xseries_core=trace` (overrides config)
    #[arg(long)]
    log_filter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the split pattern catalog
    Patterns,

    /// List the supported base layouts
    BaseLayouts,

    /// Generate (or reuse) a dynamic layout
    Generate {
        /// JSON payload (GenerateRequest)
        #[arg(short, long)]
        payload: String,

        /// Compute the layout without storing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch a stored layout
    Get {
        layout_id: String,
    },

    /// List stored layouts
    List {
        #[arg(long)]
        content_type: Option<String>,

        #[arg(long)]
        base_layout: Option<String>,
    },

    /// Delete a stored layout
    Delete {
        layout_id: String,
    },

    /// Bind slide content onto a stored layout's zones
    Bind {
        layout_id: String,

        /// JSON slide content
        #[arg(long)]
        content: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        },
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.store_dir.clone() {
        config.store_dir = Some(dir);
    }
    if let Some(filter) = cli.log_filter.clone() {
        config.log_filter = filter;
    }
    logging::init(&config.log_filter);

    let store_dir = config
        .store_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
    let store = match FileLayoutStore::open(&store_dir) {
        Ok(s) => s,
        Err(e) => return fail(&EngineError::from(e)),
    };
    let engine = match LayoutEngine::with_config(store, &config) {
        Ok(engine) => engine,
        Err(e) => return fail(&e),
    };

    match cli.command {
        Commands::Patterns => {
            let patterns: Vec<_> = engine.patterns().iter().collect();
            emit(&patterns)
        }

        Commands::BaseLayouts => emit(&engine.base_layouts()),

        Commands::Generate { payload, dry_run } => {
            let request: GenerateRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => return invalid_payload(&e),
            };
            let result = if dry_run {
                engine.preview(&request)
            } else {
                engine.generate(&request)
            };
            match result {
                Ok(layout) => emit(&layout),
                Err(e) => fail(&e),
            }
        }

        Commands::Get { layout_id } => match engine.get(&layout_id) {
            Ok(layout) => emit(&layout),
            Err(e) => fail(&e),
        },

        Commands::List { content_type, base_layout } => {
            let filter = LayoutFilter { content_type, base_layout };
            match engine.list(&filter) {
                Ok(layouts) => emit(&layouts),
                Err(e) => fail(&e),
            }
        }

        Commands::Delete { layout_id } => match engine.delete(&layout_id) {
            Ok(()) => emit(&serde_json::json!({ "deleted": layout_id })),
            Err(e) => fail(&e),
        },

        Commands::Bind { layout_id, content } => {
            let content: serde_json::Value = match serde_json::from_str(&content) {
                Ok(c) => c,
                Err(e) => return invalid_payload(&e),
            };
            match engine.bind(&layout_id, &content) {
                Ok(bound) => emit(&bound),
                Err(e) => fail(&e),
            }
        }
    }
}

fn emit<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&EngineError::from(e)),
    }
}

fn fail(err: &EngineError) -> ExitCode {
    let output = serde_json::json!({ "success": false, "error": err.report() });
    println!("{output}");
    match err.status() {
        ErrorStatus::Validation | ErrorStatus::NotFound => ExitCode::from(2),
        ErrorStatus::Internal | ErrorStatus::Unavailable => ExitCode::FAILURE,
    }
}

fn invalid_payload(err: &serde_json::Error) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": { "status": "validation", "code": "invalid_payload", "message": err.to_string(), "retryable": false },
    });
    println!("{output}");
    ExitCode::from(2)
}
