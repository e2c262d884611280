use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use price_action_scanner::{loader, report, EngineConfig, PriceActionEngine, PriceActionResult};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pa-scan")]
#[command(about = "Classify market regime and find price action setups in OHLCV bars")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one or more CSV bar files (symbol = file name)
    Analyze {
        /// CSV files with date,open,high,low,close,volume columns
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// JSON threshold table (partial tables allowed)
        #[arg(short, long, env = "PA_CONFIG")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the default threshold table as JSON
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct SymbolAnalysis {
    symbol: String,
    #[serde(flatten)]
    result: PriceActionResult,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = if args.verbose { "price_action_scanner=debug" } else { "price_action_scanner=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.parse().context("Invalid log directive")?),
        )
        .init();

    match args.command {
        Commands::Analyze { files, config, format } => run_analyze(&files, config.as_deref(), format),
        Commands::Config => {
            println!("{}", EngineConfig::default().to_json_pretty()?);
            Ok(())
        }
    }
}

fn analyze_file(engine: &PriceActionEngine, path: &Path) -> Result<SymbolAnalysis> {
    let symbol = loader::symbol_from_path(path);
    let bars = loader::load_bars(path)?;
    let result = engine
        .run(&bars)
        .with_context(|| format!("Analysis failed for {} ({} bars)", symbol, bars.len()))?;
    Ok(SymbolAnalysis { symbol, result })
}

fn run_analyze(files: &[PathBuf], config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = match config {
        Some(path) => {
            info!("Using config: {:?}", path);
            EngineConfig::from_json_file(path)?
        }
        None => EngineConfig::default(),
    };
    let engine = PriceActionEngine::new(config);

    info!("Analyzing {} files", files.len());

    // One instrument failing must not stop the rest
    let analyses: Vec<SymbolAnalysis> = files
        .par_iter()
        .filter_map(|path| match analyze_file(&engine, path) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!("Skipping {:?}: {:#}", path, e);
                None
            }
        })
        .collect();

    info!("Analyzed {}/{} files", analyses.len(), files.len());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analyses)?),
        OutputFormat::Text => {
            for analysis in &analyses {
                println!("{}", report::render(&analysis.symbol, &analysis.result));
            }
        }
    }

    Ok(())
}
