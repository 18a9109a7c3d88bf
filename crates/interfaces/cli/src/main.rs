mod demo;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tutorloom_config::EngineConfig;

#[derive(Debug, Parser)]
#[command(name = "tutorloom", version, about = "Document-driven tutoring dialogue engine")]
struct Cli {
    /// Path to a TOML config file. Missing file falls back to defaults.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Segment a document into semantic units and print them as JSON.
    Segment {
        /// Path to the document to segment.
        file: PathBuf,
    },
    /// Segment a document and assign a role queue to each unit.
    Assign {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "balanced")]
        mode: CliAssignmentMode,
    },
    /// Run a full scripted session over a document: segment, assign,
    /// then drive every unit's bot turn through the conversation state
    /// machine, printing each turn as it's produced.
    Run {
        file: PathBuf,
        /// Session identifier. A fresh v4 UUID is generated when omitted.
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long, value_enum, default_value = "balanced")]
        mode: CliAssignmentMode,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAssignmentMode {
    Greedy,
    Balanced,
}

impl From<CliAssignmentMode> for tutorloom_assignment::Mode {
    fn from(mode: CliAssignmentMode) -> Self {
        match mode {
            CliAssignmentMode::Greedy => tutorloom_assignment::Mode::Greedy,
            CliAssignmentMode::Balanced => tutorloom_assignment::Mode::Balanced,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = EngineConfig::load_from(&cli.config)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Segment { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let units = demo::segment_document(&text, &config).await?;
            println!("{}", serde_json::to_string_pretty(&units)?);
        }
        Commands::Assign { file, mode } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let units = demo::segment_document(&text, &config).await?;
            let assignment = tutorloom_assignment::assign(&units, mode.into());
            println!("{}", serde_json::to_string_pretty(&assignment)?);
        }
        Commands::Run { file, session_id, mode } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            demo::run_session(&text, &session_id, mode.into(), &config).await?;
        }
    }

    Ok(())
}
