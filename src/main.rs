use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "streamgate")]
#[command(about = "Event-gated live stream viewer with playback telemetry", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gated viewer session
    Run,
    /// Book a viewing slot for a pending event
    Register,
    /// Run the local development ingestion stub
    Stub {
        #[arg(long)]
        listen: Option<String>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streamgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Resolve config path
    let config_path = streamgate::config::resolve_config_path(cli.config.as_deref());

    // Dispatch to appropriate handler
    match cli.command {
        Some(Commands::Run) | None => {
            // Default behavior is to run the viewer session
            streamgate::cli::run::run(config_path).await?;
        }
        Some(Commands::Register) => {
            streamgate::cli::register::register(config_path)?;
        }
        Some(Commands::Stub { listen }) => {
            streamgate::cli::stub::serve(config_path, listen).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                streamgate::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                streamgate::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}
