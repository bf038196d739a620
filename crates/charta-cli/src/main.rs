mod attach_cmd;
mod config;
mod decode_cmd;
mod detail_cmds;
mod plan_cmds;
mod visit;

use clap::{Parser, Subcommand};

use charta_client::HttpBackend;
use charta_core::backend::PersistenceBackend;
use charta_core::workflow::prepend_placeholder;

use config::ChartaConfig;
use visit::VisitArgs;

#[derive(Parser)]
#[command(name = "charta", about = "Treatment-plan step workflow for clinic visits")]
struct Cli {
    /// Backend URL (overrides CHARTA_BACKEND_URL env var)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a charta config file
    Init {
        /// Backend base URL
        #[arg(long, default_value = config::DEFAULT_BACKEND_URL)]
        url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Plan batch management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Detail batch management
    Detail {
        #[command(subcommand)]
        command: DetailCommands,
    },
    /// Validate an attachment batch offline
    Attach {
        /// Candidate filenames
        files: Vec<String>,
        /// Filenames already persisted for the visit
        #[arg(long)]
        existing: Vec<String>,
    },
    /// Decode a wire string into readable rows
    Decode {
        /// Record layout of the wire string
        #[arg(long, value_enum)]
        kind: decode_cmd::WireKind,
        /// The wire string
        wire: String,
    },
    /// Fetch the status dropdown options (placeholder included)
    StatusOptions,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Validate a plan batch file offline
    Validate {
        /// Path to the batch TOML file
        file: String,
    },
    /// Print the wire form of a plan batch file
    Encode {
        /// Path to the batch TOML file
        file: String,
    },
    /// Validate a plan batch file and persist it
    Save {
        /// Path to the batch TOML file
        file: String,
        #[command(flatten)]
        visit: VisitArgs,
    },
    /// Load a visit and print its plan rows
    Show {
        #[command(flatten)]
        visit: VisitArgs,
    },
}

#[derive(Subcommand)]
pub enum DetailCommands {
    /// Validate a detail batch file offline
    Validate {
        /// Path to the batch TOML file
        file: String,
    },
    /// Print the wire form of a detail batch file
    Encode {
        /// Path to the batch TOML file
        file: String,
    },
    /// Validate a detail batch file and persist it
    Save {
        /// Path to the batch TOML file
        file: String,
        #[command(flatten)]
        visit: VisitArgs,
    },
}

/// Execute the `charta init` command: write config file.
fn cmd_init(url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        backend: config::BackendSection {
            url: url.to_owned(),
        },
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  backend.url = {url}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { url, force } => {
            cmd_init(&url, force)?;
        }
        Commands::Plan { command } => {
            let resolved = ChartaConfig::resolve(cli.backend_url.as_deref())?;
            plan_cmds::run_plan_command(command, &resolved.backend_url).await?;
        }
        Commands::Detail { command } => {
            let resolved = ChartaConfig::resolve(cli.backend_url.as_deref())?;
            detail_cmds::run_detail_command(command, &resolved.backend_url).await?;
        }
        Commands::Attach { files, existing } => {
            attach_cmd::run_attach_check(&files, &existing)?;
        }
        Commands::Decode { kind, wire } => {
            decode_cmd::run_decode(kind, &wire)?;
        }
        Commands::StatusOptions => {
            let resolved = ChartaConfig::resolve(cli.backend_url.as_deref())?;
            let backend = HttpBackend::new(&resolved.backend_url)?;
            let options = prepend_placeholder(backend.status_options().await?);
            for option in &options {
                println!("{:>3}  {}", option.id, option.description);
            }
        }
    }

    Ok(())
}
