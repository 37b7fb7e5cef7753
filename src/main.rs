use std::net::SocketAddr;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use heartwise::config::AppConfig;

#[derive(Parser)]
#[command(name = "heartwise")]
#[command(about = "Heart-disease risk self-assessment service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to listen on, overrides configuration
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Create the data directories and database schema
    InitDb,
}

#[tokio::main]
async fn main() -> ExitCode {
    heartwise::init_tracing();
    let cli = Cli::parse();

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            if let Some(addr) = bind {
                config.bind_addr = addr;
            }
            heartwise::serve(config).await
        }
        Commands::InitDb => heartwise::init_db(&config).map(|()| println!("Initialized the database.")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
