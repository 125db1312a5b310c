use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::io;
use std::path::PathBuf;

use elevator::service::client::{self, Client};
use elevator::service::server::Server;
use elevator::util::config::Config;
use elevator::util::constants as setting;

#[derive(Parser, Debug)]
#[command(name = "elevator-sim")]
#[command(version, about = "Single-car elevator dispatch simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the dispatch server
    Serve {
        /// JSON config file; flags below override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        listen: Option<String>,

        #[arg(long)]
        min_floor: Option<i64>,

        #[arg(long)]
        max_floor: Option<i64>,

        #[arg(long)]
        max_steps: Option<i64>,

        /// Step the car automatically every N milliseconds
        #[arg(long, value_name = "MS")]
        auto_step: Option<u64>,
    },
    /// Interactive menu against a running server
    Repl {
        #[arg(short, long, default_value = setting::LISTEN_ADDR)]
        addr: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            id,
            listen,
            min_floor,
            max_floor,
            max_steps,
            auto_step,
        } => {
            let mut settings = match config {
                Some(path) => Config::from_file(&path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?,
                None => Config::default(),
            };
            if let Some(id) = id {
                settings.id = id;
            }
            if let Some(listen) = listen {
                settings.listen_addr = listen;
            }
            if let Some(min_floor) = min_floor {
                settings.min_floor = min_floor;
            }
            if let Some(max_floor) = max_floor {
                settings.max_floor = max_floor;
            }
            if let Some(max_steps) = max_steps {
                settings.max_steps_per_call = max_steps;
            }
            if auto_step.is_some() {
                settings.auto_step_ms = auto_step;
            }
            info!("Starting {} with {:?}", settings.id, settings);
            let server = Server::bind(settings).context("failed to start server")?;
            server.run()?;
        }
        Commands::Repl { addr } => {
            let mut remote = Client::connect(addr.as_str()).with_context(|| format!("cannot connect to {}", addr))?;
            let stdin = io::stdin();
            client::run_menu(&mut remote, stdin.lock(), io::stdout())?;
        }
    }
    Ok(())
}
