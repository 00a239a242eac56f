//! `hellopod api | frontend | gateway`
//!
//! Local run, all three on one machine:
//!
//! ```text
//! POD_IP=10.1.0.58 hellopod api --port 8081
//! hellopod frontend --port 8082
//! hellopod gateway --port 8080
//! curl http://localhost:8080/api/message
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hellopod::{Api, Config, Error, Gateway, Server, StaticFiles};

#[derive(Parser)]
#[command(name = "hellopod", version, about = "Kubernetes demo: message API, static frontend, ingress gateway")]
struct Cli {
    /// Override the `PORT` setting
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Command {
    /// Serve GET /message and GET /ping
    Api,
    /// Serve the static page
    Frontend {
        /// Directory to serve (overrides `STATIC_DIR`)
        #[arg(long, value_name = "DIR")]
        dir: Option<String>,
    },
    /// Route /api/* to the api and everything else to the frontend
    Gateway,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info");
            error!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<(), Error> {
    if let Some(port) = cli.port {
        config.port = port;
    }
    let addr = config.server_address();

    // Everything a service needs is resolved before its port is bound.
    match cli.command {
        Command::Api => {
            let api = Api::new(config.message_title.clone(), config.pod_address()?);
            info!(pod = %api.pod(), "starting api");
            Server::bind(&addr).await?.serve(api.router(config.cors())).await
        }
        Command::Frontend { dir } => {
            let files = StaticFiles::new(dir.unwrap_or(config.static_dir));
            info!(root = %files.root().display(), "starting frontend");
            Server::bind(&addr).await?.serve(files.router()).await
        }
        Command::Gateway => {
            let ingress = config.ingress()?;
            info!(api = %config.api_upstream, frontend = %config.frontend_upstream, "starting gateway");
            Server::bind(&addr).await?.serve(Gateway::new(ingress)).await
        }
    }
}

fn init_tracing(default_directive: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .init();
}
