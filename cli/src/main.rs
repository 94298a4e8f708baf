//! campusctl CLI - Build, deploy and tear down campus-connect on minikube
//!
//! Every command runs the external `docker`, `kubectl` and `minikube` tools
//! in sequence; a failed step stops bring-up commands and is reported as the
//! process exit status.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use campusctl_core::ServiceName;
use commands::Context;

#[derive(Parser)]
#[command(name = "campusctl")]
#[command(author, version, about = "Build and run campus-connect on a local minikube cluster")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.campusctl/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build images and deploy them
    Build {
        /// Service to build (default: all buildable)
        #[arg(value_parser = parse_buildable)]
        target: Option<ServiceName>,

        /// Build images with --no-cache
        #[arg(long)]
        nocache: bool,
    },

    /// Start the cluster and ingress, then apply manifests
    Deploy {
        /// Service to deploy (default: all)
        target: Option<ServiceName>,
    },

    /// Delete deployed resources
    #[command(alias = "down")]
    Shutdown {
        /// Service to shut down (default: all)
        target: Option<ServiceName>,

        /// Delete immediately without a grace period
        #[arg(short, long)]
        force: bool,

        /// Tear everything down: resources, tunnel, ingress and the cluster
        #[arg(long)]
        all_pods: bool,
    },

    /// Shut down, rebuild and redeploy
    Restart {
        /// Service to restart (default: all)
        target: Option<ServiceName>,

        /// Build images with --no-cache
        #[arg(long)]
        nocache: bool,
    },

    /// Rebuild images and roll the running deployments over to them
    Rebuild {
        /// Service to rebuild (default: all buildable)
        #[arg(value_parser = parse_buildable)]
        target: Option<ServiceName>,

        /// Build images with --no-cache
        #[arg(long)]
        nocache: bool,
    },

    /// Follow the logs of a service
    Logs {
        /// Service whose logs to follow
        #[arg(value_parser = parse_deployed)]
        target: ServiceName,
    },

    /// Remove the locally built images
    ClearBuilds,

    /// Show cluster, tunnel and ingress status
    Status,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_buildable(value: &str) -> Result<ServiceName, String> {
    let service: ServiceName = value.parse().map_err(|e| format!("{e}"))?;
    if service.is_buildable() {
        Ok(service)
    } else {
        let names: Vec<&str> = ServiceName::BUILDABLE.iter().map(|s| s.as_str()).collect();
        Err(format!(
            "'{service}' is not buildable (expected one of: {})",
            names.join(", ")
        ))
    }
}

fn parse_deployed(value: &str) -> Result<ServiceName, String> {
    let service: ServiceName = value.parse().map_err(|e| format!("{e}"))?;
    if service.has_deployment() {
        Ok(service)
    } else {
        let names: Vec<&str> = ServiceName::ALL
            .iter()
            .filter(|s| s.has_deployment())
            .map(|s| s.as_str())
            .collect();
        Err(format!(
            "'{service}' has no deployment to follow (expected one of: {})",
            names.join(", ")
        ))
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // Skips loading so a broken config file can be replaced
        Commands::Config {
            action: ConfigAction::Init { force },
        } => {
            let store = commands::open_store(cli.config)?;
            commands::config::init(&store, force).await
        }
        command => {
            let ctx = Context::load(cli.config, cli.json).await?;
            dispatch(&ctx, command).await
        }
    }
}

async fn dispatch(ctx: &Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Build { target, nocache } => commands::lifecycle::build(ctx, target, nocache).await,
        Commands::Deploy { target } => commands::lifecycle::deploy(ctx, target).await,
        Commands::Shutdown {
            target,
            force,
            all_pods,
        } => commands::lifecycle::shutdown(ctx, target, force, all_pods).await,
        Commands::Restart { target, nocache } => {
            commands::lifecycle::restart(ctx, target, nocache).await
        }
        Commands::Rebuild { target, nocache } => {
            commands::lifecycle::rebuild(ctx, target, nocache).await
        }
        Commands::Logs { target } => commands::logs::run(ctx, target).await,
        Commands::ClearBuilds => commands::images::clear(ctx).await,
        Commands::Status => commands::status::run(ctx).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(ctx).await,
            ConfigAction::Init { force } => commands::config::init(&ctx.store, force).await,
        },
    }
}

/// Maps a fatal error to the process exit status: the failed tool's own
/// exit code, otherwise 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<campusctl_core::Error>()
        .map_or(1, campusctl_core::Error::exit_code);
    u8::try_from(code).unwrap_or(1)
}
