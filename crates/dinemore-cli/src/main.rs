mod auth;
mod branches;

use clap::{Parser, Subcommand};
use dinemore_client::AppSession;
use tracing_subscriber::EnvFilter;

use crate::auth::AuthCommands;
use crate::branches::BranchesCommands;

#[derive(Debug, Parser)]
#[command(name = "dinemore-cli")]
#[command(about = "DineMore loyalty client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diner phone + OTP sign-in
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Restaurant admin sign-in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DINEMORE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored identity
    Logout,
    /// Show the stored identity
    Whoami,
    /// Branch listing and selection for a restaurant
    Branches {
        #[command(subcommand)]
        command: BranchesCommands,
    },
    /// Show recent activity for a restaurant
    Activity {
        #[arg(long)]
        restaurant: String,
        /// Number of entries to fetch (defaults to `DINEMORE_ACTIVITY_LOG_LIMIT`)
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("dinemore-cli: run with --help to list commands");
        return Ok(());
    };

    let config = dinemore_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, base_url = %config.api_base_url, "config loaded");

    let mut app = AppSession::open(&config)?;

    match command {
        Commands::Auth { command } => auth::run_auth(&app, command).await,
        Commands::Login { email, password } => auth::run_login(&mut app, &email, &password).await,
        Commands::Logout => auth::run_logout(&mut app),
        Commands::Whoami => {
            auth::run_whoami(&app);
            Ok(())
        }
        Commands::Branches { command } => branches::run_branches(&mut app, command).await,
        Commands::Activity { restaurant, limit } => {
            let limit = limit.unwrap_or(config.activity_log_limit);
            branches::run_activity(&app, &restaurant, limit).await
        }
    }
}
