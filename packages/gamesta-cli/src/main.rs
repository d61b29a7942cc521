// Gamesta terminal front-end

mod cmd;
mod context;
mod menu;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamesta_core::config::Config;
use gamesta_core::kernel::GamestaDeps;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::context::AppContext;

#[derive(Parser)]
#[command(name = "gamesta")]
#[command(about = "Gamesta idea board: submit, browse and vote on festival ideas")]
struct Cli {
    /// Only print results, no banners or hints
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,

    /// Check whether an account exists for an email
    CheckUser { email: String },

    /// List submitted ideas
    Ideas {
        /// Category id to filter by
        #[arg(long)]
        category: Option<uuid::Uuid>,
        /// newest | top | upvotes
        #[arg(long, default_value = "newest")]
        sort: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Check the backend connection and required tables
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gamesta_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let deps = GamestaDeps::connect(config).context("Failed to set up backend")?;
    let ctx = AppContext::new(deps, cli.quiet);

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => menu::run(&ctx).await,
        Commands::CheckUser { email } => cmd::account::check_user(&ctx, &email).await,
        Commands::Ideas {
            category,
            sort,
            limit,
        } => {
            let sort = sort.parse().map_err(anyhow::Error::msg)?;
            cmd::ideas::list(&ctx, category, sort, limit).await
        }
        Commands::Doctor => cmd::doctor::run(&ctx).await,
    }
}
