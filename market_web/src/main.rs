//! Campus market server and admin commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use market_core::{config, MarketCore};
use market_web::{build_router, AppState};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "market_web")]
#[command(about = "Campus second-hand marketplace")]
#[command(version)]
struct Cli {
    /// Directory holding config.json and the database
    #[arg(long, global = true, env = "MARKET_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:5000
        #[arg(long, env = "MARKET_BIND")]
        bind: Option<String>,

        /// Database connection string, e.g. sqlite://market.sqlite?mode=rwc
        #[arg(long, env = "MARKET_DATABASE_URL")]
        database_url: Option<String>,
    },
    /// Create an administrator, or promote the account using that email
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        contact: String,
        #[arg(long)]
        password: String,
    },
    /// Delete a user and everything they own
    DeleteUser {
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::get_or_init(cli.data_dir)
        .await
        .context("Failed to load market config")?;

    if let Command::Serve { bind, database_url } = &cli.command {
        if let Some(bind) = bind {
            config.bind_addr = bind.clone();
        }
        if let Some(url) = database_url {
            config.database_url = Some(url.clone());
        }
    }

    info!("Database: {}", config.database_url());

    let core = MarketCore::start(config)
        .await
        .context("Failed to open market database")?;

    match cli.command {
        Command::Serve { .. } => serve(core).await,
        Command::CreateAdmin {
            username,
            email,
            contact,
            password,
        } => {
            let admin = core
                .services
                .accounts
                .create_admin(&username, &email, &contact, &password)
                .await
                .context("Failed to create admin")?;
            info!("Admin ready: {} <{}>", admin.username, admin.email);
            Ok(())
        }
        Command::DeleteUser { username } => {
            let accounts = &core.services.accounts;
            let user = accounts
                .find_by_username(&username)
                .await
                .with_context(|| format!("No user named {username}"))?;
            accounts
                .purge_user(user.id)
                .await
                .context("Failed to delete user")?;
            info!("Deleted user {}", username);
            Ok(())
        }
    }
}

async fn serve(core: MarketCore) -> Result<()> {
    let purged = core
        .services
        .accounts
        .purge_expired_sessions()
        .await
        .context("Failed to purge expired sessions")?;
    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }

    let bind_addr = core.config.bind_addr.clone();
    let app = build_router(AppState::from_core(core));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("market_web listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
