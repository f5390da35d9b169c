use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use sales_api::config::{Config, DatabaseBackend};
use sales_api::domain::services::user_service::hash_password;
use sales_api::infrastructure::database::{self, postgres::PgStore, schema};
use sales_api::logging::init_logging;
use sales_api::server;

#[derive(Parser, Debug)]
#[command(name = "sales-api", version, about = "Product and sales HTTP service")]
struct Cli {
    /// Directory holding `default.toml`
    #[arg(long, env = "CONFIG_PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the API and debug listeners
    Serve,
    /// Apply database migrations
    Migrate,
    /// Insert sample users, products and sales
    Seed,
    /// Print an argon2 hash for a password
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    // 初始化日志
    init_logging(&config.logging)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run(config).await?,
        Command::Migrate => {
            if config.db.backend != DatabaseBackend::Postgres {
                anyhow::bail!("migrations only apply to the postgres backend");
            }
            let store = PgStore::connect(&config.db)?;
            schema::migrate(store.pool()).await?;
            tracing::info!("Migrations complete");
        }
        Command::Seed => {
            let store = database::connect(&config.db)?;
            schema::seed(store, Utc::now()).await?;
        }
        Command::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }

    Ok(())
}
