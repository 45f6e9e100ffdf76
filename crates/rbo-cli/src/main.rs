use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rbo")]
#[command(about = "Rental back office CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> local)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Return reconciliation
    Return {
        #[command(subcommand)]
        cmd: ReturnCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply embedded SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum ReturnCmd {
    /// Project the inventory impact of a submission; writes nothing.
    Preview {
        /// Return id
        #[arg(long)]
        id: String,

        /// Submission JSON file
        #[arg(long)]
        file: String,

        /// Acting user id (defaults to a fresh id)
        #[arg(long)]
        actor: Option<String>,

        /// super_admin | franchise_admin | staff | readonly
        #[arg(long, default_value = "super_admin")]
        role: String,

        /// Franchise id (required unless role is super_admin)
        #[arg(long)]
        franchise: Option<String>,
    },

    /// Validate and apply a submission in one transaction.
    Process {
        /// Return id
        #[arg(long)]
        id: String,

        /// Submission JSON file
        #[arg(long)]
        file: String,

        /// Acting user id, recorded as processed_by
        #[arg(long)]
        actor: String,

        /// super_admin | franchise_admin | staff | readonly
        #[arg(long)]
        role: String,

        /// Franchise id (required unless role is super_admin)
        #[arg(long)]
        franchise: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = rbo_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = rbo_db::status(&pool).await?;
                    println!("db_ok={} has_returns_table={}", s.ok, s.has_returns_table);
                }
                DbCmd::Migrate => {
                    rbo_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = rbo_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Return { cmd } => match cmd {
            ReturnCmd::Preview {
                id,
                file,
                actor,
                role,
                franchise,
            } => {
                commands::returns::preview(&id, &file, actor.as_deref(), &role, franchise.as_deref())
                    .await?
            }
            ReturnCmd::Process {
                id,
                file,
                actor,
                role,
                franchise,
            } => {
                commands::returns::process(&id, &file, Some(actor.as_str()), &role, franchise.as_deref())
                    .await?
            }
        },
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the key=value output.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
