//! `notifelect` command-line driver: `install`, `uninstall`, `listen`.
//!
//! An external collaborator to the election core (spec §1) — it resolves
//! environment configuration, opens the database connection, and calls
//! into the core's public API. No election logic lives here.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use notifelect::config::ConnectionConfig;
use notifelect::db::{PgChannelListener, PgQueryExecutor};
use notifelect::queries::{QueryBuilder, Queries};

#[derive(Parser)]
#[command(name = "notifelect")]
#[command(about = "Leader election over a PostgreSQL NOTIFY/LISTEN channel")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// All notifelect database objects will start with this prefix.
    /// Falls back to NOTIFELECT_PREFIX if unset.
    #[arg(long, global = true, default_value = "")]
    prefix: String,

    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Parser)]
struct ConnectionArgs {
    /// Connection string in libpq URI format. Defaults to PGDSN.
    #[arg(long = "pg-dsn", env = "PGDSN", global = true)]
    pg_dsn: Option<String>,

    #[arg(long = "pg-host", env = "PGHOST", global = true)]
    pg_host: Option<String>,

    #[arg(long = "pg-port", env = "PGPORT", global = true)]
    pg_port: Option<u16>,

    #[arg(long = "pg-user", env = "PGUSER", global = true)]
    pg_user: Option<String>,

    #[arg(long = "pg-database", env = "PGDATABASE", global = true)]
    pg_database: Option<String>,

    #[arg(long = "pg-password", env = "PGPASSWORD", global = true)]
    pg_password: Option<String>,
}

impl From<ConnectionArgs> for ConnectionConfig {
    fn from(args: ConnectionArgs) -> Self {
        ConnectionConfig {
            dsn: args.pg_dsn,
            host: args.pg_host,
            port: args.pg_port,
            user: args.pg_user,
            database: args.pg_database,
            password: args.pg_password,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Creates the shared counter.
    Install {
        /// Print the SQL that would run without applying any changes.
        #[arg(long)]
        dry_run: bool,
    },
    /// Drops the shared counter.
    Uninstall {
        /// Print the SQL that would run without applying any changes.
        #[arg(long)]
        dry_run: bool,
    },
    /// Listens on the channel and prints decoded messages (debug tool).
    Listen {
        /// Channel to listen on. Defaults to the prefixed notifelect channel.
        #[arg(long)]
        channel: Option<String>,
    },
}

fn resolve_prefix(cli_prefix: &str) -> String {
    if let Ok(existing) = std::env::var("NOTIFELECT_PREFIX") {
        return existing;
    }
    if !cli_prefix.is_empty() {
        // Set so any downstream collaborator reading the environment
        // directly sees the same prefix this process resolved to.
        std::env::set_var("NOTIFELECT_PREFIX", cli_prefix);
    }
    cli_prefix.to_string()
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    notifelect::logging::init();

    let cli = Cli::parse();
    let prefix = resolve_prefix(&cli.prefix);
    let query_builder = QueryBuilder::new(&prefix);
    let connection_config: ConnectionConfig = cli.connection.into();

    match run(cli.command, query_builder, connection_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "notifelect command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, query_builder: QueryBuilder, connection: ConnectionConfig) -> anyhow::Result<()> {
    match command {
        Command::Install { dry_run } => {
            println!("{}", query_builder.install_sql());
            if !dry_run {
                let pool = sqlx::PgPool::connect(&connection.to_dsn()).await?;
                let queries = Queries::new(PgQueryExecutor::new(pool), query_builder);
                queries.install().await?;
            }
        }
        Command::Uninstall { dry_run } => {
            println!("{}", query_builder.uninstall_sql());
            if !dry_run {
                let pool = sqlx::PgPool::connect(&connection.to_dsn()).await?;
                let queries = Queries::new(PgQueryExecutor::new(pool), query_builder);
                queries.uninstall().await?;
            }
        }
        Command::Listen { channel } => {
            let channel = channel.unwrap_or_else(|| query_builder.channel().0.clone());
            let mut listener = PgChannelListener::connect(&connection.to_dsn()).await?;
            notifelect::db::ChannelListener::listen(&mut listener, &channel).await?;
            println!("listening on {channel}");
            loop {
                let payload = notifelect::db::ChannelListener::recv(&mut listener).await?;
                match notifelect::codec::decode(&payload) {
                    Ok(message) => println!("{message:?}"),
                    Err(err) => eprintln!("failed to decode payload: {err}"),
                }
            }
        }
    }
    Ok(())
}
