//! skyclient CLI
//!
//! Command-line interface for talking to the key-value store.

use clap::{Parser, Subcommand};
use skyclient::{connect, Config, Query, QueryResult};
use tracing_subscriber::{fmt, EnvFilter};

/// skyclient CLI
#[derive(Parser, Debug)]
#[command(name = "skyclient-cli")]
#[command(about = "CLI for the skyclient key-value protocol")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "2003")]
    port: u16,

    /// Connect timeout in milliseconds
    #[arg(short, long, default_value = "100000")]
    timeout_ms: u64,

    /// Response timeout in milliseconds (0 waits forever)
    #[arg(short, long, default_value = "0")]
    read_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Send raw queries; separate queries of a batch with a lone ","
    Query {
        /// Command name followed by its arguments
        #[arg(required = true, num_args = 1..)]
        tokens: Vec<String>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,skyclient=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .connect_timeout_ms(args.timeout_ms)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    match run(config, args.command) {
        Ok(result) => println!("{}", result),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(config: Config, command: Commands) -> skyclient::Result<QueryResult> {
    let mut connection = connect(config)?;

    let result = match command {
        Commands::Get { key } => connection.get(&key),
        Commands::Set { key, value } => connection.set(&key, &value),
        Commands::Query { tokens } => connection.query(&split_batch(tokens)),
    };

    connection.close();
    result
}

/// Split `a b , c d` into the queries `[a b]` and `[c d]`
fn split_batch(tokens: Vec<String>) -> Vec<Query> {
    tokens
        .split(|token| token == ",")
        .filter(|query| !query.is_empty())
        .map(|query| Query::from_tokens(query.iter().cloned()))
        .collect()
}
