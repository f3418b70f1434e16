use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "litefetch", about = "Stream a remote SQLite database and query it in memory")]
pub struct Cli {
    /// Path to config file
    #[arg(short = 'c', long, global = true, env = "LITEFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit diagnostics to stderr
    #[arg(short = 'v', long, global = true, env = "LITEFETCH_VERBOSE")]
    pub verbose: bool,

    /// Disable credential masking
    #[arg(long, global = true, env = "LITEFETCH_SHOW_SECRETS")]
    pub show_secrets: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the database and run a query
    Query(QueryArgs),

    /// Load the database and list its tables and columns
    Schema(SourceArgs),

    /// Download the database image to a file
    Fetch(FetchArgs),
}

/// Where the database comes from and how to fetch it.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// URL of the database image
    #[arg(short = 'U', long, env = "LITEFETCH_URL")]
    pub url: Option<String>,

    /// Bearer token sent with the request
    #[arg(long, env = "LITEFETCH_TOKEN")]
    pub token: Option<String>,

    /// Assumed maximum size in bytes used for progress (default: 800000000)
    #[arg(long, env = "LITEFETCH_ESTIMATED_SIZE")]
    pub estimated_size: Option<u64>,

    /// Give up on the load after this many seconds (default: wait indefinitely)
    #[arg(short = 't', long, env = "LITEFETCH_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Render load progress on stderr
    #[arg(long, env = "LITEFETCH_PROGRESS")]
    pub progress: bool,

    /// Config file profile name
    #[arg(short = 'P', long, env = "LITEFETCH_PROFILE")]
    pub profile: Option<String>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL query text
    pub sql: Option<String>,

    /// Read SQL from file
    #[arg(short = 'f', long = "file", conflicts_with = "sql")]
    pub sql_file: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Max rows when the query has no LIMIT (default: 25)
    #[arg(short = 'l', long, env = "LITEFETCH_ROW_LIMIT")]
    pub limit: Option<usize>,

    /// Disable the automatic row limit
    #[arg(long)]
    pub no_limit: bool,

    /// Write results to file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Destination file for the database image
    #[arg(short = 'o', long)]
    pub output: PathBuf,
}
