use clap::Parser;
use geosearch::{config, server};

/// Geosearch - natural-language search over a PostGIS database
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTTP server host address (defaults to GEOSEARCH_HOST, then 0.0.0.0)
    #[arg(long)]
    http_host: Option<String>,

    /// HTTP server port (defaults to GEOSEARCH_PORT, then 5000)
    #[arg(long)]
    http_port: Option<u16>,

    /// Target database schema to introspect and query (defaults to PG_SCHEMA)
    #[arg(long)]
    schema: Option<String>,

    /// Generative model used for SQL generation
    #[arg(long)]
    model: Option<String>,

    /// Timeout in seconds for model calls and whole requests
    /// (defaults to GEOSEARCH_REQUEST_TIMEOUT_SECS, then 30)
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// Number of times a failed model call is retried
    /// (defaults to GEOSEARCH_GENERATION_RETRIES, then 0)
    #[arg(long)]
    generation_retries: Option<u32>,
}

impl From<Cli> for config::CliConfig {
    fn from(cli: Cli) -> Self {
        config::CliConfig {
            http_host: cli.http_host,
            http_port: cli.http_port,
            schema: cli.schema,
            model: cli.model,
            request_timeout_secs: cli.request_timeout_secs,
            generation_retries: cli.generation_retries,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment, so dotenv-supplied
    // values reach both the config fallbacks and the logger filter.
    dotenvy::dotenv().ok();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    println!("\nGeosearch v{}\n", env!("CARGO_PKG_VERSION"));

    let cli_config: config::CliConfig = cli.into();
    let config = match config::ServerConfig::from_cli(cli_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    server::run_with_config(config).await;
}
