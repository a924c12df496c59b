use clap::Parser;
use tracing_subscriber::EnvFilter;

use notes_api::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Load .env if present so DATABASE_URL, JWT_SECRET_KEY etc. are picked up locally.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notes_api=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    if let Err(e) = cli::run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
