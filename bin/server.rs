// HBNB - Web Server
// Serves the HTML views and the JSON API over the configured storage backend

use clap::Parser;
use hbnb::web::{router, AppState};
use hbnb::{storage, Config, VERSION};

/// HBNB web server
#[derive(Parser, Debug)]
#[command(name = "hbnb-server")]
#[command(version)]
struct Cli {
    /// Bind address (overrides HBNB_BIND_ADDR)
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,tower_http=debug",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("HBNB server v{}", VERSION);

    let config = Config::from_env()?;
    let storage = storage::open_or_exit(&config);
    let app = router(AppState::new(storage));

    let addr = cli.bind.unwrap_or(config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    tracing::info!("Pages: /states_list /cities_by_states  API: /api/<Class>");

    axum::serve(listener, app).await?;

    Ok(())
}
