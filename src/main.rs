use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use facilities::app::{router, AppState};
use facilities::auth::models::Role;
use facilities::config::Settings;
use facilities::db::Repositories;

#[derive(Parser)]
#[command(name = "facilities-api", version, about = "Campus facilities REST API")]
struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a signed bearer token for calling the API
    MintToken {
        /// Subject (user id) carried by the token
        #[arg(long)]
        sub: String,
        #[arg(long)]
        email: String,
        /// admin, student or custodian
        #[arg(long, default_value = "admin")]
        role: String,
        /// Lifetime in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::MintToken {
            sub,
            email,
            role,
            hours,
        } => {
            let role = Role::from_str_ci(&role)
                .with_context(|| format!("Unknown role '{role}'"))?;
            let token = settings
                .signing_verifier()?
                .issue(&sub, &email, role, chrono::Duration::hours(hours))?;
            println!("{token}");
            Ok(())
        }
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    init_tracing(&settings);
    tracing::info!("Starting facilities API...");

    let client = mongodb::Client::with_uri_str(&settings.mongodb.uri)
        .await
        .context("Failed to create MongoDB client")?;
    let db = client.database(&settings.mongodb.database);
    db.run_command(bson::doc! { "ping": 1 })
        .await
        .context("Failed to reach MongoDB")?;
    tracing::info!(database = %settings.mongodb.database, "Connected to MongoDB");

    let repos = Repositories::connect(&db).await?;

    let token_verifier = settings.token_verifier();
    if token_verifier.is_none() {
        tracing::warn!("API authentication is disabled");
    }
    let app = router(AppState::new(repos, token_verifier));

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    client.shutdown().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
