use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lawblog_api::auth::{generate_jwt, Claims};
use lawblog_api::database::DatabaseManager;
use lawblog_api::{config, is_production, AppState};

#[derive(Parser)]
#[command(name = "lawblog-api")]
#[command(about = "Admin account deletion and legal blog generation service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to PORT or 3000)")]
        port: Option<u16>,
    },

    #[command(about = "Print a signed bearer token for local testing")]
    Token {
        #[arg(help = "Principal id to put in the token")]
        uid: String,

        #[arg(long, help = "Token lifetime in hours")]
        hours: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, OPENAI_API_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(port).await,
        Command::Token { uid, hours } => {
            let config = config::config();
            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let claims = Claims::new(uid, hours).context("invalid token lifetime")?;
            let token = generate_jwt(&claims, &config.security.jwt_secret)
                .context("failed to sign token (is JWT_SECRET set?)")?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting lawblog-api in {:?} mode", config.environment);

    if is_production!() && config.security.expose_error_details {
        tracing::warn!("Error details are exposed in responses while running in production");
    }

    let state = AppState::shared().context("failed to initialize collaborators")?;
    let app = lawblog_api::app(state.clone(), &config.api);

    // Allow tests or deployments to override port via env
    let port = port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("lawblog-api listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
