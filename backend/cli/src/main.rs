mod api;
mod config;
mod dispatcher;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use pagepilot_channels::{
    ChannelAdapter, MessengerAdapter, MessengerConfig, MessengerSender, TelegramNotifier,
};
use pagepilot_core::PilotBus;

use api::AppState;
use config::Config;

#[derive(Parser)]
#[command(name = "pagepilot")]
#[command(about = "PagePilot — Messenger chatbot backend for small businesses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the PagePilot server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show current runtime status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    pagepilot_logging::init_logger(config.log_dir.as_deref(), &config.log_level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("PagePilot is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    config.validate()?;

    info!(
        port = config.port,
        bind = %config.bind_address,
        "Starting PagePilot runtime"
    );

    let mut bus = PilotBus::new();
    let dispatcher_rx = bus
        .take_dispatcher_rx()
        .ok_or_else(|| anyhow::anyhow!("dispatcher receiver already taken"))?;

    // Owner alert notifier (optional)
    let alert_tx = match (&config.telegram_bot_token, config.telegram_owner_chat_id) {
        (Some(token), Some(chat_id)) => {
            let notifier = TelegramNotifier::new(token.clone(), chat_id);
            let notifier_rx = bus
                .take_notifier_rx()
                .ok_or_else(|| anyhow::anyhow!("notifier receiver already taken"))?;
            tokio::spawn(notifier.run(notifier_rx));
            info!("Telegram owner alerts enabled");
            Some(bus.notifier_tx.clone())
        }
        _ => {
            info!("Telegram owner alerts disabled");
            None
        }
    };
    let telegram_enabled = alert_tx.is_some();

    tokio::spawn(dispatcher::run_dispatcher(dispatcher_rx, alert_tx));

    // Messenger channel (optional)
    let channel_router = match &config.messenger_verify_token {
        Some(verify_token) => {
            if config.messenger_app_secret.is_none() {
                warn!("MESSENGER_APP_SECRET is not set — all webhook deliveries will be rejected");
            }
            let adapter = MessengerAdapter::new(
                MessengerConfig {
                    app_secret: config.messenger_app_secret.clone(),
                    verify_token: verify_token.clone(),
                    webhook_path: config.messenger_webhook_path.clone(),
                },
                bus.dispatcher_tx.clone(),
            );
            adapter.start(bus.dispatcher_tx.clone()).await?;
            Some(adapter.build_router())
        }
        None => {
            warn!("MESSENGER_VERIFY_TOKEN is not set — Messenger webhook disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        messenger_sender: config.messenger_page_token.clone().map(MessengerSender::new),
        admin_token: config.admin_token.clone(),
        messenger_enabled: channel_router.is_some(),
        telegram_enabled,
    });

    let app = api::build_router(state, channel_router);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("PagePilot HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
