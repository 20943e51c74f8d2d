use clap::Parser;
use easystonks::api::ApiClient;
use easystonks::commands::{self, Command};
use easystonks::config::{Config, ConfigArgs};
use easystonks::engine::notice::{LocalStore, Notice};
use easystonks::engine::sound::TerminalBell;
use easystonks::feed;
use easystonks::ui::Dashboard;
use env_logger::{Builder, Target};
use log::{error, info, warn, LevelFilter};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Crypto market dashboard with score rankings and price alerts.
#[derive(Debug, Parser)]
#[command(name = "easystonks", version, about)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

fn init_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let target = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Target::Pipe(Box::new(file))
        }
        None => Target::Stderr,
    };

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("easystonks", LevelFilter::Debug)
        .parse_default_env()
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(target)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = Config::from_args(cli.config)?;
    let command = cli.command.unwrap_or(Command::Dashboard);
    let interactive = matches!(command, Command::Dashboard);
    init_logging(config.log_target(interactive).as_deref())?;

    let client = ApiClient::from_config(&config)?;

    match command {
        Command::Dashboard => run_dashboard(config, client).await,
        command => {
            let mut stdout = std::io::stdout().lock();
            commands::run(command, &client, config.listings_limit, &mut stdout).await?;
            Ok(())
        }
    }
}

async fn run_dashboard(config: Config, client: ApiClient) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Starting EasyStonks against {}", client.base_url());

    match client.health().await {
        Ok(health) if health.ok => info!("Backend is healthy"),
        Ok(_) => warn!("Backend reported unhealthy"),
        Err(e) => warn!("Backend not reachable yet ({}); it may still be waking up", e),
    }

    let (update_tx, update_rx) = tokio::sync::mpsc::channel(100);

    let listings_handle = tokio::spawn(feed::poll_listings(
        client.clone(),
        config.listings_limit,
        config.listings_interval,
        update_tx.clone(),
    ));
    let alerts_handle = tokio::spawn(feed::poll_alert_check(
        client.clone(),
        config.alerts_interval,
        update_tx.clone(),
    ));
    feed::fetch_global(client.clone(), update_tx.clone());
    feed::fetch_rules(client.clone(), update_tx.clone());

    let notice = Notice::load(LocalStore::new(config.state_file.clone()));
    let dashboard = Dashboard::new(&config, client, update_tx, Arc::new(TerminalBell), notice);

    let dashboard_handle = tokio::spawn(async move {
        if let Err(e) = dashboard.run(update_rx).await {
            error!("Dashboard error: {}", e);
        }
    });

    // Pollers only end once the dashboard drops its receiver.
    tokio::select! {
        _ = listings_handle => {},
        _ = alerts_handle => {},
        _ = dashboard_handle => {},
    };

    info!("Shutdown complete");
    Ok(())
}
