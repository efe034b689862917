use std::{io::Write as _, path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::Storefront;
use storage::{MemoryStore, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod config;
mod render;

use app::{App, Flow};
use commands::parse_line;
use config::{load_settings, normalize_database_url};
use render::toast_kind;

#[derive(Parser, Debug)]
#[command(about = "Build a bowl, pick a pickup point, place the order")]
struct Args {
    /// Settings file (defaults to ./storefront.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref());
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    storage.health_check().await?;
    info!(%database_url, "storefront ready");

    let storefront = Storefront::new(Arc::new(storage), Arc::new(MemoryStore::new()));
    let mut app = App::new(storefront);

    println!("{}", commands::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("[{}] {err}", toast_kind(err.code()));
                continue;
            }
        };

        let (flow, output) = app.handle(command).await;
        for text in output {
            println!("{text}");
        }
        if let Flow::Exit = flow {
            break;
        }
    }

    info!("storefront closed");
    Ok(())
}
