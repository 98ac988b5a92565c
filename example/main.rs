use arena_h1::Server;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tokio::{net::TcpListener, runtime::Runtime};

mod app;
mod files;
mod settings;

use app::App;
use settings::Settings;

const DEFAULT_ADDR: &str = "0.0.0.0:4221";

#[derive(Debug, Parser)]
#[command(name = "example", about = "Echo and file server on an arena backed HTTP/1.1 core")]
struct Cli {
    /// Address to listen on, `0.0.0.0:4221` if not set here or in the config file.
    #[arg(short, long)]
    addr: Option<String>,
    /// Directory backing `/files/{name}`.
    #[arg(short, long)]
    directory: Option<PathBuf>,
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Listen on a Unix socket at this path instead of TCP.
    #[cfg(unix)]
    #[arg(long, conflicts_with = "addr")]
    unix: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    Runtime::new()?.block_on(serve(cli, settings))
}

async fn serve(cli: Cli, settings: Settings) -> Result<(), Box<dyn Error>> {
    let config = settings.connection.apply(arena_h1::Config::default());
    let directory = cli
        .directory
        .or(settings.directory)
        .unwrap_or_else(|| PathBuf::from("."));
    log::info!("serving files from {}", directory.display());
    let app = App::new(directory);

    #[cfg(unix)]
    if let Some(path) = cli.unix {
        let listener = tokio::net::UnixListener::bind(&path)?;
        log::info!("listening in {}", path.display());
        Server::new(listener, app).config(config)?.run().await;
        return Ok(());
    }

    let addr = cli
        .addr
        .or(settings.addr)
        .unwrap_or_else(|| DEFAULT_ADDR.to_owned());
    let listener = TcpListener::bind(&addr).await?;
    log::info!("listening in {}", listener.local_addr()?);

    Server::new(listener, app).config(config)?.run().await;
    Ok(())
}
