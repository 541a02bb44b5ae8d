mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use sdp_chat_core::{ApiClient, Config, MarkdownSubset};
use tracing::{info, warn};

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "sdp-chat")]
#[command(version, about = "Terminal client for the SDP knowledge-base chatbot")]
struct Cli {
    /// Backend base URL (overrides SDP_CHAT_API_URL and the config file)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Show assistant answers verbatim, without list or bold formatting
    #[arg(long)]
    plain: bool,

    /// Write logs here instead of the default data directory
    #[arg(long, value_name = "PATH", env = "SDP_CHAT_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match cli.log_file {
        Some(path) => path,
        None => logging::default_log_path()?,
    };
    logging::init(&log_path)?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config file, using defaults");
        Config::new()
    });

    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let markdown = if cli.plain {
        MarkdownSubset::None
    } else {
        config.markdown_subset()
    };
    info!(api_url = %api_url, markdown = markdown.as_str(), "starting sdp-chat");

    let mut events = EventHandler::new();
    let mut app = App::new(ApiClient::new(&api_url), markdown, events.sender());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("exiting");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
