use std::time::Duration;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod backend;
mod config;
mod handler;
mod session;
mod store;
mod style;
mod tui;
mod ui;

use app::App;
use backend::BackendClient;
use config::Config;
use session::ChatSession;
use store::FileStore;
use style::ResponseStyle;

#[derive(Parser)]
#[command(name = "concierge")]
#[command(about = "Terminal chat client for the event concierge backend")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "CONCIERGE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Response style: default, concierge, tourguide, friendly, family
    #[arg(long)]
    style: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stdout; the TUI owns stderr. Silent unless RUST_LOG is set.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_default();
    let backend_url = config.resolve_backend_url(cli.backend_url.as_deref());

    let style = match cli.style.as_deref() {
        Some(name) => match ResponseStyle::from_str(name) {
            Some(style) => Some(style),
            None => {
                tracing::warn!(style = name, "unknown style, falling back");
                None
            }
        },
        None => None,
    }
    .or_else(|| config.saved_style())
    .unwrap_or_default();

    let mut session_store = FileStore::open_default()?;
    let session_id = store::ensure_session_id(&mut session_store)?;

    tracing::info!(backend = %backend_url, style = style.as_str(), "starting concierge chat");

    let session = ChatSession::new(session_id, style);
    let backend = BackendClient::new(&backend_url);
    let mut app = App::new(session, backend);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(Duration::from_millis(250));

    let result = run(&mut app, &mut terminal, &mut events).await;

    // Cancel any in-flight request so nothing resolves after teardown
    app.abort_pending();
    tui::restore()?;
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event)?;
        }

        // Tick events keep this polling while a request is in flight
        app.poll_reply().await;
    }
    Ok(())
}
