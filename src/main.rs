mod app;
mod client;
mod config;
mod feed;
mod poll;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{App, Popup};
use client::{FetchError, ImageClient};
use config::AppConfig;
use feed::DisplayImage;
use poll::Poller;
use theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "pawpoll")]
#[command(version = "0.1.0")]
#[command(about = "Polls a cat/dog classifier and shows the latest images per category")]
struct Args {
    /// Backend base URL (overrides config)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Seconds between fetches (overrides config)
    #[arg(short, long)]
    period: Option<u32>,

    /// Poll without a UI and log each retrieval
    #[arg(long)]
    headless: bool,

    /// Fetch a single image, print a JSON summary and exit
    #[arg(long, conflicts_with = "headless")]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The TUI owns the terminal, so its logs go to a file
    init_logging(!args.headless && !args.once);

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(period) = args.period {
        config.period_secs = period;
    }
    let config = config.sanitized();

    let client = ImageClient::new(&config.base_url, config.request_timeout())?;

    if args.once {
        return print_once(&client, &config).await;
    }

    let poller = Poller::new(&config, client);

    if args.headless {
        return poll::run_headless(poller).await;
    }

    run_tui(poller, Theme::from_config(&config.theme))
}

fn init_logging(to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pawpoll=info"));

    let writer = if to_file {
        match open_log_file() {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(io::sink),
        }
    } else {
        BoxMakeWriter::new(io::stderr)
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(!to_file))
        .with(filter)
        .init();
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("pawpoll");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("pawpoll.log"))
        .ok()
}

async fn print_once(client: &ImageClient, config: &AppConfig) -> Result<()> {
    let output = match client.retrieve_next().await {
        Ok(next) => {
            let image = DisplayImage::captured_now(next.image_base64, &config.timestamp_format);
            serde_json::json!({
                "category": next.category,
                "capturedAt": image.captured_at,
                "bytes": image.approx_bytes(),
            })
        }
        Err(FetchError::RateLimited { wait_seconds }) => serde_json::json!({
            "rateLimited": true,
            "waitSeconds": wait_seconds,
        }),
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn run_tui(poller: Poller, theme: Theme) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(poller, theme);
    app.poller.activate();

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Clear the timer before the terminal goes away
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            if let Err(e) = app.handle_key(key) {
                                tracing::warn!("Key handling failed: {}", e);
                            }
                        }
                    }
                }
            }
        }

        // Advance the countdown and pick up finished fetches
        let _ = app.tick();
    }
}
