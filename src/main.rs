use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Terminal,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nodewatch::app::App;
use nodewatch::config::DashboardConfig;
use nodewatch::events;
use nodewatch::ui::{self, Theme};
use nodewatch_adapters::http::HttpBackend;
use nodewatch_adapters::sim::SimulatedBackend;
use nodewatch_adapters::Backend;
use nodewatch_sdk::{get_client, init_client_with, InitOptions};

#[derive(Parser, Debug)]
#[command(name = "nodewatch")]
#[command(about = "Terminal dashboard of live IoT node telemetry")]
struct Args {
    /// Path to a dashboard TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the simulated backend instead of the HTTP API
    #[arg(long)]
    demo: bool,

    /// Platform API endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// API token id
    #[arg(long)]
    token_id: Option<String>,

    /// API token
    #[arg(long, env = "NODEWATCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Minimum interval between calls to the same node, in milliseconds
    #[arg(long)]
    rate_limit_ms: Option<u64>,

    /// Refresh interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// File receiving log output
    #[arg(long, default_value = "nodewatch.log")]
    log_file: PathBuf,
}

impl Args {
    /// Command-line flags take precedence over the file and environment.
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(ref endpoint) = self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(ref token_id) = self.token_id {
            config.token_id = Some(token_id.clone());
        }
        if let Some(ref token) = self.token {
            config.token = Some(token.clone());
        }
        if let Some(rate_limit_ms) = self.rate_limit_ms {
            config.rate_limit_ms = rate_limit_ms;
        }
        if let Some(refresh) = self.refresh {
            config.refresh_secs = refresh;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let mut config = match (&args.config, args.demo) {
        (None, true) => DashboardConfig::demo(),
        (path, _) => DashboardConfig::load(path.as_deref())?,
    };
    args.apply(&mut config);

    let backend = build_backend(&config, args.demo)?;
    info!(backend = backend.description(), widgets = config.widgets.len(), "Starting");

    init_client_with(
        backend,
        InitOptions {
            use_global: true,
            force_reinit: false,
            rate_limit: config.rate_limit(),
        },
    );
    let client = get_client()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let app = App::new(
        client,
        config.widgets.clone(),
        Theme::auto_detect(),
        runtime.handle().clone(),
    );

    let result = run_tui(app, config.refresh_interval());
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

/// Log to a file; the terminal belongs to the TUI.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_backend(config: &DashboardConfig, demo: bool) -> Result<Arc<dyn Backend>> {
    if demo {
        return Ok(Arc::new(SimulatedBackend::builder().build()));
    }

    let (Some(token_id), Some(token)) = (config.token_id.as_deref(), config.token.as_deref()) else {
        anyhow::bail!("Missing credentials: set token_id and token, or run with --demo");
    };
    let mut builder = HttpBackend::builder().credentials(token_id, token);
    if let Some(ref endpoint) = config.endpoint {
        builder = builder.endpoint(endpoint);
    }
    Ok(Arc::new(builder.build()?))
}

/// Run the TUI until the user quits
fn run_tui(mut app: App, refresh_interval: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = Paragraph::new(msg)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Yellow));
                let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
                    .intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(8),    // Widgets
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::render_dashboard(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;
        app.tick = app.tick.wrapping_add(1);

        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }

        if app.last_refresh.elapsed() >= refresh_interval {
            app.refresh();
        }
    }

    Ok(())
}
