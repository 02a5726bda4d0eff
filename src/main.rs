mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use spawnmap::aggregate::Mode;
use spawnmap::config::MapConfig;
use spawnmap::data;
use spawnmap::filter::Blocklist;
use spawnmap::orchestrator::Orchestrator;
use spawnmap::record::Domain;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DomainArg {
    Spawns,
    Raids,
    Invasions,
}

impl From<DomainArg> for Domain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Spawns => Domain::Spawns,
            DomainArg::Raids => Domain::Raids,
            DomainArg::Invasions => Domain::Invasions,
        }
    }
}

/// Terminal map of spawn, raid and invasion telemetry.
#[derive(Parser, Debug)]
#[command(name = "spawnmap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of rows, or a GeoJSON FeatureCollection (.geojson)
    #[arg(long)]
    data: PathBuf,

    /// Which telemetry the rows describe
    #[arg(long, value_enum, default_value_t = DomainArg::Spawns)]
    domain: DomainArg,

    /// Initial render mode: markers, density or grid
    #[arg(long, default_value = "markers")]
    mode: String,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Category key to hide ("species:form" or "character"); repeatable
    #[arg(long = "block")]
    block: Vec<String>,

    /// Write logs here; logging is discarded otherwise
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Logs go to a file (or nowhere) so they never draw over the map
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = match &args.config {
        Some(path) => MapConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MapConfig::default(),
    };
    let domain = Domain::from(args.domain);
    let records = data::load_records(&args.data, domain)?;
    let blocklist: Blocklist = args.block.iter().cloned().collect();
    info!(%domain, mode = %args.mode, blocked = blocklist.len(), "starting");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let orchestrator = Orchestrator::from_config(config);
    let mut app = App::new(
        orchestrator,
        records,
        domain,
        args.mode,
        blocklist,
        size.width as usize,
        size.height as usize,
    );

    // Run the app
    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and hover
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker and tooltip
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Modes
                            KeyCode::Char('m') => app.set_mode(Mode::Markers),
                            KeyCode::Char('d') => app.set_mode(Mode::Density),
                            KeyCode::Char('g') => app.set_mode(Mode::Grid),

                            // Blocklist
                            KeyCode::Char('x') => app.block_busiest_visible(),
                            KeyCode::Char('u') => app.clear_blocklist(),

                            // Refit to the data
                            KeyCode::Char('r') | KeyCode::Char('0') => app.notify_data_changed(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
