use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui_choropleth::app::App;
use tui_choropleth::config::MapConfig;
use tui_choropleth::data::DefaultSource;
use tui_choropleth::map::ZoomTransform;
use tui_choropleth::pipeline::MapInstance;
use tui_choropleth::{svg, ui};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// URL or path of the county topology
    #[arg(long, value_name = "URL|PATH")]
    topology: Option<String>,

    /// URL or path of the education statistics
    #[arg(long, value_name = "URL|PATH")]
    education: Option<String>,

    /// Write the map as SVG instead of opening the viewer
    #[arg(long, value_name = "FILE")]
    svg: Option<PathBuf>,

    /// Number of color classes
    #[arg(long, value_parser = clap::value_parser!(u8).range(3..=9))]
    grades: Option<u8>,

    /// Write logs here instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create log file {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<MapConfig> {
    let mut config = match &cli.config {
        Some(path) => MapConfig::load_from_file(path)?,
        None => MapConfig::default(),
    };
    if let Some(topology) = &cli.topology {
        config.sources.topology = topology.clone();
    }
    if let Some(education) = &cli.education {
        config.sources.education = education.clone();
    }
    if let Some(grades) = cli.grades {
        config.legend.grades = grades as usize;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = load_config(&cli)?;
    let source = DefaultSource::new(&config.sources)?;
    let mut instance = MapInstance::new(config);
    // Both documents are in hand (or the failure is logged) before any drawing
    instance.load(&source).await;

    if let Some(path) = &cli.svg {
        let empty = instance.empty_scene();
        let (scene, legend) = match instance.choropleth() {
            Some(c) => (&c.scene, Some(&c.legend)),
            None => (&empty, None),
        };
        svg::write(path, scene, legend, &ZoomTransform::IDENTITY)?;
        info!("Wrote {:?}", path);
        return Ok(());
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, instance);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for hovering, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.hover(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan_cells(4, 0),
        MouseEventKind::ScrollRight => app.pan_cells(-4, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
            app.hover(mouse.column, mouse.row);
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, instance: MapInstance) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(instance, size.width as usize, size.height as usize);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Nothing animates, so a slow poll is enough
        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan_view(-1, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan_view(1, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan_view(0, -1),
                            KeyCode::Down | KeyCode::Char('j') => app.pan_view(0, 1),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
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
