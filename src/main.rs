use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::{debug, info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::{
    fs::File,
    io::stdout,
    thread,
    time::Duration,
};

use blockfall::config::{self, Config};
use blockfall::game::{
    CellState, Game, GameEvent, RandomSource, SeededRandom, ShapeKind, ThreadRandom,
};
use blockfall::input::{command_for_key, should_quit};

// ============================================================================
// Visual Constants
// ============================================================================

const BLOCK_CHAR: &str = "#";
const WALL_CHAR: &str = "|";
const FRAME_CHAR: &str = "¬";
const EMPTY_CHAR: &str = " ";

// ============================================================================
// Color Mapping
// ============================================================================

fn shape_color(kind: ShapeKind) -> Color {
    match kind {
        ShapeKind::Line => Color::Green,
        ShapeKind::Square => Color::Red,
        ShapeKind::LShape => Color::Blue,
        ShapeKind::SShape => Color::Green,
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn cell_span(cell: CellState) -> Span<'static> {
    match cell {
        CellState::Empty => Span::raw(EMPTY_CHAR),
        CellState::Wall => Span::raw(WALL_CHAR),
        CellState::Frame => Span::raw(FRAME_CHAR),
        CellState::Fixed => Span::raw(BLOCK_CHAR),
        CellState::Active(kind) => Span::styled(BLOCK_CHAR, Style::default().fg(shape_color(kind))),
    }
}

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();

    let lines: Vec<Line> = game
        .render_grid()
        .into_iter()
        .map(|row| Line::from(row.into_iter().map(cell_span).collect::<Vec<_>>()))
        .collect();

    // The surface is drawn 1:1 from the top-left corner; a smaller terminal clips it.
    let board_area = Rect {
        x: area.x,
        y: area.y,
        width: (game.surface.width.max(0) as u16).min(area.width),
        height: (game.surface.height.max(0) as u16).min(area.height),
    };
    frame.render_widget(Paragraph::new(lines), board_area);

    let status_y = area.y + board_area.height;
    if status_y < area.y + area.height {
        let status = Paragraph::new(Line::from(format!(
            "Pieces: {}  Rows: {}  | ←→ move, Space rotate, ↑↓ drop, Q quit",
            game.pieces_fixed(),
            game.rows_cleared()
        )))
        .style(Style::default().fg(Color::DarkGray));
        let status_area = Rect {
            x: area.x,
            y: status_y,
            width: area.width,
            height: 1,
        };
        frame.render_widget(status, status_area);
    }
}

// ============================================================================
// Logging
// ============================================================================

fn init_logging(config: &Config) -> Result<()> {
    let log_file = File::create(&config.log_file)
        .with_context(|| format!("failed to create log file {}", config.log_file.display()))?;

    // RUST_LOG wins over the configured level.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .target(env_logger::Target::Pipe(Box::new(log_file)))
    .init();

    Ok(())
}

fn log_events(game: &mut Game) {
    for event in game.take_events() {
        match event {
            GameEvent::PieceSpawned(kind) => debug!("Spawned {:?}", kind),
            GameEvent::PieceFixed => debug!("Piece fixed, {} cells settled", game.board.len()),
            GameEvent::RowsCleared(rows) => info!("Cleared {} row(s)", rows),
            GameEvent::PieceMoved | GameEvent::PieceRotated => {}
        }
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn run<B: Backend>(terminal: &mut Terminal<B>, game: &mut Game, tick: Duration) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, game))?;

        game.tick();

        // At most one buffered key per tick, never blocking.
        if event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && should_quit(key) {
                    info!("Quit requested");
                    return Ok(());
                }
                if let Some(command) = command_for_key(key) {
                    game.apply(command);
                }
            }
        }

        log_events(game);
        thread::sleep(tick);
    }
}

fn run_in_terminal(game: &mut Game, tick: Duration) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(Hide)?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout())).context("failed to initialise terminal")?;
    run(&mut terminal, game, tick)
}

fn restore_terminal() -> Result<()> {
    let raw = disable_raw_mode();
    let screen = stdout().execute(LeaveAlternateScreen).map(|_| ());
    let cursor = stdout().execute(Show).map(|_| ());
    raw.context("failed to disable raw mode")?;
    screen?;
    cursor?;
    Ok(())
}

fn main() -> Result<()> {
    let config_path = config::config_file_path();
    let config = config::load_config_from(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

    init_logging(&config)?;
    if !config_path.exists() {
        match config::save_config_to(&config_path, &config) {
            Ok(()) => info!("Wrote default config to {}", config_path.display()),
            Err(e) => warn!("Could not write default config: {}", e),
        }
    }
    info!(
        "Starting blockfall on a {}x{} surface, tick {}ms (config: {})",
        config.width,
        config.height,
        config.tick_ms,
        config_path.display()
    );

    let source: Box<dyn RandomSource> = match config.seed {
        Some(seed) => {
            info!("Using seeded piece selection ({})", seed);
            Box::new(SeededRandom::new(seed))
        }
        None => Box::new(ThreadRandom),
    };
    let mut game = Game::with_source(config.surface(), source);

    let result = run_in_terminal(&mut game, Duration::from_millis(config.tick_ms));
    // Always try to restore terminal state, then report the first error.
    let restored = restore_terminal();

    info!(
        "Exiting after {} pieces and {} cleared rows",
        game.pieces_fixed(),
        game.rows_cleared()
    );
    result?;
    restored
}
