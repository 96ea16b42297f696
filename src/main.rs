//! Duskfell - Entry Point
//!
//! Generates a campaign from a seed and opens an interactive map viewer so
//! the whole pipeline can be walked end to end.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};

use duskfell::render::{frame_from_map, GlyphBackend, TermGlyphs, TuiGlyphs};
use duskfell::world::Campaign;
use duskfell::{generate_campaign, ObjectDb, Position, WorldConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Ratatui widget rendering
    Tui,
    /// Raw crossterm writer
    Term,
}

#[derive(Parser)]
#[command(name = "duskfell", about = "Generate and explore a duskfell campaign")]
struct Args {
    /// Campaign seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Which glyph backend draws the view
    #[arg(long, value_enum, default_value_t = BackendKind::Tui)]
    backend: BackendKind,
    /// Path to a worldgen RON config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Log to a file so the TUI stays clean
    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("duskfell.log")
        .unwrap_or_else(|_| OpenOptions::new().write(true).open("/dev/null").unwrap());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let args = Args::parse();
    let cfg = WorldConfig::load(args.config.as_deref());
    let seed = args.seed.unwrap_or_else(rand::random);

    log::info!("Starting Duskfell v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Generating campaign with seed {seed}");
    let mut objects = ObjectDb::new();
    let campaign = generate_campaign(seed, &cfg, &mut objects)?;
    log::info!(
        "Campaign ready: {} levels, {} items placed",
        campaign.main_dungeon().depth(),
        objects.item_count()
    );

    // Setup terminal
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;

    let mut backend: Box<dyn GlyphBackend> = match args.backend {
        BackendKind::Tui => Box::new(TuiGlyphs::new()?),
        BackendKind::Term => Box::new(TermGlyphs::new()),
    };
    let result = viewer_loop(&campaign, backend.as_mut());

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    if let Err(ref e) = result {
        log::error!("Viewer exited with error: {e}");
        eprintln!("Error: {e}");
    }
    result
}

/// Tab cycles overworld and dungeon levels, arrows pan, q quits.
fn viewer_loop(campaign: &Campaign, backend: &mut dyn GlyphBackend) -> Result<()> {
    let depth = campaign.main_dungeon().depth();
    let mut view = 0usize; // 0 = overworld, 1.. = dungeon level
    let mut origin = initial_origin(campaign, view);

    loop {
        let map = match view {
            0 => &campaign.wilderness,
            n => &campaign.main_dungeon().levels[n - 1],
        };
        let (w, h) = crossterm::terminal::size()?;
        let frame = frame_from_map(map, origin, w, h);
        backend.present(&frame)?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Tab => {
                view = (view + 1) % (depth + 1);
                origin = initial_origin(campaign, view);
            }
            KeyCode::BackTab => {
                view = (view + depth) % (depth + 1);
                origin = initial_origin(campaign, view);
            }
            KeyCode::Left | KeyCode::Char('h') => origin.x -= 4,
            KeyCode::Right | KeyCode::Char('l') => origin.x += 4,
            KeyCode::Up | KeyCode::Char('k') => origin.y -= 2,
            KeyCode::Down | KeyCode::Char('j') => origin.y += 2,
            _ => {}
        }
    }

    Ok(())
}

/// The overworld opens centered on the dungeon entrance; levels open at
/// their top-left corner.
fn initial_origin(campaign: &Campaign, view: usize) -> Position {
    if view == 0 {
        let e = campaign.dungeon_entrance;
        Position::new(e.x - 40, e.y - 15)
    } else {
        Position::new(0, 0)
    }
}
