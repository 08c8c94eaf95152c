//! pairmark command-line front end.
//!
//! Reads commands from stdin, one per line, and prints the drawing calls a
//! graphical front end would perform. Errors go to stderr.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use pairmark::config::{AppConfig, LogLevel};
use pairmark::coords::{Position, Size};
use pairmark::message::{Command, HELP};
use pairmark::model::{Category, ImageSlot};
use pairmark::presenter::Presenter;
use pairmark::session::Session;
use pairmark::store::FileStore;
use pairmark::zoom::ZoomView;

/// How long a command waits for the active sequence's images.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "pairmark", version, about = "Landmark annotation for paired images")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding per-sequence point files
    #[arg(long)]
    store: Option<PathBuf>,

    /// Viewport used to fit images, as <width>x<height>
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Size>,

    /// Images or folders to load at startup
    paths: Vec<PathBuf>,
}

fn parse_viewport(s: &str) -> Result<Size, String> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| format!("expected <width>x<height>, got '{}'", s))?;
    let width: f64 = width.parse().map_err(|_| format!("invalid width '{}'", width))?;
    let height: f64 = height.parse().map_err(|_| format!("invalid height '{}'", height))?;
    if !(width > 0.0 && height > 0.0) {
        return Err("viewport must have a positive size".to_string());
    }
    Ok(Size::new(width, height))
}

fn slot_name(slot: ImageSlot) -> &'static str {
    match slot {
        ImageSlot::Primary => "primary",
        ImageSlot::Secondary => "secondary",
    }
}

/// Prints drawing calls as text.
struct TextPresenter;

impl Presenter for TextPresenter {
    fn clear_surface(&mut self, slot: ImageSlot) {
        println!("[{}] clear", slot_name(slot));
    }

    fn render_point(&mut self, slot: ImageSlot, at: Position, category: Category, occluded: bool) {
        let [r, g, b] = category.color();
        println!(
            "[{}] {} point #{:02x}{:02x}{:02x} at ({:.1}, {:.1}){}",
            slot_name(slot),
            category,
            r,
            g,
            b,
            at.x,
            at.y,
            if occluded { " occluded" } else { "" }
        );
    }

    fn render_zoom_inset(&mut self, slot: ImageSlot, view: ZoomView) {
        println!(
            "[{}] contact inset from ({:.1}, {:.1}) {:.1}x{:.1}",
            slot_name(slot),
            view.source.x,
            view.source.y,
            view.source.width,
            view.source.height
        );
    }

    fn show_magnifier(&mut self, slot: ImageSlot, view: ZoomView) {
        let center = view.source.center();
        println!(
            "[{}] magnifier at ({:.1}, {:.1}) covering {:.1}px",
            slot_name(slot),
            center.x,
            center.y,
            view.source.width
        );
    }

    fn hide_magnifier(&mut self) {
        println!("magnifier hidden");
    }

    fn show_progress(&mut self, sequence_id: &str, index: usize, total: usize) {
        println!("sequence {} ({}/{})", sequence_id, index + 1, total);
    }

    fn report(&mut self, message: &str) {
        println!("{}", message);
    }

    fn report_error(&mut self, message: &str) {
        eprintln!("error: {}", message);
    }
}

fn init_logging(level: LogLevel) {
    // RUST_LOG, when set, overrides the configured level.
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .init();
}

fn prompt(interactive: bool) -> io::Result<()> {
    if interactive {
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}

fn run(session: &mut Session, presenter: &mut TextPresenter) -> io::Result<()> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();

    prompt(interactive)?;
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "" => {}
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            text => match Command::parse(text) {
                Ok(command) => {
                    session.handle(command, presenter);
                    session.finish_loading(LOAD_TIMEOUT, presenter);
                }
                Err(e) => presenter.report_error(&e.to_string()),
            },
        }
        prompt(interactive)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref());
    init_logging(config.preferences.log_level);
    if let Some(viewport) = cli.viewport {
        config.preferences.viewport = viewport;
    }

    let store_dir = cli
        .store
        .or_else(|| config.preferences.store_dir.clone())
        .or_else(FileStore::default_dir);
    let Some(store_dir) = store_dir else {
        eprintln!("Could not determine a data directory; pass --store <dir>");
        return ExitCode::FAILURE;
    };
    let store = FileStore::new(store_dir);
    log::info!("Storing progress in {:?}", store.dir());

    let mut session = match Session::new(Box::new(store), &config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to start session: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut presenter = TextPresenter;

    if !cli.paths.is_empty() {
        session.handle(Command::LoadImages(cli.paths), &mut presenter);
        session.finish_loading(LOAD_TIMEOUT, &mut presenter);
    }

    if let Err(e) = run(&mut session, &mut presenter) {
        eprintln!("Failed to read input: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
