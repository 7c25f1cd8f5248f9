//! `yijing`: terminal workbench for Yijing divination.
//!
//! # Usage
//!
//! ```
//! yijing --url http://localhost:8000 --language en
//! yijing --config ~/.config/yijing/config.toml --najia
//! ```

use std::{
  fs::OpenOptions,
  io,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use yijing_cli::{
  app::App,
  client::{ApiClient, ApiConfig},
  clipboard::Osc52,
  config::Settings,
  ui,
  workbench::Workbench,
};
use yijing_core::{language::Language, storage::Storage};
use yijing_store_sqlite::SqliteStorage;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "yijing", version, about = "Terminal workbench for Yijing divination")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the divination backend.
  #[arg(long, env = "YIJING_URL")]
  url: Option<String>,

  /// Initial language when none has been saved (zh or en).
  #[arg(long)]
  language: Option<Language>,

  /// Directory for the database, log and exports.
  #[arg(long, value_name = "DIR")]
  data_dir: Option<PathBuf>,

  /// Request the najia analysis with each divination.
  #[arg(long)]
  najia: bool,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Config file and environment, then CLI flags on top.
  let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
  if let Some(url) = args.url {
    settings.base_url = url;
  }
  if let Some(language) = args.language {
    settings.language = language;
  }
  if let Some(dir) = args.data_dir {
    settings.data_dir = Some(dir);
  }
  settings.include_najia |= args.najia;

  let data_dir = settings.data_dir();
  std::fs::create_dir_all(&data_dir)
    .with_context(|| format!("creating data directory {}", data_dir.display()))?;
  init_tracing(&settings)?;
  tracing::info!(base_url = %settings.base_url, data_dir = %data_dir.display(), "starting");

  let storage = Arc::new(
    SqliteStorage::open(settings.database_path()).context("opening local database")?,
  );
  let client = ApiClient::new(ApiConfig {
    base_url: settings.base_url.clone(),
    timeout:  settings.request_timeout(),
  })?;

  let mut app = App::new(
    client,
    storage,
    Workbench::new(settings.latency(), settings.include_najia),
    settings.language,
    settings.export_dir(),
    Box::new(Osc52::new(io::stdout())),
  );
  app.check_health();

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  tracing::info!("exiting");
  run_result
}

/// Log to `<data-dir>/yijing.log`; the terminal belongs to the UI.
fn init_tracing(settings: &Settings) -> Result<()> {
  let path = settings.log_path();
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .with_context(|| format!("opening log file {}", path.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<B, S>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<B, S>,
) -> Result<()>
where
  B: yijing_core::backend::DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  loop {
    app.drain_tasks();
    app.tick(Instant::now());
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key) {
          break;
        }
      }
      // Resizes and everything else just redraw on the next pass.
      _ => {}
    }
  }

  Ok(())
}
