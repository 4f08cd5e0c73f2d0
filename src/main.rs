pub mod app_dirs;
pub mod config;
pub mod game;
pub mod history;
pub mod leaderboard;
pub mod rng;
pub mod runtime;
pub mod storage;
pub mod timing;
pub mod ui;
pub mod util;

use crate::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    game::{ActionOutcome, GameSession},
    history::HistoryLog,
    leaderboard::Leaderboard,
    rng::RandRotation,
    runtime::{CrosstermEventSource, GameEvent, Runner},
    storage::FileRecordsStore,
    timing::{DeadlineScheduler, SystemClock},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// Redraw cadence while no rotation tick is pending (paused sessions)
const IDLE_REDRAW_MS: u64 = 250;

/// reaction-time color game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reaction-time color game: a target color is announced, the pane cycles through colors at random intervals, and you press space only while the target color is showing. Fast reactions score more; the best scores and fastest reactions are kept across runs."
)]
pub struct Cli {
    /// seed for the rotation randomness (reproducible run)
    #[clap(long)]
    seed: Option<u64>,

    /// override the records file location
    #[clap(long)]
    records: Option<PathBuf>,

    /// delay before the first color rotation, in milliseconds
    #[clap(long)]
    initial_delay_ms: Option<u64>,
}

pub struct App {
    pub session: GameSession<SystemClock, RandRotation, DeadlineScheduler<SystemClock>>,
    pub store: FileRecordsStore,
    pub history: Option<HistoryLog>,
}

impl App {
    pub fn new(cli: &Cli, config: &Config) -> Self {
        let records_path = cli
            .records
            .clone()
            .or_else(|| config.records_path.clone())
            .or_else(AppDirs::records_path)
            .unwrap_or_else(|| PathBuf::from("blixt_records.txt"));
        let store = FileRecordsStore::open(records_path);
        let leaderboard = Leaderboard::load(&store);

        let rng = match cli.seed {
            Some(seed) => RandRotation::seeded(seed),
            None => RandRotation::from_entropy(),
        };
        let clock = SystemClock;
        let scheduler = DeadlineScheduler::new(clock);
        let initial_delay_ms = cli.initial_delay_ms.unwrap_or(config.initial_delay_ms);

        let mut session = GameSession::new(clock, rng, scheduler, initial_delay_ms, leaderboard);
        session.start_session();

        Self {
            session,
            store,
            history: AppDirs::history_path().map(HistoryLog::new),
        }
    }

    /// Forward a player action into the session and persist records when
    /// a hit changed them.
    pub fn handle_action(&mut self) {
        match self.session.on_player_action() {
            ActionOutcome::Hit {
                records_updated: true,
                ..
            } => {
                if let Err(err) = self.session.leaderboard().persist(&mut self.store) {
                    log::warn!("failed to persist records: {err}");
                }
            }
            ActionOutcome::Started => self.flush_history(),
            _ => {}
        }
    }

    fn flush_history(&mut self) {
        let summary = self.session.take_completed();
        if let (Some(history), Some(summary)) = (self.history.as_ref(), summary) {
            if let Err(err) = history.append(&summary) {
                log::warn!("failed to append session history: {err}");
            }
        }
    }

    /// Final bookkeeping on exit: log the running session and make one
    /// last persistence attempt so no record update is lost at teardown.
    pub fn finish(&mut self) {
        self.flush_history();
        if let Some(history) = self.history.as_ref() {
            if let Some(summary) = self.session.session_summary() {
                if let Err(err) = history.append(&summary) {
                    log::warn!("failed to append session history: {err}");
                }
            }
        }
        if let Err(err) = self.session.leaderboard().persist(&mut self.store) {
            log::warn!("failed to persist records on exit: {err}");
        }
    }
}

fn init_logging() {
    // The TUI owns the terminal, so the log goes to a file when one can
    // be created.
    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        std::fs::File::create(&path).ok()
    });

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(file) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    let _ = builder.try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config = FileConfigStore::new().load();

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&cli, &config);
    let res = run_app(&mut terminal, &mut app);
    app.finish();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new());

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let wait = Duration::from_millis(app.session.time_until_tick().unwrap_or(IDLE_REDRAW_MS));
        match runner.step(wait) {
            GameEvent::Tick => {
                app.session.poll_tick();
            }
            GameEvent::Resize => {}
            GameEvent::FocusLost => app.session.pause_session(),
            GameEvent::FocusGained => app.session.resume_session(),
            GameEvent::Key(key) => match key.code {
                KeyCode::Esc => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char('p') => app.session.pause_session(),
                KeyCode::Char(' ') | KeyCode::Enter => app.handle_action(),
                _ => {}
            },
        }
    }

    Ok(())
}
