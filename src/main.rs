mod ui;

use std::{
    cell::Cell,
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    sync::Mutex,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use reflex::{
    app_dirs::AppDirs,
    config::{parse_target_count, Config, ConfigStore, FileConfigStore},
    layout::{Position, Size},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    Attempt, Game, GameConfig, Status,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;

/// click the numbered targets in ascending order before they vanish
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A terminal reflex game: click the numbered targets in ascending order. Clicked targets count down and vanish; a wrong click ends the round."
)]
pub struct Cli {
    /// number of targets per session
    #[clap(short = 'n', long, allow_negative_numbers = true)]
    points: Option<i64>,

    /// seconds a clicked target stays visible
    #[clap(long)]
    countdown: Option<f64>,

    /// seconds between the last correct click and the win
    #[clap(long)]
    grace: Option<f64>,

    /// seconds autoplay waits before each click
    #[clap(long)]
    autoplay_delay: Option<f64>,

    /// turn autoplay on whenever a session starts
    #[clap(long)]
    autoplay: bool,

    /// seed for reproducible layouts
    #[clap(long)]
    seed: Option<u64>,

    /// start a session right away instead of waiting for play
    #[clap(long)]
    play: bool,

    /// print the effective configuration as JSON and exit
    #[clap(long)]
    print_config: bool,

    /// store the effective configuration as the new defaults
    #[clap(long)]
    save_config: bool,

    /// append logs to this file (default: $REFLEX_LOG_PATH, then the state dir)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Layers command line flags over stored preferences
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(points) = self.points {
            cfg.target_count = points;
        }
        if let Some(secs) = self.countdown {
            cfg.countdown_secs = secs;
        }
        if let Some(secs) = self.grace {
            cfg.win_grace_secs = secs;
        }
        if let Some(secs) = self.autoplay_delay {
            cfg.autoplay_delay_secs = secs;
        }
        if self.autoplay {
            cfg.autoplay = true;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        cfg
    }
}

pub struct App {
    pub game: Game,
    /// Text of the points field; always parses as a whole number
    pub points_input: String,
    pub points: i64,
    pub has_played: bool,
    pub autoplay_on_start: bool,
    /// Play area in terminal coordinates, as of the last resize
    pub play: Rect,
    banner: Rc<Cell<Status>>,
}

impl App {
    pub fn new(config: &Config, game_config: GameConfig) -> Self {
        let mut game = match config.seed {
            Some(seed) => Game::with_seed(game_config, seed),
            None => Game::new(game_config),
        };

        let banner = Rc::new(Cell::new(Status::Idle));
        let sink = Rc::clone(&banner);
        game.subscribe(move |status: Status| sink.set(status));

        Self {
            game,
            points_input: config.target_count.to_string(),
            points: config.target_count,
            has_played: false,
            autoplay_on_start: config.autoplay,
            play: Rect::default(),
            banner,
        }
    }

    /// Status as last announced to the shell
    pub fn banner(&self) -> Status {
        self.banner.get()
    }

    pub fn resize(&mut self, frame: Rect) {
        self.play = ui::areas(frame).play;
        self.game.set_play_area(Size::new(
            f64::from(self.play.width),
            f64::from(self.play.height),
        ));
    }

    /// Play / Restart. Invalid point counts leave everything as it was.
    pub fn play(&mut self) {
        match self.game.start(self.points) {
            Ok(()) => {
                self.has_played = true;
                if self.autoplay_on_start {
                    self.game.set_autoplay(true);
                }
            }
            Err(err) => debug!("play ignored: {err}"),
        }
    }

    pub fn toggle_autoplay(&mut self) {
        self.game.toggle_autoplay();
    }

    pub fn edit_points(&mut self, edit: impl FnOnce(&mut String)) {
        let mut candidate = self.points_input.clone();
        edit(&mut candidate);
        // non-numeric edits are dropped, the previous value stays
        if let Ok(points) = parse_target_count(&candidate) {
            self.points_input = candidate;
            self.points = points;
        }
    }

    pub fn click(&mut self, column: u16, row: u16) -> Option<Attempt> {
        if !self.play.contains((column, row).into()) {
            return None;
        }
        // centre of the clicked cell, relative to the play area
        let point = Position::new(
            f64::from(column - self.play.x) + 0.5,
            f64::from(row - self.play.y) + 0.5,
        );
        let value = self.game.target_at(point)?;
        Some(self.game.attempt_select(value))
    }

    pub fn tick(&mut self, dt: Duration) {
        self.game.advance(dt);
    }

    /// Returns false when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Char('p') | KeyCode::Enter => self.play(),
            KeyCode::Char('a') => self.toggle_autoplay(),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                self.edit_points(|s| s.push(c));
            }
            KeyCode::Backspace => self.edit_points(|s| {
                s.pop();
            }),
            _ => {}
        }
        true
    }
}

fn init_logging(path: Option<PathBuf>) {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // stderr belongs to the TUI, so logs only ever go to a file
    let Some(path) = path
        .or_else(|| std::env::var_os("REFLEX_LOG_PATH").map(PathBuf::from))
        .or_else(AppDirs::log_path)
    else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
    }
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(cli.log_file.clone());
    let game_config = config.game_config(ui::TARGET_SIZE, ui::TARGET_MARGIN)?;
    info!(?config, "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, game_config);
    let result = start_tui(&mut terminal, &mut app, cli.play);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    play_now: bool,
) -> Result<(), Box<dyn Error>> {
    let size = terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));
    if play_now {
        app.play();
    }

    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            GameEvent::Tick(dt) => app.tick(dt),
            GameEvent::Resize(width, height) => app.resize(Rect::new(0, 0, width, height)),
            GameEvent::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                    app.click(mouse.column, mouse.row);
                }
            }
            GameEvent::Key(key) => {
                if !app.on_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ratatui::backend::TestBackend;
    use reflex::{sequencer::Resolution, target::TargetState, Ignored};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(config: Config) -> App {
        let game_config = config
            .game_config(ui::TARGET_SIZE, ui::TARGET_MARGIN)
            .unwrap();
        let mut app = App::new(&config, game_config);
        app.resize(Rect::new(0, 0, 80, 24));
        app
    }

    fn app() -> App {
        app_with(Config {
            seed: Some(5),
            ..Config::default()
        })
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| ui::draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    /// Screen cell in the middle of the target labelled `value`
    fn cell_of(app: &App, value: u32) -> (u16, u16) {
        let target = app.game.target(value).unwrap();
        let rect = ui::target_rect(app.play, target).unwrap();
        (rect.x, rect.y)
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["reflex"]);
        assert_eq!(cli.points, None);
        assert!(!cli.autoplay);
        assert!(!cli.play);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_overrides_stored_config() {
        let cli = Cli::parse_from([
            "reflex",
            "-n",
            "12",
            "--countdown",
            "1.5",
            "--autoplay",
            "--seed",
            "3",
        ]);
        let cfg = cli.apply(Config {
            target_count: 7,
            win_grace_secs: 2.0,
            ..Config::default()
        });

        assert_eq!(cfg.target_count, 12);
        assert_eq!(cfg.countdown_secs, 1.5);
        assert_eq!(cfg.win_grace_secs, 2.0);
        assert!(cfg.autoplay);
        assert_eq!(cfg.seed, Some(3));
    }

    #[test]
    fn test_cli_accepts_negative_points() {
        let cli = Cli::parse_from(["reflex", "--points", "-2"]);
        assert_eq!(cli.points, Some(-2));
    }

    #[test]
    fn test_app_new_is_idle() {
        let app = app();
        assert_eq!(app.banner(), Status::Idle);
        assert_eq!(app.points, 5);
        assert_eq!(app.points_input, "5");
        assert!(!app.has_played);
        assert_eq!(app.game.play_area(), Size::new(78.0, 17.0));
    }

    #[test]
    fn test_play_starts_session() {
        let mut app = app();
        app.play();

        assert!(app.has_played);
        assert_eq!(app.banner(), Status::Playing);
        assert_eq!(app.game.targets().count(), 5);
    }

    #[test]
    fn test_play_with_zero_points_is_ignored() {
        let mut app = app();
        app.on_key(key(KeyCode::Backspace));
        assert_eq!(app.points_input, "");
        assert_eq!(app.points, 0);

        app.play();
        assert!(!app.has_played);
        assert_eq!(app.game.status(), Status::Idle);
    }

    #[test]
    fn test_points_editing_rejects_non_numeric() {
        let mut app = app();
        app.on_key(key(KeyCode::Char('0')));
        assert_eq!(app.points, 50);

        app.edit_points(|s| s.push('x'));
        assert_eq!(app.points_input, "50");
        assert_eq!(app.points, 50);

        // '-' in the middle does not parse either
        app.on_key(key(KeyCode::Char('-')));
        assert_eq!(app.points_input, "50");
    }

    #[test]
    fn test_autoplay_key_only_while_playing() {
        let mut app = app();
        app.on_key(key(KeyCode::Char('a')));
        assert!(!app.game.autoplay_enabled());

        app.on_key(key(KeyCode::Char('p')));
        app.on_key(key(KeyCode::Char('a')));
        assert!(app.game.autoplay_enabled());
        app.on_key(key(KeyCode::Char('a')));
        assert!(!app.game.autoplay_enabled());
    }

    #[test]
    fn test_autoplay_on_start() {
        let mut app = app_with(Config {
            target_count: 2,
            autoplay: true,
            seed: Some(1),
            ..Config::default()
        });
        app.play();
        assert!(app.game.autoplay_enabled());

        for _ in 0..80 {
            app.tick(Duration::from_millis(100));
        }
        assert_eq!(app.banner(), Status::Won);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!app.on_key(key(KeyCode::Esc)));
        assert!(!app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.on_key(key(KeyCode::Char('z'))));
    }

    #[test]
    fn test_click_selects_expected_target() {
        let mut app = app();
        app.play();

        let (col, row) = cell_of(&app, 1);
        assert_matches!(
            app.click(col, row),
            Some(Attempt::Resolved(Resolution::Advanced { next: 2 }))
        );
        assert_eq!(
            app.game.target(1).unwrap().state(),
            TargetState::Selected
        );
    }

    #[test]
    fn test_click_outside_play_area_is_ignored() {
        let mut app = app();
        app.play();
        assert_eq!(app.click(0, 0), None);
        assert_eq!(app.game.expected_value(), Some(1));
    }

    #[test]
    fn test_click_on_selected_target_is_a_no_op() {
        let mut app = app();
        app.play();
        let (col, row) = cell_of(&app, 1);
        app.click(col, row);

        // value 1 sits on top of anything it overlaps
        assert_eq!(
            app.click(col, row),
            Some(Attempt::Ignored(Ignored::Inactive))
        );
    }

    #[test]
    fn test_wrong_click_loses() {
        let mut app = app_with(Config {
            target_count: 2,
            seed: Some(9),
            ..Config::default()
        });
        app.play();

        let (col, row) = cell_of(&app, 2);
        let point = Position::new(
            f64::from(col - app.play.x) + 0.5,
            f64::from(row - app.play.y) + 0.5,
        );
        if app.game.target_at(point) == Some(2) {
            assert_matches!(
                app.click(col, row),
                Some(Attempt::Resolved(Resolution::Mismatch { expected: 1, got: 2 }))
            );
        } else {
            // 1 covers that cell, so pick 2 directly
            app.game.attempt_select(2);
        }
        assert_eq!(app.banner(), Status::Lost);
    }

    #[test]
    fn test_ui_idle_screen() {
        let app = app();
        let text = screen_text(&app);
        assert!(text.contains("LET'S PLAY"));
        assert!(text.contains("[p] Play"));
        assert!(text.contains("0.0s"));
        assert!(!text.contains("Auto play"));
    }

    #[test]
    fn test_ui_playing_screen() {
        let mut app = app();
        app.play();
        let text = screen_text(&app);

        assert!(text.contains("[p] Restart"));
        assert!(text.contains("Auto play ON"));
        assert!(text.contains("Next: 1"));
    }

    #[test]
    fn test_ui_lost_screen() {
        let mut app = app();
        app.play();
        app.game.attempt_select(3);
        let text = screen_text(&app);

        assert!(text.contains("GAME OVER"));
        assert!(!text.contains("Next:"));
        assert!(!text.contains("Auto play"));
    }

    #[test]
    fn test_ui_shows_countdown_of_selected_target() {
        let mut app = app_with(Config {
            target_count: 1,
            seed: Some(2),
            ..Config::default()
        });
        app.play();
        app.game.attempt_select(1);
        app.tick(Duration::from_millis(100));

        assert!(screen_text(&app).contains("2.9"));
    }

    #[test]
    fn test_tick_rate_constant() {
        assert_eq!(
            Duration::from_millis(TICK_RATE_MS),
            GameConfig::default().tick
        );
    }
}
