mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keytempo::{
    api::ApiClient,
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    engine::LiveSession,
    history::{
        CsvStatisticsSource, HttpStatisticsSource, ResultLog, StatisticsReport, StatisticsSource,
    },
    logging,
    notification::{Notifications, ToastKind},
    report::{CsvReporter, HttpReporter, ResultReporter, Submission},
    runtime::{
        AppEvent, AppEventSource, CrosstermEventSource, Debouncer, FixedTicker, Runner, Ticker,
    },
    session::SessionResult,
    text::{
        Difficulty, FallbackTextProvider, HttpTextProvider, Language, LoadedText,
        LocalTextGenerator, TextProvider, TextSource,
    },
    timer::ThreadTickScheduler,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::{mpsc::Sender, Arc},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;

const FALLBACK_TEXT_MESSAGE: &str = "Failed to load text, using local version";

/// terminal typing speed test with live accuracy and history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test: live speed and accuracy while you type, results saved to a typing-test server (or a local log with --offline), and your history charted."
)]
pub struct Cli {
    /// language of the practice text
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// difficulty of the practice text
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// base url of the typing-test server
    #[clap(long)]
    api_url: Option<String>,

    /// no server: generated texts, results kept in a local csv log
    #[clap(long)]
    offline: bool,

    /// custom prompt to use
    #[clap(short = 'p', long, value_parser = parse_prompt)]
    prompt: Option<String>,

    /// how long typing must pause before the input is measured, in milliseconds
    #[clap(long)]
    debounce_ms: Option<u64>,

    /// log level used when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    log_level: String,
}

fn parse_prompt(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("prompt must contain something to type".to_string());
    }
    Ok(value.to_string())
}

impl Cli {
    /// Stored config with this run's flags applied on top
    fn apply(&self, mut config: Config) -> Config {
        if let Some(language) = self.language {
            config.language = language;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if self.offline {
            config.offline = true;
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Loading,
    Typing,
    Results,
    Statistics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatisticsView {
    Idle,
    Loading,
    Loaded(Box<StatisticsReport>),
    Failed(String),
}

/// Where texts come from and where results go
pub struct Services {
    text: Arc<FallbackTextProvider<Box<dyn TextProvider>>>,
    reporter: Arc<dyn ResultReporter>,
    statistics: Arc<dyn StatisticsSource>,
    /// server the web statistics page lives on; `None` offline
    web_base: Option<String>,
}

impl Services {
    pub fn from_config(config: &Config) -> keytempo::Result<Self> {
        if config.offline {
            return Ok(Self::offline(ResultLog::new(AppDirs::results_path())));
        }

        let api = ApiClient::new(config.api_url.clone())?;
        let provider: Box<dyn TextProvider> = Box::new(HttpTextProvider::new(api.clone()));
        Ok(Self {
            text: Arc::new(FallbackTextProvider::new(provider)),
            reporter: Arc::new(HttpReporter::new(api.clone())),
            statistics: Arc::new(HttpStatisticsSource::new(api.clone())),
            web_base: Some(api.base_url().to_string()),
        })
    }

    pub fn offline(log: ResultLog) -> Self {
        let provider: Box<dyn TextProvider> = Box::new(LocalTextGenerator);
        Self {
            text: Arc::new(FallbackTextProvider::new(provider)),
            reporter: Arc::new(CsvReporter::new(log.clone())),
            statistics: Arc::new(CsvStatisticsSource::new(log)),
            web_base: None,
        }
    }
}

pub struct App {
    pub state: AppState,
    pub session: LiveSession,
    pub config: Config,
    /// the line being typed; reaches the session through the debouncer
    pub input: String,
    pub text_source: TextSource,
    pub notifications: Notifications,
    pub statistics: StatisticsView,
    custom_prompt: Option<String>,
    debouncer: Debouncer<String>,
    text_request: u64,
    services: Services,
    store: Box<dyn ConfigStore>,
    tx: Sender<AppEvent>,
}

impl App {
    pub fn new(
        config: Config,
        custom_prompt: Option<String>,
        services: Services,
        store: Box<dyn ConfigStore>,
        tx: Sender<AppEvent>,
    ) -> Self {
        let session = LiveSession::new(
            "",
            config.session_config(),
            SystemClock,
            ThreadTickScheduler::new(tx.clone()),
        );
        let mut app = Self {
            state: AppState::Loading,
            session,
            debouncer: Debouncer::new(config.debounce()),
            config,
            input: String::new(),
            text_source: TextSource::Provider,
            notifications: Notifications::default(),
            statistics: StatisticsView::Idle,
            custom_prompt,
            text_request: 0,
            services,
            store,
            tx,
        };
        app.new_text();
        app
    }

    /// Start over with a fresh text from the provider (or the custom prompt)
    pub fn new_text(&mut self) {
        self.text_request += 1;
        self.clear_input();
        // cancels a running timer straight away, even before the text arrives
        self.session.reset("", self.config.session_config());

        if let Some(prompt) = self.custom_prompt.clone() {
            self.start_text(LoadedText {
                text: prompt,
                source: TextSource::Custom,
            });
            return;
        }

        self.state = AppState::Loading;
        let request = self.text_request;
        let provider = Arc::clone(&self.services.text);
        let (language, difficulty) = (self.config.language, self.config.difficulty);
        let tx = self.tx.clone();
        debug!(request, %language, %difficulty, "requesting text");

        thread::spawn(move || {
            let text = provider.load(language, difficulty);
            if tx.send(AppEvent::TextLoaded { request, text }).is_err() {
                debug!(request, "app gone before text arrived");
            }
        });
    }

    /// Start over with the same text
    pub fn restart(&mut self) {
        let text = self.session.reference_text();
        if text.is_empty() {
            self.new_text();
            return;
        }
        self.text_request += 1;
        self.clear_input();
        self.session.reset(&text, self.config.session_config());
        self.state = AppState::Typing;
    }

    pub fn toggle_language(&mut self) {
        self.config.language = self.config.language.toggled();
        let language = self.config.language;
        self.persist(|stored| stored.language = language);
        info!(%language, "language changed");
        self.new_text();
    }

    pub fn cycle_difficulty(&mut self) {
        self.config.difficulty = self.config.difficulty.next();
        let difficulty = self.config.difficulty;
        self.persist(|stored| stored.difficulty = difficulty);
        info!(%difficulty, "difficulty changed");
        self.new_text();
    }

    /// When a pending input edit becomes due, if any
    pub fn input_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Option<ExitType> {
        let exit = match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize | AppEvent::Tick => None,
            AppEvent::SessionTick { generation } => {
                self.session.on_tick(generation);
                None
            }
            AppEvent::TextLoaded { request, text } => {
                if request == self.text_request {
                    self.start_text(text);
                } else {
                    debug!(request, current = self.text_request, "stale text dropped");
                }
                None
            }
            AppEvent::ReportFinished(outcome) => {
                self.on_report_finished(outcome);
                None
            }
            AppEvent::StatisticsLoaded(outcome) => {
                self.statistics = match outcome {
                    Ok(report) => StatisticsView::Loaded(Box::new(report)),
                    Err(message) => StatisticsView::Failed(message),
                };
                None
            }
        };

        let now = SystemClock.now();
        if let Some(value) = self.debouncer.poll(now) {
            self.apply_input(&value);
        }
        self.notifications.prune(now);
        exit
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<ExitType> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        // ctrl+c to quit
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
            return Some(ExitType::Quit);
        }

        match self.state {
            AppState::Loading => None,
            AppState::Typing => match key.code {
                KeyCode::Tab => Some(ExitType::New),
                KeyCode::Char('l') if ctrl => {
                    self.toggle_language();
                    None
                }
                KeyCode::Char('d') if ctrl => {
                    self.cycle_difficulty();
                    None
                }
                KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                    self.type_char(c);
                    None
                }
                KeyCode::Backspace => {
                    self.backspace();
                    None
                }
                _ => None,
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') => Some(ExitType::Restart),
                KeyCode::Char('n') | KeyCode::Tab => Some(ExitType::New),
                KeyCode::Char('s') => {
                    self.show_statistics();
                    None
                }
                KeyCode::Char('l') => {
                    self.toggle_language();
                    None
                }
                KeyCode::Char('d') => {
                    self.cycle_difficulty();
                    None
                }
                KeyCode::Char('o') => {
                    self.open_web_statistics();
                    None
                }
                _ => None,
            },
            AppState::Statistics => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => {
                    self.state = AppState::Results;
                    None
                }
                KeyCode::Char('r') => Some(ExitType::Restart),
                KeyCode::Char('n') => Some(ExitType::New),
                KeyCode::Char('o') => {
                    self.open_web_statistics();
                    None
                }
                _ => None,
            },
        }
    }

    fn type_char(&mut self, c: char) {
        if !self.session.state().accepts_input() {
            return;
        }
        if self.input.chars().count() >= self.session.reference().len() {
            return;
        }
        self.input.push(c);
        self.debouncer.push(self.input.clone(), SystemClock.now());
        // the final char completes the session without waiting out the window
        if self.input.chars().count() == self.session.reference().len() {
            if let Some(value) = self.debouncer.flush() {
                self.apply_input(&value);
            }
        }
    }

    fn backspace(&mut self) {
        if !self.session.state().accepts_input() || self.input.pop().is_none() {
            return;
        }
        self.debouncer.push(self.input.clone(), SystemClock.now());
    }

    fn apply_input(&mut self, value: &str) {
        if let Some(result) = self.session.on_input(value) {
            self.finish(result);
        }
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.debouncer.clear();
    }

    fn start_text(&mut self, loaded: LoadedText) {
        if let TextSource::Fallback { reason } = &loaded.source {
            warn!(%reason, "using local text");
            self.notifications
                .push(ToastKind::Error, FALLBACK_TEXT_MESSAGE, SystemClock.now());
        }
        self.session.reset(&loaded.text, self.config.session_config());
        self.text_source = loaded.source;
        self.state = AppState::Typing;
    }

    fn finish(&mut self, result: SessionResult) {
        self.state = AppState::Results;
        self.debouncer.clear();
        self.statistics = StatisticsView::Idle;

        let reporter = Arc::clone(&self.services.reporter);
        let user_id = self.config.user_id.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = reporter
                .submit(&result, user_id.as_deref())
                .map_err(|err| {
                    error!(error = %err, "saving result failed");
                    err.short_message()
                });
            if tx.send(AppEvent::ReportFinished(outcome)).is_err() {
                debug!("app gone before result was saved");
            }
        });
    }

    fn on_report_finished(&mut self, outcome: Result<Submission, String>) {
        let now = SystemClock.now();
        match outcome {
            Ok(submission) => {
                if self.config.user_id.as_deref() != Some(submission.user_id.as_str()) {
                    let user_id = submission.user_id.clone();
                    self.config.user_id = Some(user_id.clone());
                    self.persist(|stored| stored.user_id = Some(user_id));
                }
                self.notifications.push(ToastKind::Success, "Result saved", now);
            }
            Err(message) => {
                self.notifications.push(
                    ToastKind::Error,
                    format!("Failed to save result: {message}"),
                    now,
                );
            }
        }
    }

    fn show_statistics(&mut self) {
        self.state = AppState::Statistics;
        let Some(user_id) = self.config.user_id.clone() else {
            self.statistics = StatisticsView::Failed("no results saved yet".to_string());
            return;
        };

        self.statistics = StatisticsView::Loading;
        let source = Arc::clone(&self.services.statistics);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let outcome = source.load(&user_id).map_err(|err| {
                warn!(error = %err, "statistics unavailable");
                err.short_message()
            });
            if tx.send(AppEvent::StatisticsLoaded(outcome)).is_err() {
                debug!("app gone before statistics arrived");
            }
        });
    }

    pub fn web_statistics_url(&self) -> Option<String> {
        match (&self.services.web_base, &self.config.user_id) {
            (Some(base), Some(user_id)) => Some(format!("{base}/statistics/{user_id}")),
            _ => None,
        }
    }

    fn open_web_statistics(&mut self) {
        let now = SystemClock.now();
        let Some(url) = self.web_statistics_url() else {
            self.notifications
                .push(ToastKind::Info, "No web statistics available", now);
            return;
        };
        if !Browser::is_available() {
            self.notifications.push(ToastKind::Info, url, now);
            return;
        }
        if let Err(err) = webbrowser::open(&url) {
            warn!(%url, error = %err, "could not open browser");
            self.notifications
                .push(ToastKind::Error, "Could not open browser", now);
        }
    }

    /// Write a change to the stored config, leaving this run's flag overrides out of it
    fn persist<F: FnOnce(&mut Config)>(&self, change: F) {
        let mut stored = self.store.load();
        change(&mut stored);
        if let Err(err) = self.store.save(&stored) {
            warn!(error = %err, "could not save config");
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = logging::init(&AppDirs::log_dir(), &cli.log_level)?;

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    info!(
        language = %config.language,
        difficulty = %config.difficulty,
        offline = config.offline,
        api_url = %config.api_url,
        "starting"
    );
    let services = Services::from_config(&config)?;

    let events = CrosstermEventSource::new();
    let mut app = App::new(
        config,
        cli.prompt.clone(),
        services,
        Box::new(store),
        events.sender(),
    );
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    info!("bye");
    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitType {
    Restart,
    New,
    Quit,
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        match app.handle_event(runner.step_until(app.input_deadline())) {
            Some(ExitType::Restart) => app.restart(),
            Some(ExitType::New) => app.new_text(),
            Some(ExitType::Quit) => break,
            None => {}
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    ui::screen::current_screen(&app.state).render(app, f);
    f.render_widget(ui::ToastOverlay(&app.notifications), f.area());
}
