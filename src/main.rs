mod event;
mod ui;

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use keytrain::config::{Config, MAX_LINE_LENGTH, MIN_LINE_LENGTH};
use keytrain::generator::registry::StrategyRegistry;
use keytrain::session::{
    ExerciseDescriptor, LimitType, SessionController, SessionError, SessionEvent, SessionState,
};
use keytrain::store::JsonStore;

use event::InputForwarder;
use ui::session_view::SessionView;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LimitArg {
    None,
    Chars,
    Time,
}

impl From<LimitArg> for LimitType {
    fn from(arg: LimitArg) -> Self {
        match arg {
            LimitArg::None => LimitType::None,
            LimitArg::Chars => LimitType::Chars,
            LimitArg::Time => LimitType::Time,
        }
    }
}

#[derive(Parser)]
#[command(name = "keytrain", version, about = "Typing practice with adaptive text generation")]
struct Cli {
    #[arg(short, long, help = "Exercise description file (TOML)")]
    exercise: Option<PathBuf>,

    #[arg(short, long, default_value = "adapt_rand_lang", help = "Strategy key")]
    strategy: String,

    #[arg(
        short,
        long,
        default_value = "chars=abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.,?",
        help = "Strategy parameter, e.g. \"chars=asdf\""
    )]
    param: String,

    #[arg(short, long, value_enum, default_value = "chars", help = "When the session ends")]
    limit: LimitArg,

    #[arg(short, long, default_value_t = 300, help = "Chars or seconds, depending on --limit")]
    units: u32,

    #[arg(long, help = "Maximum line length")]
    line_length: Option<usize>,

    #[arg(long, help = "List available strategies and exit")]
    list_strategies: bool,
}

fn load_exercise(cli: &Cli) -> Result<ExerciseDescriptor> {
    match &cli.exercise {
        Some(path) => read_exercise(path),
        None => Ok(ExerciseDescriptor::new(0, cli.strategy.clone(), cli.strategy.clone())
            .with_param(cli.param.clone())
            .with_limit(cli.limit.into(), cli.units)),
    }
}

fn read_exercise(path: &Path) -> Result<ExerciseDescriptor> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn list_strategies(registry: &StrategyRegistry) -> Result<()> {
    for key in registry.available() {
        println!("{key:<20} {}", registry.description(key)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("error")).init();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(len) = cli.line_length {
        config.max_line_length = len;
    }
    config.validate();
    if cli.line_length.is_some_and(|len| len != config.max_line_length) {
        eprintln!("Line length clamped to {MIN_LINE_LENGTH}..={MAX_LINE_LENGTH}");
    }

    let mut registry = StrategyRegistry::new();
    registry.scan_dir(Path::new(&config.strategies_dir));
    if cli.list_strategies {
        return list_strategies(&registry);
    }

    let exercise = load_exercise(&cli)?;
    let store = JsonStore::with_base_dir(PathBuf::from(&config.data_dir))?;
    let mut session = match SessionController::from_registry(
        exercise,
        &registry,
        &config.source_context(),
        Box::new(store),
        config.max_line_length,
    ) {
        Ok(session) => session,
        Err(SessionError::Source(e)) if e.is_missing_resource() => {
            bail!("Content for this exercise is not available: {e}")
        }
        Err(e) => return Err(e.into()),
    };

    let last_wrong = Rc::new(Cell::new(false));
    let flag = Rc::clone(&last_wrong);
    session.add_listener(move |event: &SessionEvent| match event {
        SessionEvent::Typed { correct, .. } => flag.set(!correct),
        SessionEvent::NewLine { .. } => flag.set(false),
        SessionEvent::StateChanged(_) => {}
    });
    session.ready()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut input = InputForwarder::spawn(session.signal_sender(), Duration::from_millis(50));
    let outcome = run_session(&mut terminal, &mut session, &last_wrong);
    input.stop();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome?;
    print_summary(&session, &config)
}

fn run_session(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut SessionController,
    last_wrong: &Cell<bool>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            frame.render_widget(SessionView::new(session, last_wrong.get()), frame.area())
        })?;
        if session.state().is_terminal() {
            return Ok(());
        }
        session.wait_signal(Duration::from_millis(200))?;
    }
}

fn print_summary(session: &SessionController, config: &Config) -> Result<()> {
    if session.state() == SessionState::UserStopped {
        println!("Session cancelled.");
        return Ok(());
    }
    let Some(result) = session.result() else {
        return Ok(());
    };
    println!(
        "{:.0} cpm ({:.0} wpm), {:.1}% accuracy in {:.1}s",
        result.cpm(),
        result.wpm(),
        result.accuracy(),
        result.required_time_ms as f64 / 1000.0
    );
    let weakest: Vec<String> = session
        .stats()
        .weakest(5)
        .into_iter()
        .map(|(ch, rate)| format!("{ch:?} {rate}"))
        .collect();
    if !weakest.is_empty() {
        println!("Weakest keys: {}", weakest.join(", "));
    }
    if let Some(err) = session.persist_error() {
        eprintln!("Result was not saved: {err}");
        return Ok(());
    }

    let history = JsonStore::with_base_dir(PathBuf::from(&config.data_dir))?
        .sessions_for(result.exercise_id, 5);
    if history.len() > 1 {
        println!("Recent sessions:");
        for record in history {
            let r = record.result();
            println!(
                "  {}  {:.0} cpm  {:.1}%",
                record.finished_at.format("%Y-%m-%d %H:%M"),
                r.cpm(),
                r.accuracy()
            );
        }
    }
    Ok(())
}
