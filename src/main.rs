mod app;
mod config;
mod schedule;
mod theme;
mod ui;
mod widgets;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use config::AppConfig;
use schedule::TokioScheduler;
use widgets::lottery::{split_names, Lottery};

#[derive(Parser, Debug)]
#[command(name = "timedraw")]
#[command(version)]
#[command(about = "A terminal countdown timer and name lottery")]
struct Args {
    /// Countdown hours preset
    #[arg(long, value_name = "N")]
    hours: Option<u64>,

    /// Countdown minutes preset (0-59)
    #[arg(long, value_name = "N")]
    minutes: Option<u64>,

    /// Countdown seconds preset (0-59)
    #[arg(long, value_name = "N")]
    seconds: Option<u64>,

    /// Names for the lottery pool, separated by commas or new lines
    #[arg(short, long, value_name = "LIST")]
    names: Option<String>,

    /// Seed the draw order for reproducible results
    #[arg(long)]
    seed: Option<u64>,

    /// Draw N names without the TUI and print the result as JSON
    #[arg(short, long, value_name = "N")]
    draw: Option<usize>,

    /// Config file (default: <config dir>/timedraw/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_file.as_deref())?;

    let mut config = AppConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let picker = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    // Handle CLI-only commands
    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    if let Some(count) = args.draw {
        return print_draw(&config, picker, count);
    }

    // Run TUI
    run_tui(&config, picker)
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Could not open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(filter)
                .init();
        }
    }
    Ok(())
}

/// Command line values win over the config file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(hours) = args.hours {
        config.timer.hours = hours;
    }
    if let Some(minutes) = args.minutes {
        config.timer.minutes = minutes;
    }
    if let Some(seconds) = args.seconds {
        config.timer.seconds = seconds;
    }
    if let Some(ref names) = args.names {
        config.lottery.names = split_names(names);
    }
}

fn print_draw(config: &AppConfig, picker: StdRng, count: usize) -> Result<()> {
    let output = draw_report(config, picker, count);
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

/// Draw up to `count` names from the configured group, stopping early once it is exhausted
fn draw_report(config: &AppConfig, picker: StdRng, count: usize) -> serde_json::Value {
    let mut lottery = Lottery::new(picker);
    for name in &config.lottery.names {
        lottery.add_single(name);
    }

    let mut drawn = Vec::new();
    for _ in 0..count {
        match lottery.draw_now() {
            Some(name) => drawn.push(name.to_string()),
            None => break,
        }
    }

    serde_json::json!({
        "drawn": drawn,
        "remaining": lottery.pool(),
        "all_drawn": lottery.all_drawn(),
    })
}

fn run_tui(config: &AppConfig, picker: StdRng) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Scheduled ticks come back to this thread as wakeups
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = TokioScheduler::new(Handle::current(), tx);
    let mut app = App::new(config, picker, Box::new(scheduler), rx);

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None && !app.captures_text() => {
                            return Ok(())
                        }
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => app.handle_key(key),
                    }
                }
            }
        }

        // Apply ticks and draw results that arrived meanwhile
        app.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::collections::HashSet;

    fn report(names: &str, count: usize) -> Value {
        let mut config = AppConfig::default();
        config.lottery.names = split_names(names);
        draw_report(&config, StdRng::seed_from_u64(1), count)
    }

    fn names(value: &Value) -> Vec<String> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_draw_report_partial() {
        let output = report("A,B,C", 2);
        let drawn = names(&output["drawn"]);
        let remaining = names(&output["remaining"]);

        assert_eq!(drawn.len(), 2);
        assert_eq!(remaining.len(), 1);
        assert!(!remaining.iter().any(|n| drawn.contains(n)));
        assert_eq!(output["all_drawn"], false);
    }

    #[test]
    fn test_draw_report_whole_group() {
        let output = report("A,B,C", 3);
        let drawn: HashSet<_> = names(&output["drawn"]).into_iter().collect();

        assert_eq!(drawn, HashSet::from(["A".to_string(), "B".to_string(), "C".to_string()]));
        assert!(names(&output["remaining"]).is_empty());
        assert_eq!(output["all_drawn"], true);
    }

    #[test]
    fn test_draw_report_past_exhaustion_has_no_repeats() {
        let output = report("A,B", 4);
        let drawn = names(&output["drawn"]);
        let unique: HashSet<_> = drawn.iter().collect();

        assert_eq!(drawn.len(), 2);
        assert_eq!(unique.len(), 2);
        assert!(names(&output["remaining"]).is_empty());
        assert_eq!(output["all_drawn"], true);
    }

    #[test]
    fn test_draw_report_empty_group() {
        let output = report("", 3);
        assert!(names(&output["drawn"]).is_empty());
        assert_eq!(output["all_drawn"], false);
    }

    #[test]
    fn test_names_override_config() {
        let args = Args::parse_from(["timedraw", "--names", "Ann, Ben", "--minutes", "5"]);
        let mut config = AppConfig::default();
        config.lottery.names = vec!["Zed".into()];
        apply_overrides(&mut config, &args);

        assert_eq!(config.lottery.names, ["Ann", "Ben"]);
        assert_eq!(config.timer.minutes, 5);
    }
}
