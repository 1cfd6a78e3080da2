use std::{
    error::Error,
    io::{self, stdin},
    sync::Arc,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};

use quotype::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    loader::QuoteLoader,
    logging,
    quote::{BundledQuoteSource, HttpQuoteSource, Quote, QuoteError, QuoteSource, StaticQuoteSource},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    theme::Theme,
    ui, TICK_RATE_MS,
};

/// typing speed test against random quotes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed test in the terminal. Fetches a random quote, highlights every character as you type it and reports words per minute, accuracy and time."
)]
pub struct Cli {
    /// quote endpoint returning JSON with `content` and `author`
    #[clap(short = 'e', long)]
    endpoint: Option<String>,

    /// minimum quote length requested from the endpoint
    #[clap(long)]
    min_length: Option<usize>,

    /// maximum quote length requested from the endpoint
    #[clap(long)]
    max_length: Option<usize>,

    /// seconds before a quote request gives up
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// use the quotes bundled with the binary instead of the network
    #[clap(long)]
    offline: bool,

    /// custom text to type instead of a fetched quote
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// author shown under a custom prompt
    #[clap(short = 'a', long, default_value = "you", requires = "prompt")]
    author: String,

    /// color theme
    #[clap(short = 't', long, value_enum)]
    theme: Option<Theme>,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint = endpoint.clone();
        }
        if let Some(min_length) = self.min_length {
            cfg.min_length = min_length;
        }
        if let Some(max_length) = self.max_length {
            cfg.max_length = max_length;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            cfg.timeout_secs = timeout_secs;
        }
        if let Some(theme) = self.theme {
            cfg.theme = theme;
        }
        cfg
    }

    fn quote_source(&self, cfg: &Config) -> Result<Arc<dyn QuoteSource>, QuoteError> {
        if let Some(prompt) = &self.prompt {
            return Ok(Arc::new(StaticQuoteSource::new(Quote::new(
                prompt.clone(),
                self.author.clone(),
            ))));
        }
        if self.offline {
            return Ok(Arc::new(BundledQuoteSource::new()?));
        }
        Ok(Arc::new(HttpQuoteSource::from_config(cfg)))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    // logging is best effort; the test still runs without it
    let _log_guard = logging::init_tracing(&AppDirs::log_dir()).ok();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if config.min_length > config.max_length {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::ArgumentConflict,
            "--min-length must not exceed --max-length",
        )
        .exit();
    }

    info!(endpoint = %config.endpoint, offline = cli.offline, "starting");

    let source = cli.quote_source(&config)?;
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let loader = QuoteLoader::new(source, runner.sender());
    let mut app = App::new(config, loader).with_config_store(Box::new(store));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = outcome {
        error!(error = %e, "tui loop failed");
    }
    outcome
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        app.on_event(runner.step());
        if app.should_quit {
            break;
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["quotype"]);

        assert_eq!(cli.endpoint, None);
        assert_eq!(cli.min_length, None);
        assert_eq!(cli.prompt, None);
        assert_eq!(cli.author, "you");
        assert!(!cli.offline);
        assert_eq!(cli.theme, None);
    }

    #[test]
    fn test_cli_custom_prompt() {
        let cli = Cli::parse_from(["quotype", "-p", "hello world", "-a", "Grace"]);
        assert_eq!(cli.prompt, Some("hello world".to_string()));
        assert_eq!(cli.author, "Grace");

        let source = cli.quote_source(&Config::default()).unwrap();
        assert_eq!(source.fetch().unwrap(), Quote::new("hello world", "Grace"));
    }

    #[test]
    fn test_cli_author_requires_prompt() {
        assert!(Cli::try_parse_from(["quotype", "--author", "Grace"]).is_err());
    }

    #[test]
    fn test_cli_theme() {
        let cli = Cli::parse_from(["quotype", "--theme", "light"]);
        assert_eq!(cli.theme, Some(Theme::Light));

        assert!(Cli::try_parse_from(["quotype", "--theme", "sepia"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "quotype",
            "--endpoint",
            "http://localhost:1234/q",
            "--min-length",
            "10",
            "--max-length",
            "50",
            "--timeout-secs",
            "2",
            "-t",
            "light",
        ]);
        let cfg = cli.apply(Config::default());

        assert_eq!(cfg.endpoint, "http://localhost:1234/q");
        assert_eq!(cfg.min_length, 10);
        assert_eq!(cfg.max_length, 50);
        assert_eq!(cfg.timeout_secs, 2);
        assert_eq!(cfg.theme, Theme::Light);
    }

    #[test]
    fn test_cli_without_overrides_keeps_config() {
        let stored = Config {
            theme: Theme::Light,
            min_length: 42,
            ..Config::default()
        };
        let cfg = Cli::parse_from(["quotype"]).apply(stored.clone());
        assert_eq!(cfg, stored);
    }

    #[test]
    fn test_cli_offline_uses_bundled_quotes() {
        let cli = Cli::parse_from(["quotype", "--offline"]);
        let source = cli.quote_source(&Config::default()).unwrap();

        let quote = source.fetch().unwrap();
        assert!(BundledQuoteSource::new().unwrap().quotes().contains(&quote));
    }

    #[test]
    fn test_cli_prompt_wins_over_offline() {
        let cli = Cli::parse_from(["quotype", "--offline", "-p", "abc"]);
        let source = cli.quote_source(&Config::default()).unwrap();
        assert_matches!(source.fetch(), Ok(q) if q.content == "abc");
    }
}
