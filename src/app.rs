use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::config::{Config, ConfigStore};
use crate::input::InputBox;
use crate::loader::{QuoteDelivery, QuoteLoader};
use crate::quote::{Quote, QuoteError};
use crate::runtime::AppEvent;
use crate::session::{Phase, Session, TargetText};
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// waiting for the quote source
    Loading,
    /// the last fetch failed; holds the reason
    Unavailable(String),
    Typing,
    Results,
}

pub struct App {
    pub config: Config,
    pub state: AppState,
    pub quote: Option<Quote>,
    pub session: Option<Session>,
    pub input: InputBox,
    pub spinner_frame: usize,
    pub should_quit: bool,
    loader: QuoteLoader,
    config_store: Option<Box<dyn ConfigStore>>,
}

impl App {
    /// Build the app and kick off the first quote fetch
    pub fn new(config: Config, loader: QuoteLoader) -> Self {
        let mut app = Self {
            config,
            state: AppState::Loading,
            quote: None,
            session: None,
            input: InputBox::new(),
            spinner_frame: 0,
            should_quit: false,
            loader,
            config_store: None,
        };
        app.loader.request();
        app
    }

    /// Persist theme changes through `store`
    pub fn with_config_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    /// Live accuracy of the running test
    pub fn accuracy(&self) -> u8 {
        self.session.as_ref().map_or(100, Session::accuracy)
    }

    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => {
                if self.state == AppState::Loading {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }
            AppEvent::Resize => {}
            AppEvent::Quote(delivery) => self.on_quote(delivery),
            AppEvent::Key(key) => self.on_key(key),
        }
    }

    /// Drop the current test and fetch a fresh quote
    pub fn reset(&mut self) {
        self.session = None;
        self.quote = None;
        self.input.clear();
        self.spinner_frame = 0;
        self.state = AppState::Loading;
        self.loader.request();
    }

    pub fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggled();
        // only the theme is written back; CLI overrides stay out of the file
        if let Some(store) = &self.config_store {
            let mut stored = store.load();
            stored.theme = self.config.theme;
            if let Err(e) = store.save(&stored) {
                warn!(error = %e, "could not save theme");
            }
        }
    }

    fn on_quote(&mut self, delivery: QuoteDelivery) {
        let Some(outcome) = self.loader.accept(delivery) else {
            return;
        };

        match outcome.and_then(|mut quote| {
            // tab is bound to the theme toggle and can never be typed
            quote.content = quote.content.replace('\t', " ");
            let target = TargetText::new(quote.content.clone())
                .map_err(|_| QuoteError::Empty)?;
            Ok((quote, target))
        }) {
            Ok((quote, target)) => {
                info!(author = %quote.author, len = target.len(), "quote ready");
                self.session = Some(Session::new(target));
                self.quote = Some(quote);
                self.input.clear();
                self.state = AppState::Typing;
            }
            Err(e) => {
                self.state = AppState::Unavailable(e.to_string());
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('r') if ctrl => {
                self.reset();
                return;
            }
            KeyCode::Tab => {
                self.toggle_theme();
                return;
            }
            _ => {}
        }

        match self.state {
            AppState::Typing => self.on_typing_key(key),
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Char('n') | KeyCode::Enter => self.reset(),
                KeyCode::Char('t') => self.toggle_theme(),
                _ => {}
            },
            AppState::Unavailable(_) => {
                if matches!(key.code, KeyCode::Char('r') | KeyCode::Enter) {
                    self.reset();
                }
            }
            AppState::Loading => {}
        }
    }

    fn on_typing_key(&mut self, key: KeyEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !self.input.apply_key(key) {
            return;
        }

        if session.on_input(self.input.as_str()) == Phase::Finished {
            if let Some(result) = session.result() {
                info!(
                    wpm = result.wpm,
                    accuracy = result.accuracy,
                    time = result.time,
                    "test finished"
                );
            }
            self.state = AppState::Results;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfigStore;
    use crate::quote::StaticQuoteSource;
    use assert_matches::assert_matches;
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    fn app_with(quote: Quote) -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let loader = QuoteLoader::new(Arc::new(StaticQuoteSource::new(quote)), tx);
        (App::new(Config::default(), loader), rx)
    }

    fn pump_quote(app: &mut App, rx: &mpsc::Receiver<AppEvent>) {
        let ev = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_matches!(ev, AppEvent::Quote(_));
        app.on_event(ev);
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_starts_loading_then_typing() {
        let (mut app, rx) = app_with(Quote::new("hi there", "me"));
        assert_eq!(app.state, AppState::Loading);
        assert!(app.session.is_none());

        pump_quote(&mut app, &rx);
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.quote.as_ref().unwrap().author, "me");
        assert_eq!(app.accuracy(), 100);
    }

    #[test]
    fn test_keys_ignored_while_loading() {
        let (mut app, _rx) = app_with(Quote::new("hi", "me"));
        type_str(&mut app, "hi");
        assert_eq!(app.input.as_str(), "");
        assert_eq!(app.state, AppState::Loading);
    }

    #[test]
    fn test_typing_to_results() {
        let (mut app, rx) = app_with(Quote::new("cat", "me"));
        pump_quote(&mut app, &rx);

        type_str(&mut app, "cx");
        assert_eq!(app.accuracy(), 50);
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "at");

        assert_eq!(app.state, AppState::Results);
        let result = app.session.as_ref().unwrap().result().unwrap();
        assert_eq!(result.accuracy, 75);
    }

    #[test]
    fn test_results_ignore_typing() {
        let (mut app, rx) = app_with(Quote::new("ab", "me"));
        pump_quote(&mut app, &rx);
        type_str(&mut app, "ab");
        assert_eq!(app.state, AppState::Results);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.input.as_str(), "ab");
        assert_eq!(app.state, AppState::Results);
    }

    #[test]
    fn test_reset_from_results_loads_new_session() {
        let (mut app, rx) = app_with(Quote::new("ab", "me"));
        pump_quote(&mut app, &rx);
        type_str(&mut app, "ab");

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::Loading);
        assert!(app.session.is_none());
        assert_eq!(app.input.as_str(), "");

        pump_quote(&mut app, &rx);
        assert_eq!(app.state, AppState::Typing);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.state().total_keystrokes(), 0);
        assert_eq!(session.phase(), Phase::NotStarted);
    }

    #[test]
    fn test_stale_quote_does_not_replace_target() {
        let (mut app, _rx) = app_with(Quote::new("ab", "me"));
        // a second request supersedes the first
        app.reset();

        app.on_event(AppEvent::Quote(QuoteDelivery {
            generation: 1,
            outcome: Ok(Quote::new("stale", "old")),
        }));
        assert_eq!(app.state, AppState::Loading);
        assert!(app.quote.is_none());

        app.on_event(AppEvent::Quote(QuoteDelivery {
            generation: 2,
            outcome: Ok(Quote::new("fresh", "new")),
        }));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.quote.as_ref().unwrap().content, "fresh");

        // arriving after the active target is set changes nothing
        app.on_event(AppEvent::Quote(QuoteDelivery {
            generation: 1,
            outcome: Ok(Quote::new("stale", "old")),
        }));
        assert_eq!(app.quote.as_ref().unwrap().content, "fresh");
    }

    #[test]
    fn test_failed_fetch_is_unavailable_until_retry() {
        let (mut app, _rx) = app_with(Quote::new("ab", "me"));
        app.on_event(AppEvent::Quote(QuoteDelivery {
            generation: 1,
            outcome: Err(QuoteError::Http("offline".into())),
        }));
        assert_matches!(app.state, AppState::Unavailable(ref reason) if reason.contains("offline"));

        // no automatic retry on ticks
        app.on_event(AppEvent::Tick);
        assert_matches!(app.state, AppState::Unavailable(_));

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.state, AppState::Loading);
    }

    #[test]
    fn test_tabs_in_quote_are_typed_as_spaces() {
        let (mut app, rx) = app_with(Quote::new("a\tb", "me"));
        pump_quote(&mut app, &rx);
        assert_eq!(app.quote.as_ref().unwrap().content, "a b");

        type_str(&mut app, "a b");
        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.session.as_ref().unwrap().result().unwrap().accuracy, 100);
    }

    #[test]
    fn test_empty_quote_is_unavailable() {
        let (mut app, rx) = app_with(Quote::new("", "me"));
        pump_quote(&mut app, &rx);
        assert_matches!(app.state, AppState::Unavailable(_));
        assert!(app.session.is_none());
    }

    #[test]
    fn test_spinner_advances_only_while_loading() {
        let (mut app, rx) = app_with(Quote::new("ab", "me"));
        app.on_event(AppEvent::Tick);
        app.on_event(AppEvent::Tick);
        assert_eq!(app.spinner_frame, 2);

        pump_quote(&mut app, &rx);
        app.on_event(AppEvent::Tick);
        assert_eq!(app.spinner_frame, 2);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _rx) = app_with(Quote::new("ab", "me"));
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);

        let (mut app, _rx) = app_with(Quote::new("ab", "me"));
        app.on_event(AppEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_toggles_theme_without_touching_session() {
        let (mut app, rx) = app_with(Quote::new("abc", "me"));
        pump_quote(&mut app, &rx);
        type_str(&mut app, "a");

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.theme(), Theme::Light);
        assert_eq!(app.input.as_str(), "a");
        assert_eq!(app.session.as_ref().unwrap().state().total_keystrokes(), 1);
    }

    #[test]
    fn test_theme_toggle_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let (app, _rx) = app_with(Quote::new("ab", "me"));
        let mut app = app.with_config_store(Box::new(FileConfigStore::with_path(&path)));

        app.toggle_theme();

        assert_eq!(FileConfigStore::with_path(&path).load().theme, Theme::Light);
    }
}
