use std::time::Duration;

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::debug;
use ureq::Agent;

use crate::config::Config;

static QUOTES_DIR: Dir = include_dir!("src/quotes");
const BUNDLED_QUOTES_FILE: &str = "quotes.json";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub content: String,
    pub author: String,
}

impl Quote {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
        }
    }

    /// Reject quotes that would leave nothing to type.
    fn validated(self) -> Result<Self, QuoteError> {
        if self.content.trim().is_empty() {
            return Err(QuoteError::Empty);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("quote has no content")]
    Empty,
}

/// Anything that can hand out a quote to type.
///
/// Fetches may block; callers run them off the UI thread.
pub trait QuoteSource: Send + Sync {
    fn fetch(&self) -> Result<Quote, QuoteError>;
}

/// quotable-style JSON endpoint
#[derive(Clone)]
pub struct HttpQuoteSource {
    agent: Agent,
    endpoint: String,
    min_length: usize,
    max_length: usize,
}

impl HttpQuoteSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.into(),
            min_length: crate::config::DEFAULT_MIN_LENGTH,
            max_length: crate::config::DEFAULT_MAX_LENGTH,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.endpoint.clone(), Duration::from_secs(cfg.timeout_secs))
            .with_length_bounds(cfg.min_length, cfg.max_length)
    }

    pub fn with_length_bounds(mut self, min_length: usize, max_length: usize) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }
}

impl QuoteSource for HttpQuoteSource {
    fn fetch(&self) -> Result<Quote, QuoteError> {
        debug!(endpoint = %self.endpoint, "requesting quote");
        let body = self
            .agent
            .get(self.endpoint.as_str())
            .query("minLength", self.min_length.to_string())
            .query("maxLength", self.max_length.to_string())
            .call()
            .map_err(|e| QuoteError::Http(format!("{}: {e}", self.endpoint)))?
            .into_body()
            .read_to_string()
            .map_err(|e| QuoteError::Http(format!("{}: {e}", self.endpoint)))?;
        parse_quote(&body)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuoteBody {
    One(Quote),
    Many(Vec<Quote>),
}

/// Parse an endpoint response: a single quote object, or an array whose
/// first element is used. Extra fields are ignored.
pub fn parse_quote(json: &str) -> Result<Quote, QuoteError> {
    let body: QuoteBody =
        serde_json::from_str(json).map_err(|e| QuoteError::Parse(format!("quote JSON: {e}")))?;
    let quote = match body {
        QuoteBody::One(quote) => quote,
        QuoteBody::Many(quotes) => quotes
            .into_iter()
            .next()
            .ok_or_else(|| QuoteError::Parse("empty quote list".to_string()))?,
    };
    quote.validated()
}

/// Quotes compiled into the binary, for playing offline.
#[derive(Debug, Clone)]
pub struct BundledQuoteSource {
    quotes: Vec<Quote>,
}

impl BundledQuoteSource {
    pub fn new() -> Result<Self, QuoteError> {
        let file = QUOTES_DIR
            .get_file(BUNDLED_QUOTES_FILE)
            .ok_or_else(|| QuoteError::Parse(format!("{BUNDLED_QUOTES_FILE} not bundled")))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| QuoteError::Parse(format!("{BUNDLED_QUOTES_FILE} is not UTF-8")))?;
        let quotes: Vec<Quote> = serde_json::from_str(text)
            .map_err(|e| QuoteError::Parse(format!("{BUNDLED_QUOTES_FILE}: {e}")))?;
        Ok(Self { quotes })
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }
}

impl QuoteSource for BundledQuoteSource {
    fn fetch(&self) -> Result<Quote, QuoteError> {
        let quote = self
            .quotes
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(QuoteError::Empty)?;
        quote.validated()
    }
}

/// Always hands out the same quote
#[derive(Debug, Clone)]
pub struct StaticQuoteSource {
    quote: Quote,
}

impl StaticQuoteSource {
    pub fn new(quote: Quote) -> Self {
        Self { quote }
    }
}

impl QuoteSource for StaticQuoteSource {
    fn fetch(&self) -> Result<Quote, QuoteError> {
        self.quote.clone().validated()
    }
}
