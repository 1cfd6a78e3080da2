// Library surface for headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod input;
pub mod loader;
pub mod logging;
pub mod quote;
pub mod runtime;
pub mod session;
pub mod theme;
pub mod ui;

/// Interval between ticks driving the loading spinner and redraws
pub const TICK_RATE_MS: u64 = 100;
