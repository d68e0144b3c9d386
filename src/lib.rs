// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod api;
pub mod app_dirs;
pub mod classify;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod notification;
pub mod report;
pub mod runtime;
pub mod session;
pub mod text;
pub mod time_series;
pub mod timer;
pub mod util;

pub use engine::{LiveSession, RenderSink, TypingSession};
pub use error::{Error, Result};
