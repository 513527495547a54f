//! # Profiling
//!
//! With the `profiling` feature enabled, entity churn, component type
//! registration and command application emit `tracing` events and spans.
//! Nothing is printed until a subscriber is installed:
//!
//! ```toml
//! [dependencies]
//! lite_ecs = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! ```ignore
//! // Keep the guard alive for as long as events should be flushed
//! let _guard = lite_ecs::profiling::init_file_tracing("ecs_trace.log")?;
//! ```
//!
//! Or to stdout, filtered through `RUST_LOG`:
//!
//! ```ignore
//! lite_ecs::profiling::init_stdout_tracing();
//! ```
//!
//! Both installers leave an already installed global subscriber in place.

#[cfg(feature = "profiling")]
pub use self::subscriber::{init_file_tracing, init_stdout_tracing};

#[cfg(feature = "profiling")]
mod subscriber {
    use std::fs::File;
    use std::path::Path;

    use tracing::Level;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_subscriber::EnvFilter;

    use crate::error::Result;

    /// Write every event at TRACE and above to `path` through a background
    /// writer. The returned guard flushes pending lines when dropped.
    pub fn init_file_tracing(path: impl AsRef<Path>) -> Result<WorkerGuard> {
        let file = File::create(path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        let _ = tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_max_level(Level::TRACE)
            .try_init();

        Ok(guard)
    }

    /// Print events to stdout, filtered by `RUST_LOG`
    pub fn init_stdout_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }
}
