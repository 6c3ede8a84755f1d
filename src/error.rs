//! Fatal error taxonomy. Non-fatal categories (mid-stream read failure,
//! audio init/device errors, per-cell terminal write failure) never leave
//! their owning stage — they're logged and swallowed there, not modeled
//! as variants here. Frame conversion itself is pure, infallible math (a
//! resize, a luminance average, two table lookups), so it has no variant
//! either — there is nowhere in that path a `Result` could come from.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open video source: {0}")]
    SourceOpen(String),

    #[error("terminal setup failed: {0}")]
    TerminalSetup(String),
}
