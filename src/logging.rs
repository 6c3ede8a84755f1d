//! File logging with the exact `"<iso> - <message>"` line shape, plus the
//! gated per-frame/per-second message families.
//!
//! Built on `tracing` + `tracing-appender` the way a non-blocking file
//! writer is normally wired up in this codebase's neighborhood, but with a
//! custom [`FormatEvent`] swapped in for tracing's default bracketed
//! formatter — the target line format predates tracing entirely and has
//! its own consumers that expect it unchanged.

use std::fmt;
use std::path::Path;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const LOG_FILE_NAME: &str = "ascii_video.log";

pub struct IsoDashMessage;

impl<S, N> FormatEvent<S, N> for IsoDashMessage
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        write!(writer, "{now} - ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Truncates any log left over from a previous run, then installs the
/// global subscriber. Returns the `tracing_appender` guard — the caller
/// must keep it alive for the process lifetime or buffered lines are lost.
pub fn init() -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE_NAME);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .event_format(IsoDashMessage)
        .try_init();

    guard
}

/// `Frame <n> - Conversion: <ms> ms, Total Rendering: <ms> ms[, Changed lines: <k>]`
pub fn log_frame_performance(
    frame_no: u64,
    conversion_ms: f64,
    rendering_ms: f64,
    changed_lines: Option<usize>,
) {
    match changed_lines {
        Some(k) => tracing::info!(
            "Frame {frame_no} - Conversion: {conversion_ms:.2} ms, Total Rendering: {rendering_ms:.2} ms, Changed lines: {k}"
        ),
        None => tracing::info!(
            "Frame {frame_no} - Conversion: {conversion_ms:.2} ms, Total Rendering: {rendering_ms:.2} ms"
        ),
    }
}

/// `[LOG] FPS display (<backend>): <value>`
pub fn log_fps(backend: &str, fps: f64) {
    tracing::info!("[LOG] FPS display ({backend}): {fps:.2}");
}
