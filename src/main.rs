use std::io::{stdout, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use ascii_tv::error::PipelineError;
use ascii_tv::frame::{self, AsciiFrame};
use ascii_tv::pipeline::converter::{self, Backend, ConverterConfig};
use ascii_tv::pipeline::extractor::Extractor;
use ascii_tv::pipeline::queue::{self, Item, StopSignal};
use ascii_tv::render::ansi::AnsiRenderer;
use ascii_tv::render::screen_color::ScreenColorRenderer;
use ascii_tv::render::screen_mono::ScreenMonoRenderer;
use ascii_tv::{audio, calibration, logging};

/// Play a video in the terminal as live ASCII art, with synchronized audio.
#[derive(Parser)]
struct Args {
    /// The video file to play.
    video_path: String,
    /// Target width, in characters, of the rendered frame.
    width: u32,

    /// Target frame rate to pull from the source.
    #[arg(long, default_value_t = 10)]
    fps: u32,
    /// Frames drawn from raw_queue per converter dispatch.
    #[arg(long, default_value_t = 1)]
    batch_size: usize,
    /// Accepted for compatibility; a no-op in a free-threaded runtime.
    #[arg(long, default_value_t = false)]
    use_threads: bool,
    /// Use the screen-library renderer instead of direct ANSI writes.
    #[arg(long, default_value_t = false)]
    use_curses: bool,
    /// With --use-curses: render ColorCells instead of plain monochrome text.
    #[arg(long, default_value_t = false, requires = "use_curses")]
    curses_color: bool,
    /// Log once-per-second FPS lines.
    #[arg(long, default_value_t = false)]
    log_fps: bool,
    /// Log per-frame conversion/render timing.
    #[arg(long, default_value_t = false)]
    log_performance: bool,
    /// Use xterm-256 colors instead of 24-bit truecolor in the ANSI backend.
    #[arg(long, default_value_t = false)]
    ansi256: bool,
    /// Seconds to wait for the source to report its capabilities.
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init();

    gstreamer::init().context("failed to initialize gstreamer")?;

    let uri = to_uri(&args.video_path)?;
    let timeout = Duration::from_secs(args.timeout);

    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.set()).context("failed to install interrupt handler")?;
    }

    let extractor = match Extractor::open(&uri, timeout) {
        Ok(extractor) => extractor,
        Err(e) => {
            tracing::error!("source open failed: {e}");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let first_frame = extractor.pull_one();
    let (raw_w, raw_h) = first_frame
        .as_ref()
        .map(|f| (f.width, f.height))
        .unwrap_or((args.width, args.width));

    {
        let mut out = stdout();
        let calib_height = calibration::calibration_height(raw_w, raw_h, args.width as usize);
        calibration::show_calibration(&mut out, args.width as usize, calib_height)
            .context("calibration screen failed")?;
    }

    let backend = if !args.use_curses {
        Backend::AnsiText
    } else if args.curses_color {
        Backend::ColorCells
    } else {
        Backend::PlainText
    };

    let converter_config = ConverterConfig {
        target_width: args.width,
        backend,
        ansi256: args.ansi256,
    };

    let (raw_tx, raw_rx) = queue::raw_queue(args.fps);
    let (ascii_tx, ascii_rx) = queue::ascii_queue(args.fps);

    let audio = audio::AudioPlayer::open(&uri, timeout)
        .map_err(|e| tracing::warn!("audio init failed, continuing silent: {e}"))
        .ok();
    let audio_pipeline = audio.as_ref().and_then(|player| match player.play() {
        Ok(pipeline) => Some(pipeline),
        Err(e) => {
            tracing::warn!("audio playback failed to start, continuing silent: {e}");
            None
        }
    });

    let extractor_handle = extractor.spawn(args.fps, raw_tx, stop.clone(), first_frame);
    let dispatcher_handle =
        converter::spawn_dispatcher(raw_rx, ascii_tx, converter_config, args.batch_size, stop.clone());

    let result = run_renderer(
        &ascii_rx,
        backend,
        args.fps,
        args.log_fps,
        args.log_performance,
        &stop,
        audio.as_ref(),
    );

    // Reverse-of-creation teardown: renderer has already exited above, then
    // the converter dispatcher, then the extractor, then the queues drop.
    stop.set();
    let _ = dispatcher_handle.join();
    let _ = extractor_handle.join();
    if let Some(pipeline) = audio_pipeline {
        let _ = gstreamer::prelude::GstObjectExt::set_state(&pipeline, gstreamer::State::Null);
    }

    result?;
    println!("[done] playback complete.");
    Ok(())
}

fn run_renderer(
    ascii_rx: &queue::AsciiReceiver,
    backend: Backend,
    fps: u32,
    log_fps: bool,
    log_performance: bool,
    stop: &StopSignal,
    audio: Option<&audio::AudioPlayer>,
) -> Result<(), PipelineError> {
    match backend {
        Backend::AnsiText => {
            let mut renderer = AnsiRenderer::new(stdout());
            let outcome = run_ansi(&mut renderer, ascii_rx, fps, log_fps, log_performance, stop, audio);
            let _ = renderer.shutdown();
            outcome
        }
        Backend::PlainText => run_screen_mono(ascii_rx, fps, log_fps, log_performance, stop, audio),
        Backend::ColorCells => run_screen_color(ascii_rx, fps, log_fps, log_performance, stop, audio),
    }
}

fn run_ansi(
    renderer: &mut AnsiRenderer<impl Write>,
    ascii_rx: &queue::AsciiReceiver,
    fps: u32,
    log_fps: bool,
    log_performance: bool,
    stop: &StopSignal,
    audio: Option<&audio::AudioPlayer>,
) -> Result<(), PipelineError> {
    render_loop(ascii_rx, stop, fps, log_fps, log_performance, audio, "ansi", |item| {
        let rows = match &item.frame {
            AsciiFrame::PlainText(rows) | AsciiFrame::AnsiText(rows) => rows,
            AsciiFrame::ColorCells(_) => unreachable!("ansi backend never produces ColorCells"),
        };
        renderer.render(rows).ok().map(|_| rows.len())
    })
}

fn run_screen_mono(
    ascii_rx: &queue::AsciiReceiver,
    fps: u32,
    log_fps: bool,
    log_performance: bool,
    stop: &StopSignal,
    audio: Option<&audio::AudioPlayer>,
) -> Result<(), PipelineError> {
    let mut renderer =
        ScreenMonoRenderer::new(stdout().lock()).map_err(|e| PipelineError::TerminalSetup(e.to_string()))?;

    let outcome = render_loop(ascii_rx, stop, fps, log_fps, log_performance, audio, "screen-mono", |item| {
        let AsciiFrame::PlainText(rows) = &item.frame else {
            unreachable!("screen-mono backend only produces PlainText");
        };
        let _ = renderer.render(rows, stop);
        None
    });

    let _ = renderer.shutdown();
    outcome
}

fn run_screen_color(
    ascii_rx: &queue::AsciiReceiver,
    fps: u32,
    log_fps: bool,
    log_performance: bool,
    stop: &StopSignal,
    audio: Option<&audio::AudioPlayer>,
) -> Result<(), PipelineError> {
    let mut renderer =
        ScreenColorRenderer::new(stdout().lock()).map_err(|e| PipelineError::TerminalSetup(e.to_string()))?;

    let outcome = render_loop(ascii_rx, stop, fps, log_fps, log_performance, audio, "screen-color", |item| {
        let AsciiFrame::ColorCells(rows) = &item.frame else {
            unreachable!("screen-color backend only produces ColorCells");
        };
        let _ = renderer.render(rows, stop);
        None
    });

    let _ = renderer.shutdown();
    outcome
}

/// Shared drain loop: polls `ascii_queue` with a 5 ms timeout, feeds each
/// item to `paint`, sends the renderer's estimated playback wall time to
/// `audio` as a sync hint once per painted frame, and logs an FPS line
/// once a second when `log_fps` is set.
fn render_loop(
    ascii_rx: &queue::AsciiReceiver,
    stop: &StopSignal,
    fps: u32,
    log_fps: bool,
    log_performance: bool,
    audio: Option<&audio::AudioPlayer>,
    backend_name: &str,
    mut paint: impl FnMut(&frame::AsciiItem) -> Option<usize>,
) -> Result<(), PipelineError> {
    let mut frame_no: u64 = 0;
    let mut fps_count: u32 = 0;
    let mut fps_window = std::time::Instant::now();

    while !stop.is_set() {
        match ascii_rx.recv_timeout(Duration::from_millis(5)) {
            Ok(Item::Frame(item)) => {
                let render_start = std::time::Instant::now();
                frame_no += 1;
                let changed_lines = paint(&item);
                let rendering_ms = render_start.elapsed().as_secs_f64() * 1000.0;
                if log_performance {
                    logging::log_frame_performance(frame_no, item.conversion_ms, rendering_ms, changed_lines);
                }

                if let Some(audio) = audio {
                    audio.update_video_time(frame_no as f64 / fps.max(1) as f64);
                }

                fps_count += 1;
                if log_fps && fps_window.elapsed() >= Duration::from_secs(1) {
                    logging::log_fps(backend_name, fps_count as f64 / fps_window.elapsed().as_secs_f64());
                    fps_count = 0;
                    fps_window = std::time::Instant::now();
                }
            }
            Ok(Item::Eos) => break,
            Err(_) => continue, // Timed out; re-check the stop flag and keyboard.
        }
    }

    Ok(())
}

fn to_uri(path: &str) -> Result<String> {
    if path.contains("://") {
        return Ok(path.to_string());
    }
    let canonical = PathBuf::from(path)
        .canonicalize()
        .with_context(|| format!("video path not found: {path}"))?;
    Ok(format!("file://{}", canonical.display()))
}
