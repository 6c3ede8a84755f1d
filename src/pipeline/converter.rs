//! Shared pixel→ASCII front end, the three back ends, and the batch
//! dispatcher + fixed-size worker pool that drains `raw_queue`.
//!
//! Bilinear resize, BGR→RGB, integer luminance, and the glyph/palette
//! lookups all live in one shared sampling step so the three back ends
//! never duplicate the per-pixel math. The worker pool is sized off
//! `num_cpus::get()` and uses `crossbeam-channel` as its internal work
//! queue, the same crate used for `raw_queue`/`ascii_queue`.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::charset::{cube_index, glyph_for_luma, luminance};
use crate::color::{Colorize, Truecolor, Xterm256};
use crate::frame::{AsciiFrame, AsciiItem, ColorCell, RawFrame};
use crate::pipeline::queue::{AsciiSender, Item, RawReceiver, StopSignal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    PlainText,
    AnsiText,
    ColorCells,
}

#[derive(Clone, Copy, Debug)]
pub struct ConverterConfig {
    pub target_width: u32,
    pub backend: Backend,
    pub ansi256: bool,
}

/// `new_height = max(1, floor(H/W * new_width * 0.5))`.
fn ascii_height(raw_width: u32, raw_height: u32, new_width: usize) -> usize {
    let ratio = raw_height as f64 / raw_width as f64;
    ((ratio * new_width as f64 * 0.5).floor() as usize).max(1)
}

/// Bilinear-sampled RGB at ascii cell `(nx, ny)` of a `new_width x new_height` grid.
fn sample_bilinear(raw: &RawFrame, nx: usize, ny: usize, new_width: usize, new_height: usize) -> (u8, u8, u8) {
    let src_x = (nx as f64 + 0.5) * raw.width as f64 / new_width as f64 - 0.5;
    let src_y = (ny as f64 + 0.5) * raw.height as f64 / new_height as f64 - 0.5;

    let x0 = src_x.floor().max(0.0) as usize;
    let y0 = src_y.floor().max(0.0) as usize;
    let x1 = (x0 + 1).min(raw.width as usize - 1);
    let y1 = (y0 + 1).min(raw.height as usize - 1);
    let fx = (src_x - x0 as f64).clamp(0.0, 1.0);
    let fy = (src_y - y0 as f64).clamp(0.0, 1.0);

    // BGR source, read out as RGB.
    let px = |x: usize, y: usize| -> (f64, f64, f64) {
        let idx = (y * raw.width as usize + x) * 3;
        (raw.data[idx + 2] as f64, raw.data[idx + 1] as f64, raw.data[idx] as f64)
    };
    let (r00, g00, b00) = px(x0, y0);
    let (r10, g10, b10) = px(x1, y0);
    let (r01, g01, b01) = px(x0, y1);
    let (r11, g11, b11) = px(x1, y1);

    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
    let r = lerp(lerp(r00, r10, fx), lerp(r01, r11, fx), fy);
    let g = lerp(lerp(g00, g10, fx), lerp(g01, g11, fx), fy);
    let b = lerp(lerp(b00, b10, fx), lerp(b01, b11, fx), fy);

    (
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    )
}

pub fn convert_frame(raw: &RawFrame, config: ConverterConfig) -> AsciiFrame {
    let new_width = (config.target_width.max(1)) as usize;
    let new_height = ascii_height(raw.width, raw.height, new_width);

    match config.backend {
        Backend::PlainText => AsciiFrame::PlainText(render_plain(raw, new_width, new_height)),
        Backend::AnsiText => AsciiFrame::AnsiText(render_ansi(raw, new_width, new_height, config.ansi256)),
        Backend::ColorCells => AsciiFrame::ColorCells(render_cells(raw, new_width, new_height)),
    }
}

fn render_plain(raw: &RawFrame, new_width: usize, new_height: usize) -> Vec<String> {
    (0..new_height)
        .map(|ny| {
            (0..new_width)
                .map(|nx| {
                    let (r, g, b) = sample_bilinear(raw, nx, ny, new_width, new_height);
                    glyph_for_luma(luminance(r, g, b)) as char
                })
                .collect()
        })
        .collect()
}

fn render_ansi(raw: &RawFrame, new_width: usize, new_height: usize, ansi256: bool) -> Vec<String> {
    (0..new_height)
        .map(|ny| {
            let mut line = Vec::with_capacity(new_width * 18);
            for nx in 0..new_width {
                let (r, g, b) = sample_bilinear(raw, nx, ny, new_width, new_height);
                let glyph = glyph_for_luma(luminance(r, g, b));
                if ansi256 {
                    Xterm256::write_cell(&mut line, [r, g, b], glyph).expect("write to Vec never fails");
                } else {
                    Truecolor::write_cell(&mut line, [r, g, b], glyph).expect("write to Vec never fails");
                }
            }
            String::from_utf8(line).expect("only ASCII glyphs and escapes are written")
        })
        .collect()
}

fn render_cells(raw: &RawFrame, new_width: usize, new_height: usize) -> Vec<Vec<ColorCell>> {
    (0..new_height)
        .map(|ny| {
            (0..new_width)
                .map(|nx| {
                    let (r, g, b) = sample_bilinear(raw, nx, ny, new_width, new_height);
                    ColorCell {
                        glyph: glyph_for_luma(luminance(r, g, b)) as char,
                        palette: cube_index(r, g, b),
                    }
                })
                .collect()
        })
        .collect()
}

struct Job {
    index: usize,
    frame: RawFrame,
}

struct JobResult {
    index: usize,
    ascii: AsciiFrame,
}

struct WorkerPool {
    job_tx: Sender<Job>,
    result_rx: Receiver<JobResult>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Each worker polls its job queue against `stop` at the same cadence
    /// the dispatcher polls `raw_queue`, so a stop request reaches every
    /// worker thread directly rather than relying on the job channel
    /// disconnecting as a side effect of `join` dropping the sender.
    fn new(config: ConverterConfig, stop: StopSignal) -> Self {
        let workers = num_cpus::get().max(1);
        let (job_tx, job_rx) = unbounded::<Job>();
        let (result_tx, result_rx) = unbounded::<JobResult>();

        let handles = (0..workers)
            .map(|_| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let stop = stop.clone();
                std::thread::spawn(move || {
                    while !stop.is_set() {
                        match job_rx.recv_timeout(BATCH_POLL_BUDGET) {
                            Ok(job) => {
                                let ascii = convert_frame(&job.frame, config);
                                if result_tx.send(JobResult { index: job.index, ascii }).is_err() {
                                    break;
                                }
                            }
                            Err(RecvTimeoutError::Timeout) => continue,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                })
            })
            .collect();

        Self { job_tx, result_rx, handles }
    }

    fn submit(&self, job: Job) {
        let _ = self.job_tx.send(job);
    }

    fn recv(&self) -> Option<JobResult> {
        self.result_rx.recv().ok()
    }

    /// Drops the job sender, so any worker still waiting on a fresh job
    /// sees the channel disconnect immediately rather than waiting out its
    /// poll budget, then joins every worker thread before returning.
    fn join(self) {
        drop(self.job_tx);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

const BATCH_POLL_BUDGET: Duration = Duration::from_millis(10);

/// Drains `raw_queue` in batches of up to `batch_size`, never waiting more
/// than one 10 ms poll per attempt to fill a batch, dispatches the batch to
/// the worker pool, and re-assembles results in input order before pushing
/// `(AsciiFrame, mean_conversion_ms)` onto `ascii_queue`.
pub fn spawn_dispatcher(
    raw_rx: RawReceiver,
    ascii_tx: AsciiSender,
    config: ConverterConfig,
    batch_size: usize,
    stop: StopSignal,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let pool = WorkerPool::new(config, stop.clone());
        let batch_size = batch_size.max(1);

        'outer: loop {
            if stop.is_set() {
                break;
            }

            let mut batch = Vec::with_capacity(batch_size);
            let mut eos = false;
            let deadline = Instant::now() + BATCH_POLL_BUDGET;

            while batch.len() < batch_size {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match raw_rx.recv_timeout(remaining) {
                    Ok(Item::Frame(frame)) => batch.push(frame),
                    Ok(Item::Eos) => {
                        eos = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            if batch.is_empty() {
                if eos {
                    break;
                }
                continue;
            }

            let batch_len = batch.len();
            let start = Instant::now();
            for (index, frame) in batch.into_iter().enumerate() {
                pool.submit(Job { index, frame });
            }

            let mut results: Vec<Option<AsciiFrame>> = (0..batch_len).map(|_| None).collect();
            for _ in 0..batch_len {
                match pool.recv() {
                    Some(JobResult { index, ascii }) => results[index] = Some(ascii),
                    None => break 'outer, // Worker pool gone — fatal, abort.
                }
            }

            let conversion_ms = start.elapsed().as_secs_f64() * 1000.0 / batch_len as f64;

            for ascii in results.into_iter().flatten() {
                if ascii_tx
                    .send(Item::Frame(AsciiItem { frame: ascii, conversion_ms }))
                    .is_err()
                {
                    break 'outer;
                }
            }

            if eos {
                break;
            }
        }

        stop.set();
        pool.join();
        let _ = ascii_tx.send(Item::Eos);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: u32, h: u32, bgr: [u8; 3]) -> RawFrame {
        let mut data = Vec::with_capacity(w as usize * h as usize * 3);
        for _ in 0..(w * h) {
            data.extend_from_slice(&bgr);
        }
        RawFrame::new(w, h, data)
    }

    #[test]
    fn ascii_height_matches_the_formula() {
        assert_eq!(ascii_height(4, 2, 4), 1);
        assert_eq!(ascii_height(2, 4, 2), 2);
        assert_eq!(ascii_height(100, 1, 4), 1); // clamped to at least 1
    }

    #[test]
    fn solid_gray_frame_converts_with_consistent_formulas() {
        let raw = solid_frame(2, 2, [128, 128, 128]);
        let config = ConverterConfig { target_width: 2, backend: Backend::ColorCells, ansi256: false };
        let AsciiFrame::ColorCells(rows) = convert_frame(&raw, config) else {
            panic!("expected ColorCells");
        };
        assert_eq!(rows.len(), 1);
        for cell in &rows[0] {
            assert_eq!(cell.palette, cube_index(128, 128, 128));
        }
    }

    #[test]
    fn plain_text_rows_are_equal_width() {
        let raw = solid_frame(8, 4, [10, 200, 60]);
        let config = ConverterConfig { target_width: 6, backend: Backend::PlainText, ansi256: false };
        let AsciiFrame::PlainText(rows) = convert_frame(&raw, config) else {
            panic!("expected PlainText");
        };
        assert!(rows.iter().all(|row| row.chars().count() == 6));
    }

    #[test]
    fn ansi_text_has_no_reset_leaks() {
        let raw = solid_frame(2, 2, [1, 2, 3]);
        let config = ConverterConfig { target_width: 2, backend: Backend::AnsiText, ansi256: false };
        let AsciiFrame::AnsiText(rows) = convert_frame(&raw, config) else {
            panic!("expected AnsiText");
        };
        for row in rows {
            assert_eq!(row.matches("\x1b[0m").count(), 2);
        }
    }
}
