//! Pulls decoded BGR frames from the video source at a target rate and
//! pushes them to `raw_queue`, terminated by a single EOS marker.
//!
//! Finds the appsink by walking the playbin's video-sink element down
//! through its ghost pad to the parent bin (pad → ghost pad → parent bin →
//! `by_name("app_sink")`), then pulls synchronously: `appsink.pull_sample()`
//! is called from this thread, and the send onto the bounded queue blocks,
//! so a slow consumer applies real backpressure instead of silently
//! dropping frames.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use gstreamer as gst;
use gstreamer_app::AppSink;
use gst::prelude::*;

use crate::error::PipelineError;
use crate::frame::RawFrame;
use crate::pipeline::queue::{Item, RawSender, StopSignal};

pub struct Extractor {
    source: gst::Bin,
    sink: AppSink,
}

impl Extractor {
    /// Opens the source and blocks (up to `timeout`) for the decoder to
    /// report its native resolution via caps negotiation.
    pub fn open(uri: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let pipeline_desc = format!(
            "playbin uri=\"{uri}\" video-sink=\"videoconvert \
             ! videoscale \
             ! appsink name=app_sink caps=video/x-raw,format=BGR sync=false\""
        );

        let source = gst::parse_launch(&pipeline_desc)
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?;
        let source = source
            .downcast::<gst::Bin>()
            .map_err(|_| PipelineError::SourceOpen("playbin did not downcast to a Bin".into()))?;

        let video_sink: gst::Element = source
            .property::<Option<gst::Element>>("video-sink")
            .ok_or_else(|| PipelineError::SourceOpen("playbin has no video-sink".into()))?;
        let pad = video_sink
            .pads()
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::SourceOpen("video-sink has no pads".into()))?;
        let pad = pad
            .dynamic_cast::<gst::GhostPad>()
            .map_err(|_| PipelineError::SourceOpen("video-sink pad is not a ghost pad".into()))?;
        let bin = pad
            .parent_element()
            .and_then(|e| e.downcast::<gst::Bin>().ok())
            .ok_or_else(|| PipelineError::SourceOpen("ghost pad has no parent bin".into()))?;

        let sink = bin
            .by_name("app_sink")
            .and_then(|e| e.downcast::<AppSink>().ok())
            .ok_or_else(|| PipelineError::SourceOpen("no app_sink element in pipeline".into()))?;

        source
            .set_state(gst::State::Playing)
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?;
        source
            .state(gst::ClockTime::from_seconds(timeout.as_secs()))
            .0
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?;

        Ok(Self { source, sink })
    }

    /// Pulls a single sample synchronously, outside the pull-loop thread —
    /// used by the orchestrator to learn the source's native resolution
    /// (for the calibration screen) before the steady-state loop starts.
    pub fn pull_one(&self) -> Option<RawFrame> {
        let sample = self.sink.pull_sample().ok()?;
        Self::sample_to_frame(&sample)
    }

    /// Spawns the pull loop on a dedicated thread, pacing reads at `1/fps`
    /// and pushing onto `tx` until EOS, a read failure, or `stop` is set.
    /// `initial`, if present, is sent first — the frame `pull_one` already
    /// consumed from the appsink before the loop started.
    pub fn spawn(self, fps: u32, tx: RawSender, stop: StopSignal, initial: Option<RawFrame>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);

            if let Some(frame) = initial {
                if tx.send(Item::Frame(frame)).is_err() {
                    let _ = tx.send(Item::Eos);
                    let _ = self.source.set_state(gst::State::Null);
                    return;
                }
            }

            loop {
                if stop.is_set() {
                    break;
                }

                let tick = Instant::now();

                let sample = match self.sink.pull_sample() {
                    Ok(sample) => sample,
                    Err(_) => break, // EOS or the pipeline stopped producing.
                };

                let frame = match Self::sample_to_frame(&sample) {
                    Some(frame) => frame,
                    None => {
                        tracing::warn!("dropping unreadable sample mid-stream");
                        continue;
                    }
                };

                if tx.send(Item::Frame(frame)).is_err() {
                    break; // Consumer side gone; nothing left to feed.
                }

                let elapsed = tick.elapsed();
                if elapsed < period {
                    std::thread::sleep(period - elapsed);
                }
            }

            let _ = tx.send(Item::Eos);
            let _ = self.source.set_state(gst::State::Null);
        })
    }

    fn sample_to_frame(sample: &gst::Sample) -> Option<RawFrame> {
        let buffer = sample.buffer()?;
        let map = buffer.map_readable().ok()?;
        let caps = sample.caps()?;
        let s = caps.structure(0)?;
        let width = s.get::<i32>("width").ok()? as u32;
        let height = s.get::<i32>("height").ok()? as u32;

        Some(RawFrame::new(width, height, map.to_vec()))
    }
}
