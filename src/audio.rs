//! One-shot PCM extraction, callback-driven playback, and the drift-
//! correcting sync-hint queue.
//!
//! Rather than pulling in `cpal`/`rodio`, the player stays inside the
//! GStreamer family the video decoder already depends on. Extraction reuses
//! the same appsink-pull construction retargeted at an audio pad; playback
//! drives an `appsrc`'s `need-data` signal, which fires on GStreamer's own
//! streaming thread — a callback contract handed to us for free, without a
//! thread this crate has to spawn and join itself.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_app::{AppSink, AppSrc};

use crate::error::PipelineError;

const DEFAULT_TOLERANCE: Duration = Duration::from_millis(100);

pub struct AudioPlayer {
    pcm: Arc<Vec<f32>>,
    sample_rate: u32,
    channels: u16,
    audio_time: Arc<Mutex<f64>>,
    sync_tx: Sender<f64>,
    sync_rx: Receiver<f64>,
    tolerance: f64,
}

impl AudioPlayer {
    /// Decodes the source's audio track, fully, into an interleaved `f32`
    /// PCM buffer. This buffer is immutable for the rest of the player's
    /// life — only `audio_time` and the sync queue change after this point.
    pub fn open(uri: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let (pcm, sample_rate, channels) = Self::extract_pcm(uri, timeout)?;
        let (sync_tx, sync_rx) = bounded(1);

        Ok(Self {
            pcm: Arc::new(pcm),
            sample_rate,
            channels,
            audio_time: Arc::new(Mutex::new(0.0)),
            sync_tx,
            sync_rx,
            tolerance: DEFAULT_TOLERANCE.as_secs_f64(),
        })
    }

    fn extract_pcm(uri: &str, timeout: Duration) -> Result<(Vec<f32>, u32, u16), PipelineError> {
        let desc = format!(
            "uridecodebin uri=\"{uri}\" ! audioconvert ! audioresample \
             ! appsink name=app_sink caps=audio/x-raw,format=F32LE"
        );
        let pipeline = gst::parse_launch(&desc)
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?
            .downcast::<gst::Bin>()
            .map_err(|_| PipelineError::SourceOpen("audio pipeline did not downcast to a Bin".into()))?;

        let sink = pipeline
            .by_name("app_sink")
            .and_then(|e| e.downcast::<AppSink>().ok())
            .ok_or_else(|| PipelineError::SourceOpen("no app_sink element in audio pipeline".into()))?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?;
        pipeline
            .state(gst::ClockTime::from_seconds(timeout.as_secs()))
            .0
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?;

        let mut pcm = Vec::new();
        let mut sample_rate = 48_000u32;
        let mut channels = 2u16;

        while let Ok(sample) = sink.pull_sample() {
            if let Some(s) = sample.caps().and_then(|c| c.structure(0).cloned()) {
                sample_rate = s.get::<i32>("rate").unwrap_or(sample_rate as i32) as u32;
                channels = s.get::<i32>("channels").unwrap_or(channels as i32) as u16;
            }
            if let Some(buffer) = sample.buffer() {
                if let Ok(map) = buffer.map_readable() {
                    pcm.extend(
                        map.as_slice()
                            .chunks_exact(4)
                            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
                    );
                }
            }
        }

        let _ = pipeline.set_state(gst::State::Null);
        Ok((pcm, sample_rate, channels))
    }

    /// Enqueues a `set_time(t)` hint only when the clocks have drifted past
    /// tolerance — the non-blocking behavior the audio callback requires.
    pub fn update_video_time(&self, t: f64) {
        let audio_time = *self.audio_time.lock().unwrap();
        if (audio_time - t).abs() > self.tolerance {
            let _ = self.sync_tx.try_send(t);
        }
    }

    /// Builds and starts the `appsrc` playback pipeline, wiring `need-data`
    /// to the drift-correcting callback. Returns the pipeline so the caller
    /// can `set_state(Null)` on shutdown; playback itself runs off
    /// GStreamer's own streaming thread from here on.
    pub fn play(&self) -> Result<gst::Bin, PipelineError> {
        let desc = format!(
            "appsrc name=src format=time caps=audio/x-raw,format=F32LE,rate={},channels={},layout=interleaved \
             ! audioconvert ! autoaudiosink",
            self.sample_rate, self.channels
        );
        let pipeline = gst::parse_launch(&desc)
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?
            .downcast::<gst::Bin>()
            .map_err(|_| PipelineError::SourceOpen("audio playback pipeline did not downcast to a Bin".into()))?;

        let appsrc = pipeline
            .by_name("src")
            .and_then(|e| e.downcast::<AppSrc>().ok())
            .ok_or_else(|| PipelineError::SourceOpen("no appsrc element in playback pipeline".into()))?;

        let pcm = self.pcm.clone();
        let sample_rate = self.sample_rate;
        let channels = self.channels.max(1) as usize;
        let audio_time = self.audio_time.clone();
        let sync_rx = self.sync_rx.clone();
        let tolerance = self.tolerance;

        appsrc.set_callbacks(
            gst_app::AppSrcCallbacks::builder()
                .need_data(move |appsrc, n_frames| {
                    let mut t = audio_time.lock().unwrap();

                    while let Ok(hint) = sync_rx.try_recv() {
                        if (*t - hint).abs() > tolerance {
                            *t = hint;
                        }
                    }

                    let start = (*t * sample_rate as f64).floor() as usize * channels;
                    let want = n_frames as usize * channels;
                    let mut samples = vec![0f32; want];
                    let mut eos = false;

                    if start >= pcm.len() {
                        eos = true;
                    } else {
                        let end = (start + want).min(pcm.len());
                        samples[..end - start].copy_from_slice(&pcm[start..end]);
                        if end - start < want {
                            eos = true;
                        }
                    }

                    *t += n_frames as f64 / sample_rate as f64;
                    drop(t);

                    if let Ok(mut buffer) = gst::Buffer::with_size(samples.len() * 4) {
                        if let Some(buffer_mut) = buffer.get_mut() {
                            if let Ok(mut map) = buffer_mut.map_writable() {
                                for (dst, sample) in map.as_mut_slice().chunks_exact_mut(4).zip(samples.iter()) {
                                    dst.copy_from_slice(&sample.to_le_bytes());
                                }
                            }
                        }
                        let _ = appsrc.push_buffer(buffer);
                    }

                    if eos {
                        let _ = appsrc.end_of_stream();
                    }
                })
                .build(),
        );

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| PipelineError::SourceOpen(e.to_string()))?;

        Ok(pipeline)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_with_pcm(pcm: Vec<f32>, sample_rate: u32, channels: u16) -> AudioPlayer {
        let (sync_tx, sync_rx) = bounded(1);
        AudioPlayer {
            pcm: Arc::new(pcm),
            sample_rate,
            channels,
            audio_time: Arc::new(Mutex::new(0.0)),
            sync_tx,
            sync_rx,
            tolerance: DEFAULT_TOLERANCE.as_secs_f64(),
        }
    }

    #[test]
    fn hint_within_tolerance_is_not_enqueued() {
        let player = player_with_pcm(vec![0.0; 100], 48_000, 1);
        player.update_video_time(0.05); // 50ms, under the 100ms tolerance
        assert!(player.sync_rx.try_recv().is_err());
    }

    #[test]
    fn hint_past_tolerance_is_enqueued() {
        let player = player_with_pcm(vec![0.0; 100], 48_000, 1);
        player.update_video_time(1.0);
        assert_eq!(player.sync_rx.try_recv(), Ok(1.0));
    }
}
