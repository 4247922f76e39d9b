//! Audio capture from microphone

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use super::segmenter::UtteranceSegmenter;
use super::SAMPLE_RATE;
use crate::{Error, Result};

/// Captures audio from the default input device
///
/// Streams only live for the duration of one capture call and run on a
/// blocking worker thread, so this type stays `Send`.
pub struct AudioCapture {
    config: StreamConfig,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports 16 kHz mono
    pub fn new() -> Result<Self> {
        let device = default_input_device()?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self { config })
    }

    /// Capture until `segmenter` finalizes one utterance
    ///
    /// Returns `None` if the input device went away before an utterance was
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns error if the stream cannot be opened or reports a failure
    pub async fn capture_utterance(
        &self,
        segmenter: UtteranceSegmenter,
    ) -> Result<Option<Vec<f32>>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || capture_blocking(&config, segmenter))
            .await
            .map_err(|e| Error::Audio(format!("capture task failed: {e}")))?
    }

    /// Stream raw blocks to `on_block` until it returns `false`
    ///
    /// # Errors
    ///
    /// Returns error if the stream cannot be opened
    pub async fn monitor<F>(&self, on_block: F) -> Result<()>
    where
        F: FnMut(&[f32]) -> bool + Send + 'static,
    {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || monitor_blocking(&config, on_block))
            .await
            .map_err(|e| Error::Audio(format!("capture task failed: {e}")))?
    }

    /// Get the sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

fn default_input_device() -> Result<Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| Error::Audio("no input device available".to_string()))
}

/// What the capture callbacks hand to the waiting thread
#[derive(Debug)]
enum CaptureEvent {
    /// The segmenter finalized an utterance
    Utterance(Vec<f32>),
    /// The input device went away before an utterance was complete
    Ended,
    /// The backend reported a failure
    Failed(String),
}

impl From<cpal::StreamError> for CaptureEvent {
    fn from(err: cpal::StreamError) -> Self {
        match err {
            cpal::StreamError::DeviceNotAvailable => Self::Ended,
            cpal::StreamError::BackendSpecific { err } => Self::Failed(err.to_string()),
        }
    }
}

/// Turn the first handed-over event into the capture result
fn capture_outcome(event: Option<CaptureEvent>) -> Result<Option<Vec<f32>>> {
    match event {
        Some(CaptureEvent::Utterance(samples)) => Ok(Some(samples)),
        Some(CaptureEvent::Ended) | None => Ok(None),
        Some(CaptureEvent::Failed(e)) => Err(Error::Audio(e)),
    }
}

/// Run one capture stream until the callback hands over an utterance
///
/// The callbacks and this thread meet at a single-slot channel: the first
/// finalized utterance, device loss or stream error fills the slot and later
/// frames are ignored.
fn capture_blocking(
    config: &StreamConfig,
    mut segmenter: UtteranceSegmenter,
) -> Result<Option<Vec<f32>>> {
    let device = default_input_device()?;

    let (tx, rx) = mpsc::sync_channel::<CaptureEvent>(1);
    let err_tx = tx.clone();
    let mut slot = Some(tx);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if slot.is_none() {
                    return;
                }
                if let Some(utterance) = segmenter.push(data)
                    && let Some(tx) = slot.take()
                {
                    let _ = tx.try_send(CaptureEvent::Utterance(utterance));
                }
            },
            move |err| {
                tracing::error!(error = %err, "audio capture error");
                let _ = err_tx.try_send(CaptureEvent::from(err));
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    tracing::debug!("audio capture started");

    let received = rx.recv().ok();
    drop(stream);
    tracing::debug!("audio capture stopped");

    if matches!(received, Some(CaptureEvent::Ended)) {
        tracing::warn!("input device went away before an utterance was complete");
    }

    capture_outcome(received)
}

fn monitor_blocking<F>(config: &StreamConfig, mut on_block: F) -> Result<()>
where
    F: FnMut(&[f32]) -> bool + Send + 'static,
{
    let device = default_input_device()?;

    let (tx, rx) = mpsc::sync_channel::<()>(1);
    let mut slot = Some(tx);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if slot.is_some() && !on_block(data) {
                    slot.take();
                }
            },
            |err| {
                tracing::error!(error = %err, "audio capture error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    // Disconnects once the callback drops its sender
    let _ = rx.recv();
    drop(stream);

    Ok(())
}

/// Convert f32 samples to 16-bit mono WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utterance_is_returned() {
        let outcome = capture_outcome(Some(CaptureEvent::Utterance(vec![0.1, 0.2])));
        assert_eq!(outcome.unwrap(), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn device_loss_ends_without_utterance() {
        let event = CaptureEvent::from(cpal::StreamError::DeviceNotAvailable);
        assert!(matches!(event, CaptureEvent::Ended));
        assert_eq!(capture_outcome(Some(event)).unwrap(), None);
    }

    #[test]
    fn closed_channel_ends_without_utterance() {
        assert_eq!(capture_outcome(None).unwrap(), None);
    }

    #[test]
    fn backend_failure_is_an_audio_error() {
        let event = CaptureEvent::from(cpal::StreamError::BackendSpecific {
            err: cpal::BackendSpecificError {
                description: "buffer overrun".to_string(),
            },
        });

        let err = capture_outcome(Some(event)).unwrap_err();
        assert!(matches!(&err, Error::Audio(msg) if msg.contains("buffer overrun")));
    }
}
