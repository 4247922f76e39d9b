//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use parley::voice::{SAMPLE_RATE, SegmenterState, UtteranceSegmenter, samples_to_wav};
use std::io::Cursor;

/// Block size delivered by a typical input callback (0.1 s)
const BLOCK: usize = 1600;

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed `samples` block by block, returning the first finalized utterance
fn feed(segmenter: &mut UtteranceSegmenter, samples: &[f32]) -> Option<Vec<f32>> {
    samples.chunks(BLOCK).find_map(|block| segmenter.push(block))
}

#[test]
fn test_segmenter_starts_idle() {
    let segmenter = UtteranceSegmenter::new();
    assert_eq!(segmenter.state(), SegmenterState::Idle);
}

#[test]
fn test_speech_then_silence_finalizes_utterance() {
    let mut segmenter = UtteranceSegmenter::new();

    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    assert!(feed(&mut segmenter, &speech).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    // Short pause keeps the utterance open
    assert!(feed(&mut segmenter, &generate_silence(0.3)).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    let utterance = feed(&mut segmenter, &generate_silence(1.0)).expect("utterance should end");

    // 0.5 s speech plus the 0.6 s of trailing silence that closed it
    assert_eq!(utterance.len(), speech.len() + 6 * BLOCK);
    assert_eq!(segmenter.state(), SegmenterState::Idle);
}

#[test]
fn test_speech_resumes_after_brief_pause() {
    let mut segmenter = UtteranceSegmenter::new();

    feed(&mut segmenter, &generate_sine_samples(440.0, 0.4, 0.3));
    feed(&mut segmenter, &generate_silence(0.4));
    assert!(feed(&mut segmenter, &generate_sine_samples(220.0, 0.4, 0.3)).is_none());

    let utterance = feed(&mut segmenter, &generate_silence(1.0)).expect("utterance should end");
    assert!(utterance.len() > SAMPLE_RATE as usize);
}

#[test]
fn test_click_followed_by_silence_is_dropped() {
    let mut segmenter = UtteranceSegmenter::new();

    let click = generate_sine_samples(440.0, 0.1, 0.5);
    assert!(feed(&mut segmenter, &click).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    assert!(feed(&mut segmenter, &generate_silence(1.2)).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Idle);

    // A real utterance afterwards is unaffected by the dropped click
    feed(&mut segmenter, &generate_sine_samples(440.0, 0.5, 0.3));
    let utterance = feed(&mut segmenter, &generate_silence(1.0)).expect("utterance should end");
    assert_eq!(utterance.len(), 8000 + 6 * BLOCK);
}

#[test]
fn test_quiet_noise_is_not_speech() {
    let mut segmenter = UtteranceSegmenter::new();
    let hiss = generate_sine_samples(3000.0, 2.0, 0.01);

    assert!(feed(&mut segmenter, &hiss).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Idle);
}

#[test]
fn test_reset_drops_buffered_speech() {
    let mut segmenter = UtteranceSegmenter::new();
    feed(&mut segmenter, &generate_sine_samples(440.0, 0.5, 0.3));

    segmenter.reset();

    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert!(feed(&mut segmenter, &generate_silence(1.0)).is_none());
}

#[test]
fn test_samples_to_wav_format() {
    let samples = generate_sine_samples(440.0, 0.25, 0.5);
    let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len() as usize, samples.len());
}

#[test]
fn test_samples_to_wav_clamps_out_of_range() {
    let wav = samples_to_wav(&[2.0, -2.0, 0.0], SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(decoded, vec![i16::MAX, i16::MIN, 0]);
}
