use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::chat::GeminiClient;
use parley::conversation::TerminalConsole;
use parley::voice::{
    AudioCapture, AudioPlayback, MicrophoneRecognizer, PLAYBACK_SAMPLE_RATE, SpeakerSynthesizer,
    Synthesizer, calculate_energy,
};
use parley::{Config, ConversationLoop, VoiceIo};

/// Parley - chat with Gemini by typing or by voice
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice mode (for machines without audio hardware)
    #[arg(long, env = "PARLEY_DISABLE_VOICE")]
    disable_voice: bool,

    /// Chat model to use, overriding config
    #[arg(short, long, env = "PARLEY_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&text).await,
            Command::Setup => parley::setup::run_setup(),
        };
    }

    let mut config = Config::load_with_options(cli.disable_voice)?;
    if let Some(model) = cli.model {
        config.chat.model = model;
    }

    tracing::info!(
        model = %config.chat.model,
        voice = config.voice.enabled,
        "starting parley"
    );

    let chat = GeminiClient::new(&config.chat);
    let mut conversation = ConversationLoop::new(Box::new(chat), Box::new(TerminalConsole::new()))
        .with_keywords(config.keywords.clone())
        .with_retry(config.retry)
        .with_exit_from_voice_terminates(config.exit_from_voice_terminates);

    if config.voice.enabled {
        let recognizer = MicrophoneRecognizer::new(&config.voice)
            .map_err(|e| anyhow::anyhow!("voice setup failed: {e}"))?;
        let synthesizer = SpeakerSynthesizer::new(&config.voice)
            .map_err(|e| anyhow::anyhow!("voice setup failed: {e}"))?;
        conversation = conversation.with_voice(VoiceIo {
            recognizer: Box::new(recognizer),
            synthesizer: Box::new(synthesizer),
        });
    } else {
        tracing::info!("voice disabled, text mode only");
    }

    conversation.run().await?;

    Ok(())
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let capture = AudioCapture::new()?;
    let sample_rate = capture.sample_rate();
    println!("Sample rate: {sample_rate} Hz");
    println!("---");

    let window = sample_rate as usize;
    let mut second = 0u64;
    let mut buffer: Vec<f32> = Vec::with_capacity(window);

    capture
        .monitor(move |block| {
            buffer.extend_from_slice(block);
            if buffer.len() < window {
                return true;
            }

            second += 1;
            let energy = calculate_energy(&buffer);
            let peak = buffer.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

            // Visual meter
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let meter_len = (energy * 100.0).min(50.0) as usize;
            let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

            println!("[{second:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]");

            buffer.clear();
            second < duration
        })
        .await?;

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");
    println!("  4. Try: pavucontrol (to check levels)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let frequency = 440.0_f32;
    let num_samples = PLAYBACK_SAMPLE_RATE as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!(
        "Playing {} samples at {} Hz...",
        samples.len(),
        PLAYBACK_SAMPLE_RATE
    );

    playback.play(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output end to end
async fn test_tts(text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let mut synthesizer = SpeakerSynthesizer::new(&config.voice)?;

    println!("Synthesizing and playing speech...");
    synthesizer.speak(text).await?;
    println!(
        "Audio written to {}",
        config.voice.audio_file.display()
    );

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
