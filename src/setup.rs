//! Interactive first-run setup wizard (`parley setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use crate::config::file::{
    ApiKeysFileConfig, ChatFileConfig, ParleyConfigFile, VoiceFileConfig, config_file_path,
    load_config_file, write_config_file,
};
use crate::config::DEFAULT_CHAT_MODEL;

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Parley Setup\n");

    let existing = load_config_file();
    let config_path =
        config_file_path().unwrap_or_else(|| PathBuf::from("~/.config/parley/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Gemini key + model
    let gemini = prompt_key("Gemini", "GEMINI_API_KEY", existing.api_keys.gemini.as_deref())?;

    let model: String = Input::new()
        .with_prompt("Chat model")
        .default(
            existing
                .chat
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        )
        .interact_text()?;

    // 2. Voice (optional)
    let enable_voice = Confirm::new()
        .with_prompt("Enable voice mode (speech in and out)?")
        .default(existing.voice.enabled.unwrap_or(true))
        .interact()?;

    let openai = if enable_voice {
        prompt_key("OpenAI", "OPENAI_API_KEY", existing.api_keys.openai.as_deref())?
    } else {
        existing.api_keys.openai.clone()
    };

    let config_file = ParleyConfigFile {
        chat: ChatFileConfig {
            model: Some(model),
            ..existing.chat
        },
        voice: VoiceFileConfig {
            enabled: Some(enable_voice),
            ..existing.voice
        },
        api_keys: ApiKeysFileConfig { gemini, openai },
        keywords: existing.keywords,
        retry: existing.retry,
    };

    write_config_file(&config_path, &config_file)?;
    tracing::debug!(path = %config_path.display(), "config written");
    println!("\nConfig written to {}", config_path.display());

    if enable_voice {
        println!("\nSetup complete! Run `parley test-mic` to check your microphone, then `parley`.");
    } else {
        println!("\nSetup complete! Run `parley` to start chatting.");
    }

    Ok(())
}

/// Ask for an API key, keeping the current one when the answer is blank
fn prompt_key(
    provider: &str,
    env_hint: &str,
    current: Option<&str>,
) -> anyhow::Result<Option<String>> {
    let prompt = match current.map(mask_key) {
        Some(masked) => format!("{provider} API key (current: {masked}, leave blank to keep)"),
        None => format!("{provider} API key ({env_hint})"),
    };

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    if input.is_empty() {
        Ok(current.map(str::to_string))
    } else {
        Ok(Some(input.to_string()))
    }
}

/// Show only the ends of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}
