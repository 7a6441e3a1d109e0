//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_ROOMS_BACK_CONFIG_PATH";

const DEFAULT_TRIVIA_API_URL: &str = "https://opentdb.com/api.php";
const DEFAULT_QUESTION_COUNT: usize = 50;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
const DEFAULT_QUESTION_DURATION_SECS: u8 = 10;
const DEFAULT_CHAT_HISTORY_LIMIT: usize = 50;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Question supplier settings.
    pub trivia: TriviaConfig,
    /// Gameplay settings.
    pub game: GameConfig,
    /// Chat settings.
    pub chat: ChatConfig,
}

/// Settings for the external trivia source.
#[derive(Debug, Clone)]
pub struct TriviaConfig {
    /// Endpoint queried for question batches.
    pub api_url: String,
    /// Number of questions fetched per session.
    pub question_count: usize,
    /// Retries allowed when the source rate limits.
    pub max_retries: u32,
    /// Delay between rate-limited attempts.
    pub retry_delay: Duration,
}

/// Settings for the session engine.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Countdown per question, in seconds.
    pub question_duration: u8,
}

/// Settings for the chat stream.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Number of recent messages delivered to subscribers.
    pub history_limit: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trivia: TriviaConfig {
                api_url: DEFAULT_TRIVIA_API_URL.into(),
                question_count: DEFAULT_QUESTION_COUNT,
                max_retries: DEFAULT_MAX_RETRIES,
                retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            },
            game: GameConfig {
                question_duration: DEFAULT_QUESTION_DURATION_SECS,
            },
            chat: ChatConfig {
                history_limit: DEFAULT_CHAT_HISTORY_LIMIT,
            },
        }
    }
}

/// JSON representation of the configuration file.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    trivia: RawTriviaConfig,
    #[serde(default)]
    game: RawGameConfig,
    #[serde(default)]
    chat: RawChatConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawTriviaConfig {
    api_url: Option<String>,
    question_count: Option<usize>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGameConfig {
    question_duration_secs: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct RawChatConfig {
    history_limit: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            trivia: TriviaConfig {
                api_url: raw.trivia.api_url.unwrap_or(defaults.trivia.api_url),
                question_count: raw
                    .trivia
                    .question_count
                    .unwrap_or(defaults.trivia.question_count),
                max_retries: raw.trivia.max_retries.unwrap_or(defaults.trivia.max_retries),
                retry_delay: raw
                    .trivia
                    .retry_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.trivia.retry_delay),
            },
            game: GameConfig {
                question_duration: raw
                    .game
                    .question_duration_secs
                    .unwrap_or(defaults.game.question_duration),
            },
            chat: ChatConfig {
                history_limit: raw.chat.history_limit.unwrap_or(defaults.chat.history_limit),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults_per_field() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"trivia": {"question_count": 10}}"#).unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.trivia.question_count, 10);
        assert_eq!(config.trivia.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.game.question_duration, DEFAULT_QUESTION_DURATION_SECS);
        assert_eq!(config.chat.history_limit, DEFAULT_CHAT_HISTORY_LIMIT);
    }

    #[test]
    fn defaults_match_documented_policy() {
        let config = AppConfig::default();
        assert_eq!(config.trivia.max_retries, 3);
        assert_eq!(config.trivia.retry_delay, Duration::from_secs(2));
        assert_eq!(config.game.question_duration, 10);
        assert_eq!(config.chat.history_limit, 50);
    }
}
