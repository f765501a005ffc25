use std::collections::HashMap;
use std::env;
use std::fs;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::service::schedule::{DEFAULT_RUN_AT, DEFAULT_TIMEZONE, parse_hhmm};
use crate::store::file_store::DEFAULT_STATE_FILE;
use crate::tasks::notification_loop::SchedulerDefaults;

pub const DEFAULT_USER_AGENT: &str = "fight-night-bot/1.0";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// `KEY=value` lines; blank lines and `#` comments are skipped, an
    /// `export ` prefix and matching quotes are stripped.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    /// File value first, then the process environment.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Api,
    Cli,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: Option<String>,
    pub run_mode: RunMode,
    pub run_at: String,
    pub timezone: String,
    pub state_file: String,
    pub dev_guild_id: Option<u64>,
    pub user_agent: String,
    pub http_timeout: Duration,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let run_mode = match config.get("RUN_MODE").as_deref().map(str::trim) {
            None | Some("api") => RunMode::Api,
            Some("cli") => RunMode::Cli,
            Some(other) => {
                warn!(run_mode = other, "unknown RUN_MODE, using api");
                RunMode::Api
            }
        };

        let run_at = config.get("RUN_AT").unwrap_or_else(|| DEFAULT_RUN_AT.to_string());
        let run_at = if parse_hhmm(&run_at).is_some() {
            run_at
        } else {
            warn!(error = %ConfigError::InvalidRunAt(run_at.clone()), "using {}", DEFAULT_RUN_AT);
            DEFAULT_RUN_AT.to_string()
        };

        let dev_guild_id = match config.get("GUILD_ID") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(id) if id != 0 => Some(id),
                _ => {
                    warn!(guild_id = %raw, "ignoring invalid GUILD_ID");
                    None
                }
            },
            None => None,
        };

        let http_timeout = config
            .get("HTTP_TIMEOUT_SECS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let settings = Self {
            discord_token: config.get("DISCORD_TOKEN"),
            run_mode,
            run_at,
            timezone: config.get("TZ").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            state_file: config
                .get("STATE_FILE")
                .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string()),
            dev_guild_id,
            user_agent: config
                .get("USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            http_timeout: Duration::from_secs(http_timeout),
        };
        if settings.run_mode == RunMode::Api && settings.discord_token.is_none() {
            return Err(ConfigError::Missing("DISCORD_TOKEN"));
        }
        Ok(settings)
    }

    pub fn scheduler_defaults(&self) -> SchedulerDefaults {
        SchedulerDefaults {
            timezone: self.timezone.clone(),
            run_at: self.run_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn clear_env() {
        for key in [
            "DISCORD_TOKEN", "RUN_MODE", "RUN_AT", "TZ", "STATE_FILE", "GUILD_ID", "USER_AGENT",
            "HTTP_TIMEOUT_SECS",
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn parses_key_value_lines() {
        let config = AppConfig::parse(
            "# comment\n\nexport DISCORD_TOKEN=\"abc\"\nRUN_AT='07:30'\nTZ = Asia/Tokyo\n",
        )
        .unwrap();
        assert_eq!(config.values.get("DISCORD_TOKEN").map(String::as_str), Some("abc"));
        assert_eq!(config.values.get("RUN_AT").map(String::as_str), Some("07:30"));
        assert_eq!(config.values.get("TZ").map(String::as_str), Some("Asia/Tokyo"));
    }

    #[test]
    fn rejects_lines_without_equals() {
        let err = AppConfig::parse("DISCORD_TOKEN=abc\nnot a pair\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLine { line: 2, .. }));
    }

    #[test]
    fn settings_defaults_and_fallbacks() {
        let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        clear_env();
        let config = AppConfig::parse("RUN_MODE=cli\nRUN_AT=25:99\nGUILD_ID=abc\n").unwrap();
        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.run_mode, RunMode::Cli);
        assert_eq!(settings.run_at, "16:00");
        assert_eq!(settings.timezone, "America/New_York");
        assert_eq!(settings.state_file, "./data/state.json");
        assert_eq!(settings.dev_guild_id, None);
        assert_eq!(settings.user_agent, "fight-night-bot/1.0");
        assert_eq!(settings.http_timeout, Duration::from_secs(12));
    }

    #[test]
    fn api_mode_requires_token_and_env_is_fallback() {
        let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
        clear_env();
        let config = AppConfig::default();
        assert!(matches!(
            Settings::from_config(&config),
            Err(ConfigError::Missing("DISCORD_TOKEN"))
        ));

        unsafe {
            env::set_var("DISCORD_TOKEN", "from-env");
        }
        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.discord_token.as_deref(), Some("from-env"));
        let file = AppConfig::parse("DISCORD_TOKEN=from-file").unwrap();
        assert_eq!(Settings::from_config(&file).unwrap().discord_token.as_deref(), Some("from-file"));
        clear_env();
    }
}
