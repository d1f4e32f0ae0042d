use crate::alert::{Alert, DEFAULT_FADE_AFTER, DEFAULT_RESET_AFTER};
use crate::direction::Direction;
use crate::framing::Framing;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/chat";
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

pub const ENDPOINT_ENV: &str = "DOGGO_CHAT_URL";
pub const FRAMING_ENV: &str = "DOGGO_FRAMING";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub framing: Option<Framing>,
    pub default_direction: Option<Direction>,
    /// Seconds without data before a request is abandoned, 0 disables
    pub idle_timeout_secs: Option<u64>,
    pub alert_fade_ms: Option<u64>,
    pub alert_reset_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn save_default_direction(direction: Direction) -> Result<()> {
        let config_path = Self::get_config_path()?;
        Self::save_default_direction_to(&config_path, direction)
    }

    /// Update only the default direction. A file that can't be read is left
    /// untouched rather than replaced with defaults.
    pub fn save_default_direction_to(config_path: &Path, direction: Direction) -> Result<()> {
        let mut config = Self::load_from(config_path).map_err(|e| {
            tracing::warn!("not saving direction, {} is unreadable: {}", config_path.display(), e);
            e
        })?;
        config.default_direction = Some(direction);
        config.save_to(config_path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("doggo-chat").join("config.json"))
    }

    /// Environment variables win over the file
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(FRAMING_ENV).ok(),
        )?;
        Ok(self)
    }

    /// Override endpoint and framing, e.g. from env vars or CLI flags
    pub fn apply_overrides(&mut self, endpoint: Option<String>, framing: Option<String>) -> Result<()> {
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            self.endpoint = Some(endpoint);
        }
        if let Some(name) = framing.filter(|f| !f.is_empty()) {
            let framing = Framing::from_str(&name)
                .ok_or_else(|| anyhow!("Unknown framing '{}', expected 'sse' or 'raw-json'", name))?;
            self.framing = Some(framing);
        }
        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn framing(&self) -> Framing {
        self.framing.unwrap_or(Framing::RawJson)
    }

    pub fn direction(&self) -> Direction {
        self.default_direction.unwrap_or_default()
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn alert(&self) -> Alert {
        Alert::new(
            self.alert_fade_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_FADE_AFTER),
            self.alert_reset_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RESET_AFTER),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::new());
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.framing(), Framing::RawJson);
        assert_eq!(config.direction(), Direction::EngToDoggo);
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            endpoint: Some("https://api.example.com/chat_json".to_string()),
            framing: Some(Framing::Sse),
            default_direction: Some(Direction::DoggoToEng),
            idle_timeout_secs: Some(0),
            alert_fade_ms: Some(1000),
            alert_reset_ms: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.idle_timeout(), None);
    }

    #[test]
    fn test_file_uses_wire_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"endpoint": "/chat", "framing": "sse", "default_direction": "doggo_to_eng"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint(), "/chat");
        assert_eq!(config.framing(), Framing::Sse);
        assert_eq!(config.direction(), Direction::DoggoToEng);
    }

    #[test]
    fn test_file_framing_accepts_cli_spellings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"framing": "SSE"}"#).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().framing(), Framing::Sse);

        fs::write(&path, r#"{"framing": "raw_json"}"#).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().framing(), Framing::RawJson);

        fs::write(&path, r#"{"framing": "xml"}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_direction_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"endpoint": "https://api.doggo-gpt-mini.com/chat_json", "framing": "SSE"}"#,
        )
        .unwrap();

        Config::save_default_direction_to(&path, Direction::DoggoToEng).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint(), "https://api.doggo-gpt-mini.com/chat_json");
        assert_eq!(config.framing(), Framing::Sse);
        assert_eq!(config.direction(), Direction::DoggoToEng);
    }

    #[test]
    fn test_save_direction_leaves_unreadable_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let original = r#"{"endpoint": "https://api.doggo-gpt-mini.com/chat_json", "framing": "xml"}"#;
        fs::write(&path, original).unwrap();

        assert!(Config::save_default_direction_to(&path, Direction::DoggoToEng).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_save_direction_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::save_default_direction_to(&path, Direction::DoggoToEng).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().direction(), Direction::DoggoToEng);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::new();
        config
            .apply_overrides(Some("http://other/chat".to_string()), Some("sse".to_string()))
            .unwrap();
        assert_eq!(config.endpoint(), "http://other/chat");
        assert_eq!(config.framing(), Framing::Sse);

        // Empty values leave the existing setting alone
        config.apply_overrides(Some(String::new()), None).unwrap();
        assert_eq!(config.endpoint(), "http://other/chat");

        assert!(config.apply_overrides(None, Some("xml".to_string())).is_err());
    }

    #[test]
    fn test_alert_timings() {
        let config = Config {
            alert_fade_ms: Some(100),
            alert_reset_ms: Some(10),
            ..Config::new()
        };
        let mut alert = config.alert();
        let t0 = std::time::Instant::now();
        alert.present("x", crate::alert::Severity::Info, t0);
        assert!(alert.poll(t0 + Duration::from_millis(100)));
        assert!(alert.poll(t0 + Duration::from_millis(110)));
        assert!(!alert.is_shown());
    }
}
