use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.4;
const DEFAULT_MAX_TOKENS: u32 = 450;
const DEFAULT_WORD_LIMIT: usize = 120;
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default settings document looked up next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// What the generator does once every attempt for a lead has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Propagate the last error and abort the run
    #[default]
    Fail,
    /// Log a warning and substitute the deterministic demo copy
    Demo,
}

/// Generation settings, loaded once from a YAML document.
///
/// Missing keys fall back to their defaults and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Settings {
    /// Model identifier sent to the backend
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Ceiling on generated tokens per request
    pub max_tokens: u32,

    /// Maximum words allowed in each A/B body
    pub word_limit: usize,

    /// Terms that must not appear anywhere in the copy
    #[serde(alias = "banned_terms")]
    pub buzzwords: Vec<String>,

    /// Chat-completion endpoint URL
    pub endpoint: String,

    /// Behaviour after the last generation attempt fails
    pub on_exhaustion: ExhaustionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            word_limit: DEFAULT_WORD_LIMIT,
            buzzwords: Vec::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            on_exhaustion: ExhaustionPolicy::Fail,
        }
    }
}

impl Settings {
    /// Reads and validates a YAML settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// holds out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml_str(&raw)
    }

    /// Parses and validates settings from YAML text.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or validation fails.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let settings = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(raw)?
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Model identifier is empty
    /// - Temperature is outside `0.0..=2.0`
    /// - `max_tokens` or `word_limit` is zero
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(Error::config("max_tokens must be greater than 0"));
        }

        if self.word_limit == 0 {
            return Err(Error::config("word_limit must be greater than 0"));
        }

        Ok(())
    }
}

/// Configuration for one outreach run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Clone)]
#[non_exhaustive]
pub struct Config {
    /// Lead table to read
    pub input_path: PathBuf,

    /// Directory receiving every output artifact
    pub output_dir: PathBuf,

    /// Campaign name used in the plan document
    pub campaign: String,

    /// Skip the backend and emit demo copy
    pub dry_run: bool,

    /// Generation settings
    pub settings: Settings,

    /// Backend credential; `None` behaves like a dry run
    pub api_key: Option<String>,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use outreach_gen::Config;
    ///
    /// let config = Config::builder()
    ///     .input_path("leads.csv")
    ///     .output_dir("out")
    ///     .campaign("Q3 founders")
    ///     .dry_run(true)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Input file doesn't exist or is not a file
    /// - Campaign name is blank
    /// - Settings are out of range
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.exists() {
            return Err(Error::config(format!(
                "Input file does not exist: {}",
                self.input_path.display()
            )));
        }

        if !self.input_path.is_file() {
            return Err(Error::config(format!(
                "Input path is not a file: {}",
                self.input_path.display()
            )));
        }

        if self.campaign.trim().is_empty() {
            return Err(Error::config("campaign name must not be empty"));
        }

        self.settings.validate()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("input_path", &self.input_path)
            .field("output_dir", &self.output_dir)
            .field("campaign", &self.campaign)
            .field("dry_run", &self.dry_run)
            .field("settings", &self.settings)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    campaign: Option<String>,
    dry_run: bool,
    settings: Option<Settings>,
    api_key: Option<String>,
}

impl ConfigBuilder {
    /// Sets the lead table to read.
    #[must_use]
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Sets the output directory for generated files.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the campaign name.
    #[must_use]
    pub fn campaign(mut self, name: impl Into<String>) -> Self {
        self.campaign = Some(name.into());
        self
    }

    /// Enables dry run mode (no backend calls).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Sets the generation settings.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the backend credential.
    #[must_use]
    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is missing or validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            input_path: self
                .input_path
                .ok_or_else(|| Error::config("input path is required"))?,
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("out")),
            campaign: self
                .campaign
                .ok_or_else(|| Error::config("campaign name is required"))?,
            dry_run: self.dry_run,
            settings: self.settings.unwrap_or_default(),
            api_key: self.api_key,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.word_limit, 120);
        assert_eq!(settings.max_tokens, 450);
        assert!(settings.buzzwords.is_empty());
        assert_eq!(settings.on_exhaustion, ExhaustionPolicy::Fail);
    }

    #[test]
    fn test_settings_from_yaml() {
        let settings = Settings::from_yaml_str(
            "model: gpt-4o\ntemperature: 0.2\nword_limit: 90\nbuzzwords:\n  - synergy\n  - disrupt\nunused: true\n",
        )
        .unwrap();

        assert_eq!(settings.model, "gpt-4o");
        assert!((settings.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.word_limit, 90);
        assert_eq!(settings.buzzwords, vec!["synergy", "disrupt"]);
        assert_eq!(settings.max_tokens, 450);
    }

    #[test]
    fn test_banned_terms_alias_and_policy() {
        let settings =
            Settings::from_yaml_str("banned_terms: [leverage]\non_exhaustion: demo\n").unwrap();
        assert_eq!(settings.buzzwords, vec!["leverage"]);
        assert_eq!(settings.on_exhaustion, ExhaustionPolicy::Demo);
    }

    #[test]
    fn test_empty_yaml_yields_defaults() {
        assert_eq!(Settings::from_yaml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_settings() {
        assert!(Settings::from_yaml_str("temperature: 3.5").is_err());
        assert!(Settings::from_yaml_str("word_limit: 0").is_err());
        assert!(Settings::from_yaml_str("model: ''").is_err());
        assert!(Settings::from_yaml_str("word_limit: [1, 2]").is_err());
    }

    #[test]
    fn test_load_settings_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("config.yaml");
        file.write_str("max_tokens: 300\n").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.max_tokens, 300);

        let missing = Settings::load(temp.child("nope.yaml").path());
        assert!(missing.unwrap_err().is_io());
    }

    #[test]
    fn test_config_requires_existing_input() {
        let result = Config::builder()
            .input_path("/nonexistent/leads.csv")
            .campaign("demo")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_blank_campaign() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("leads.csv");
        input.write_str("email\n").unwrap();

        let result = Config::builder()
            .input_path(input.path())
            .campaign("  ")
            .build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("leads.csv");
        input.write_str("email\n").unwrap();

        let config = Config::builder()
            .input_path(input.path())
            .campaign("demo")
            .api_key(Some("sk-test".to_string()))
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("demo"));
    }
}
