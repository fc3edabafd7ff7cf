//! Configuration records for encoders and for whole facades.
//!
//! Everything here is plain data with serde support so a facade can be
//! described in TOML, but nothing is read from disk or the environment.

use crate::sampler::SamplingConfig;
use crate::sink::Sink;
use crate::{Level, LogFacade, Result, DEFAULT_LOG_LEVEL};
use serde::{Deserialize, Serialize};

/// How timestamps are rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEncoding {
    /// `2024-05-01T13:45:12.034+0200`, or `...034Z` in UTC
    #[default]
    Iso8601,
    /// `2024-05-01T13:45:12+02:00`
    Rfc3339,
    /// `2024-05-01T13:45:12.034567891+02:00`
    Rfc3339Nano,
    /// Floating-point seconds since the Unix epoch
    Epoch,
    /// Floating-point milliseconds since the Unix epoch
    EpochMillis,
    /// Integer nanoseconds since the Unix epoch
    EpochNanos,
}

/// How levels are rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelEncoding {
    #[default]
    Lowercase,
    Capital,
}

/// How the caller location is rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerEncoding {
    /// Last directory and file name, e.g. `src/server.rs:42`
    #[default]
    Short,
    /// The path exactly as the compiler reported it
    Full,
}

/// Which encoder variant formats records
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Human-oriented single line
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// Field names and formatting choices shared by both encoders.
///
/// An empty key leaves that element out of the output entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub time_key: String,
    pub level_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub function_key: String,
    pub message_key: String,
    pub stacktrace_key: String,
    pub line_ending: String,
    /// Separator between elements in console output
    pub console_separator: String,
    pub time_encoding: TimeEncoding,
    pub level_encoding: LevelEncoding,
    pub caller_encoding: CallerEncoding,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: "@timestamp".into(),
            level_key: "level".into(),
            name_key: "logger".into(),
            caller_key: "caller".into(),
            function_key: "function".into(),
            message_key: "message".into(),
            stacktrace_key: "stacktrace".into(),
            line_ending: "\n".into(),
            console_separator: "\t".into(),
            time_encoding: TimeEncoding::Iso8601,
            level_encoding: LevelEncoding::Lowercase,
            caller_encoding: CallerEncoding::Short,
        }
    }
}

/// Complete description of a facade
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub level: Level,
    pub development: bool,
    pub encoding: Encoding,
    pub disable_caller: bool,
    pub disable_stacktrace: bool,
    pub sampling: Option<SamplingConfig>,
    pub encoder: EncoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            development: false,
            encoding: Encoding::Console,
            disable_caller: false,
            disable_stacktrace: false,
            sampling: None,
            encoder: EncoderConfig::default(),
        }
    }
}

impl Config {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build a facade writing to standard output
    pub fn build(&self) -> LogFacade {
        LogFacade::from_config(self, Sink::stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encoder_keys() {
        let config = EncoderConfig::default();
        assert_eq!(config.time_key, "@timestamp");
        assert_eq!(config.caller_key, "caller");
        assert_eq!(config.function_key, "function");
        assert_eq!(config.stacktrace_key, "stacktrace");
        assert_eq!(config.message_key, "message");
        assert_eq!(config.time_encoding, TimeEncoding::Iso8601);
        assert_eq!(config.caller_encoding, CallerEncoding::Short);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.level, Level::Warn);
        assert_eq!(config.encoding, Encoding::Console);
        assert!(!config.development);
        assert!(config.sampling.is_none());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
level = "debug"
encoding = "json"

[encoder]
message_key = "msg"
time_encoding = "epoch_millis"
"#;
        let config = Config::from_toml_str(toml_str).unwrap();
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.encoding, Encoding::Json);
        assert_eq!(config.encoder.message_key, "msg");
        assert_eq!(config.encoder.time_encoding, TimeEncoding::EpochMillis);
        assert_eq!(config.encoder.time_key, "@timestamp"); // default
    }

    #[test]
    fn test_sampling_section() {
        let toml_str = r#"
[sampling]
first = 10
thereafter = 50
"#;
        let config = Config::from_toml_str(toml_str).unwrap();
        let sampling = config.sampling.unwrap();
        assert_eq!(sampling.first, 10);
        assert_eq!(sampling.thereafter, 50);
        assert_eq!(sampling.tick_millis, 1000);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let err = Config::from_toml_str("level = \"loudest\"").unwrap_err();
        assert!(matches!(err, crate::Error::Toml(_)));
    }
}
