//! Record encoders.
//!
//! A record is an [`Entry`] plus its structured [`Field`]s. Both encoders
//! emit the elements in the same fixed order (time, level, logger name,
//! caller, function, message, fields, stack trace) and honour the key names
//! of the [`EncoderConfig`] they were built from.

use crate::config::{CallerEncoding, EncoderConfig, Encoding, LevelEncoding, TimeEncoding};
use crate::{Field, Level, Result};
use chrono::{DateTime, Local, Offset, SecondsFormat, TimeZone};
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Source location a record is attributed to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
    /// Path of the enclosing function, when the call site could name it
    pub function: Option<&'static str>,
}

impl Caller {
    pub const fn new(
        file: &'static str,
        line: u32,
        column: u32,
        function: Option<&'static str>,
    ) -> Self {
        Self {
            file,
            line,
            column,
            function,
        }
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line(), location.column(), None)
    }

    /// The location of whoever called into the `#[track_caller]` chain
    #[track_caller]
    pub fn here() -> Self {
        Self::from_location(Location::caller())
    }

    /// Fill in the function from the call stack when the call site did not
    /// name it
    pub fn resolve_function(self) -> Self {
        if self.function.is_some() {
            return self;
        }
        Self {
            function: crate::callsite::function_at(self.file, self.line, self.column),
            ..self
        }
    }

    /// Last directory plus file name
    pub fn short_path(&self) -> &'static str {
        let file = self.file;
        let is_sep = |c: char| c == '/' || c == '\\';
        match file.rfind(is_sep) {
            Some(last) => match file[..last].rfind(is_sep) {
                Some(prev) => &file[prev + 1..],
                None => file,
            },
            None => file,
        }
    }

    fn render(&self, encoding: CallerEncoding) -> String {
        match encoding {
            CallerEncoding::Short => format!("{}:{}", self.short_path(), self.line),
            CallerEncoding::Full => format!("{}:{}", self.file, self.line),
        }
    }
}

/// Everything about a record except its structured fields
#[derive(Clone, Debug)]
pub struct Entry {
    pub level: Level,
    pub time: DateTime<Local>,
    pub logger_name: Option<String>,
    pub message: String,
    pub caller: Option<Caller>,
    pub stack: Option<String>,
}

impl Entry {
    /// Entry stamped with the current time and no caller or stack
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            time: Local::now(),
            logger_name: None,
            message: message.into(),
            caller: None,
            stack: None,
        }
    }
}

/// Turns a record into the bytes written to a sink
pub trait Encoder: Send + Sync + fmt::Debug {
    /// Encode one record, including the trailing line ending
    fn encode(&self, entry: &Entry, fields: &[Field]) -> Result<Vec<u8>>;
}

/// Build the encoder variant `encoding` from `config`
pub fn build_encoder(encoding: Encoding, config: &EncoderConfig) -> Arc<dyn Encoder> {
    match encoding {
        Encoding::Console => Arc::new(ConsoleEncoder::new(config.clone())),
        Encoding::Json => Arc::new(JsonEncoder::new(config.clone())),
    }
}

/// Millisecond ISO8601, with `Z` for UTC and `+hhmm` otherwise
fn iso8601<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let stamp = time.format("%Y-%m-%dT%H:%M:%S%.3f");
    if time.offset().fix().local_minus_utc() == 0 {
        format!("{stamp}Z")
    } else {
        format!("{stamp}{}", time.format("%z"))
    }
}

fn encode_time(time: &DateTime<Local>, encoding: TimeEncoding) -> Value {
    match encoding {
        TimeEncoding::Iso8601 => Value::from(iso8601(time)),
        TimeEncoding::Rfc3339 => Value::from(time.to_rfc3339_opts(SecondsFormat::Secs, true)),
        TimeEncoding::Rfc3339Nano => {
            Value::from(time.to_rfc3339_opts(SecondsFormat::Nanos, true))
        }
        TimeEncoding::Epoch => {
            let secs = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9;
            Value::from(secs)
        }
        TimeEncoding::EpochMillis => {
            let millis = time.timestamp_millis() as f64
                + f64::from(time.timestamp_subsec_nanos() % 1_000_000) / 1e6;
            Value::from(millis)
        }
        TimeEncoding::EpochNanos => Value::from(time.timestamp_nanos_opt().unwrap_or_default()),
    }
}

fn encode_level(level: Level, encoding: LevelEncoding) -> &'static str {
    match encoding {
        LevelEncoding::Lowercase => level.as_str(),
        LevelEncoding::Capital => level.as_capital_str(),
    }
}

/// Strings print bare, everything else as compact JSON
fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Machine-readable encoder: one JSON object per record
#[derive(Clone, Debug)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, entry: &Entry, fields: &[Field]) -> Result<Vec<u8>> {
        let cfg = &self.config;
        let mut buf = Vec::with_capacity(256);
        {
            let mut serializer = serde_json::Serializer::new(&mut buf);
            let mut map = serializer.serialize_map(None)?;

            if !cfg.time_key.is_empty() {
                map.serialize_entry(&cfg.time_key, &encode_time(&entry.time, cfg.time_encoding))?;
            }
            if !cfg.level_key.is_empty() {
                map.serialize_entry(&cfg.level_key, encode_level(entry.level, cfg.level_encoding))?;
            }
            if let (Some(name), false) = (&entry.logger_name, cfg.name_key.is_empty()) {
                map.serialize_entry(&cfg.name_key, name)?;
            }
            if let Some(caller) = &entry.caller {
                if !cfg.caller_key.is_empty() {
                    map.serialize_entry(&cfg.caller_key, &caller.render(cfg.caller_encoding))?;
                }
                if let (Some(function), false) = (caller.function, cfg.function_key.is_empty()) {
                    map.serialize_entry(&cfg.function_key, function)?;
                }
            }
            if !cfg.message_key.is_empty() {
                map.serialize_entry(&cfg.message_key, &entry.message)?;
            }
            for field in fields {
                map.serialize_entry(field.key(), field.value())?;
            }
            if let (Some(stack), false) = (&entry.stack, cfg.stacktrace_key.is_empty()) {
                map.serialize_entry(&cfg.stacktrace_key, stack)?;
            }
            SerializeMap::end(map)?;
        }
        buf.extend_from_slice(cfg.line_ending.as_bytes());
        Ok(buf)
    }
}

/// Human-oriented encoder: separator-joined single line
#[derive(Clone, Debug)]
pub struct ConsoleEncoder {
    config: EncoderConfig,
}

impl ConsoleEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn fields_object(fields: &[Field]) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut buf);
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for field in fields {
            map.serialize_entry(field.key(), field.value())?;
        }
        SerializeMap::end(map)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Encoder for ConsoleEncoder {
    fn encode(&self, entry: &Entry, fields: &[Field]) -> Result<Vec<u8>> {
        let cfg = &self.config;
        let time = encode_time(&entry.time, cfg.time_encoding);
        let mut parts: Vec<Cow<'_, str>> = Vec::with_capacity(7);

        if !cfg.time_key.is_empty() {
            parts.push(value_text(&time));
        }
        if !cfg.level_key.is_empty() {
            parts.push(Cow::Borrowed(encode_level(entry.level, cfg.level_encoding)));
        }
        if let (Some(name), false) = (&entry.logger_name, cfg.name_key.is_empty()) {
            parts.push(Cow::Borrowed(name.as_str()));
        }
        if let Some(caller) = &entry.caller {
            if !cfg.caller_key.is_empty() {
                parts.push(Cow::Owned(caller.render(cfg.caller_encoding)));
            }
            if let (Some(function), false) = (caller.function, cfg.function_key.is_empty()) {
                parts.push(Cow::Borrowed(function));
            }
        }
        if !cfg.message_key.is_empty() {
            parts.push(Cow::Borrowed(entry.message.as_str()));
        }
        if !fields.is_empty() {
            parts.push(Cow::Owned(Self::fields_object(fields)?));
        }

        let mut line = parts.join(cfg.console_separator.as_str());
        if let (Some(stack), false) = (&entry.stack, cfg.stacktrace_key.is_empty()) {
            line.push('\n');
            line.push_str(stack.trim_end());
        }
        line.push_str(&cfg.line_ending);
        Ok(line.into_bytes())
    }
}
