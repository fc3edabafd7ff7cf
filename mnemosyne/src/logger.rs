//! Immutable loggers and the options that derive new ones.
//!
//! A [`Logger`] never changes after construction; applying options, naming
//! it or attaching context fields returns a new logger sharing the same
//! core. Every entry point is `#[track_caller]`, so the caller recorded for
//! a record is the first frame outside this crate.

use crate::encoder::{Caller, Entry};
use crate::pipeline::Core;
use crate::sampler::SamplingConfig;
use crate::sink::Sink;
use crate::{Error, Field, Level, Result};
use chrono::Local;
use std::backtrace::Backtrace;
use std::fmt;

/// What a Fatal record does once it has been written
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FatalHook {
    /// Terminate the process with exit code 1
    #[default]
    Exit,
    /// Panic the current thread instead
    Panic,
}

/// Adjustments applied by [`Logger::with_options`]
#[derive(Clone, Debug)]
pub enum LoggerOption {
    /// Record the caller's file and line
    WithCaller(bool),
    /// Attach a stack trace to records at or above this level
    AddStacktrace(Level),
    /// Make DPanic records panic after they are written
    Development,
    /// Context fields added to every record
    Fields(Vec<Field>),
    /// Rate-limit repeated messages
    Sampling(SamplingConfig),
    OnFatal(FatalHook),
    /// Where internal write failures are reported
    ErrorOutput(Sink),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terminal {
    Panic,
    Exit,
}

#[derive(Clone, Debug)]
pub struct Logger {
    core: Core,
    name: Option<String>,
    context: Vec<Field>,
    add_caller: bool,
    stack_level: Level,
    development: bool,
    on_fatal: FatalHook,
    error_output: Sink,
}

macro_rules! leveled_methods {
    ($($level:ident => $plain:ident, $formatted:ident, $structured:ident;)*) => {
        $(
            #[doc = concat!("Log `message` at ", stringify!($level), " level.")]
            #[track_caller]
            pub fn $plain(&self, message: impl fmt::Display) {
                self.log(Level::$level, message, &[]);
            }

            #[doc = concat!("Log `format_args!` output at ", stringify!($level), " level.")]
            #[track_caller]
            pub fn $formatted(&self, args: fmt::Arguments<'_>) {
                self.log(Level::$level, args, &[]);
            }

            #[doc = concat!("Log `message` with structured fields at ", stringify!($level), " level.")]
            #[track_caller]
            pub fn $structured(&self, message: &str, fields: &[Field]) {
                self.log(Level::$level, message, fields);
            }
        )*
    };
}

impl Logger {
    /// Bare logger: no caller, no stack traces, production DPanic behaviour
    pub fn new(core: Core) -> Self {
        Self {
            core,
            name: None,
            context: Vec::new(),
            add_caller: false,
            stack_level: Level::Invalid,
            development: false,
            on_fatal: FatalHook::Exit,
            error_output: Sink::stderr(),
        }
    }

    pub fn with_options(&self, options: impl IntoIterator<Item = LoggerOption>) -> Self {
        let mut logger = self.clone();
        for option in options {
            logger.apply(option);
        }
        logger
    }

    fn apply(&mut self, option: LoggerOption) {
        match option {
            LoggerOption::WithCaller(enabled) => self.add_caller = enabled,
            LoggerOption::AddStacktrace(level) => self.stack_level = level,
            LoggerOption::Development => self.development = true,
            LoggerOption::Fields(fields) => self.context.extend(fields),
            LoggerOption::Sampling(config) => self.core = self.core.with_sampling(config),
            LoggerOption::OnFatal(hook) => self.on_fatal = hook,
            LoggerOption::ErrorOutput(sink) => self.error_output = sink,
        }
    }

    /// Child logger; nested names are joined with `.`
    pub fn named(&self, name: &str) -> Self {
        let name = match &self.name {
            Some(parent) if !name.is_empty() => format!("{parent}.{name}"),
            Some(parent) => parent.clone(),
            None => name.to_string(),
        };
        Self {
            name: Some(name),
            ..self.clone()
        }
    }

    /// Child logger carrying extra context fields
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.with_options([LoggerOption::Fields(fields.into_iter().collect())])
    }

    pub(crate) fn with_core(&self, core: Core) -> Self {
        Self {
            core,
            ..self.clone()
        }
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn level(&self) -> Level {
        self.core.level()
    }

    pub fn is_development(&self) -> bool {
        self.development
    }

    pub fn stacktrace_level(&self) -> Level {
        self.stack_level
    }

    pub fn sync(&self) -> Result<()> {
        self.core.sync()
    }

    fn terminal(&self, level: Level) -> Option<Terminal> {
        match level {
            Level::DPanic if self.development => Some(Terminal::Panic),
            Level::Panic => Some(Terminal::Panic),
            Level::Fatal => match self.on_fatal {
                FatalHook::Exit => Some(Terminal::Exit),
                FatalHook::Panic => Some(Terminal::Panic),
            },
            _ => None,
        }
    }

    /// Whether a call at `level` does anything: it passes the threshold or
    /// it escalates regardless of the threshold
    pub fn will_handle(&self, level: Level) -> bool {
        self.core.enabled(level) || self.terminal(level).is_some()
    }

    /// Log at `level`, attributing the record to the caller
    #[track_caller]
    pub fn log(&self, level: Level, message: impl fmt::Display, fields: &[Field]) {
        if self.will_handle(level) {
            self.log_at(level, Caller::here(), message.to_string(), fields);
        }
    }

    /// Log with an explicit caller, then escalate as the level demands
    #[track_caller]
    pub fn log_at(&self, level: Level, caller: Caller, message: String, fields: &[Field]) {
        let terminal = self.terminal(level);
        let message = if self.core.check(level, &message) {
            self.write_entry(level, caller, message, fields)
        } else {
            message
        };

        match terminal {
            Some(Terminal::Panic) => panic!("{}", message),
            Some(Terminal::Exit) => std::process::exit(1),
            None => {}
        }
    }

    fn write_entry(&self, level: Level, caller: Caller, message: String, fields: &[Field]) -> String {
        let entry = Entry {
            level,
            time: Local::now(),
            logger_name: self.name.clone(),
            message,
            caller: self.add_caller.then(|| caller.resolve_function()),
            stack: (level >= self.stack_level).then(|| Backtrace::force_capture().to_string()),
        };

        let result = if self.context.is_empty() {
            self.core.write(&entry, fields)
        } else {
            let mut all = self.context.clone();
            all.extend_from_slice(fields);
            self.core.write(&entry, &all)
        };
        if let Err(err) = result {
            self.report_error(&err);
        }
        entry.message
    }

    fn report_error(&self, err: &Error) {
        let line = format!(
            "{} write error: {}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%z"),
            err
        );
        // Nowhere left to report a failing error output.
        let _ = self.error_output.write_record(line.as_bytes());
        let _ = self.error_output.sync();
    }

    leveled_methods! {
        Debug => debug, debugf, debugw;
        Info => info, infof, infow;
        Warn => warn, warnf, warnw;
        Error => error, errorf, errorw;
        DPanic => dpanic, dpanicf, dpanicw;
        Panic => panic, panicf, panicw;
        Fatal => fatal, fatalf, fatalw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncoderConfig;
    use crate::encoder::JsonEncoder;
    use crate::sink::{MemorySink, WriteSyncer};
    use crate::AtomicLevel;
    use serde_json::Value;
    use std::io;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;

    fn test_logger(level: Level) -> (Logger, MemorySink) {
        let memory = MemorySink::new();
        let core = Core::new(
            Arc::new(JsonEncoder::new(EncoderConfig::default())),
            memory.sink(),
            AtomicLevel::new(level),
        );
        let logger = Logger::new(core).with_options([
            LoggerOption::WithCaller(true),
            LoggerOption::AddStacktrace(Level::DPanic),
        ]);
        (logger, memory)
    }

    fn records(memory: &MemorySink) -> Vec<Value> {
        memory
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_three_call_shapes() {
        let (logger, memory) = test_logger(Level::Debug);
        logger.info("plain message");
        logger.infof(format_args!("{} + {} = {}", 1, 2, 1 + 2));
        logger.infow("structured", &[Field::new("user", "ada"), Field::new("attempt", 3)]);

        let records = records(&memory);
        assert_eq!(records[0]["message"], "plain message");
        assert_eq!(records[1]["message"], "1 + 2 = 3");
        assert_eq!(records[2]["message"], "structured");
        assert_eq!(records[2]["user"], "ada");
        assert_eq!(records[2]["attempt"], 3);
    }

    #[test]
    fn test_caller_is_the_call_site() {
        let (logger, memory) = test_logger(Level::Debug);
        logger.warn("first");
        let first_line = line!() - 1;
        logger.errorw("second", &[]);
        let second_line = line!() - 1;

        let records = records(&memory);
        assert_eq!(records[0]["caller"], format!("src/logger.rs:{first_line}"));
        assert_eq!(records[1]["caller"], format!("src/logger.rs:{second_line}"));
    }

    #[test]
    fn test_plain_calls_record_function() {
        let (logger, memory) = test_logger(Level::Debug);
        logger.warn("plain");
        logger.warnf(format_args!("formatted {}", 1));
        logger.warnw("structured", &[Field::new("k", 1)]);

        for record in records(&memory) {
            assert_eq!(
                record["function"],
                "mnemosyne::logger::tests::test_plain_calls_record_function"
            );
        }
    }

    #[test]
    fn test_caller_can_be_disabled() {
        let (logger, memory) = test_logger(Level::Debug);
        logger.with_options([LoggerOption::WithCaller(false)]).info("anonymous");
        assert!(records(&memory)[0].get("caller").is_none());
        assert!(records(&memory)[0].get("function").is_none());
    }

    #[test]
    fn test_disabled_levels_are_dropped() {
        let (logger, memory) = test_logger(Level::Warn);
        logger.debug("no");
        logger.info("no");
        logger.warn("yes");
        logger.error("yes");
        let records = records(&memory);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["message"] == "yes"));
    }

    #[test]
    fn test_stacktrace_threshold() {
        let (logger, memory) = test_logger(Level::Debug);
        logger.error("no stack");
        let _ = catch_unwind(AssertUnwindSafe(|| logger.panic("with stack")));

        let records = records(&memory);
        assert!(records[0].get("stacktrace").is_none());
        assert!(records[1]["stacktrace"].is_string());
    }

    #[test]
    fn test_dpanic_only_logs_in_production() {
        let (logger, memory) = test_logger(Level::Debug);
        let result = catch_unwind(AssertUnwindSafe(|| logger.dpanic("odd state")));
        assert!(result.is_ok());
        assert_eq!(records(&memory)[0]["level"], "dpanic");
    }

    #[test]
    fn test_dpanic_panics_in_development() {
        let (logger, memory) = test_logger(Level::Debug);
        let dev = logger.with_options([LoggerOption::Development]);
        assert!(dev.is_development());

        let result = catch_unwind(AssertUnwindSafe(|| dev.dpanicf(format_args!("bad {}", 7))));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("bad 7"));
        assert_eq!(records(&memory)[0]["message"], "bad 7");
    }

    #[test]
    fn test_panic_escalates_even_when_filtered() {
        let (logger, memory) = test_logger(Level::Invalid);
        let result = catch_unwind(AssertUnwindSafe(|| logger.panic("hidden")));
        assert!(result.is_err());
        assert!(memory.contents().is_empty());
    }

    #[test]
    fn test_fatal_hook_panic() {
        let (logger, memory) = test_logger(Level::Debug);
        let logger = logger.with_options([LoggerOption::OnFatal(FatalHook::Panic)]);
        let result = catch_unwind(AssertUnwindSafe(|| logger.fatalw("shutting down", &[])));
        assert!(result.is_err());
        assert_eq!(records(&memory)[0]["level"], "fatal");
    }

    #[test]
    fn test_named_and_context_fields() {
        let (logger, memory) = test_logger(Level::Debug);
        let child = logger
            .named("http")
            .named("client")
            .with([Field::new("request_id", "r-1")]);
        child.infow("sent", &[Field::new("bytes", 512)]);

        let record = &records(&memory)[0];
        assert_eq!(record["logger"], "http.client");
        assert_eq!(record["request_id"], "r-1");
        assert_eq!(record["bytes"], 512);
        assert_eq!(child.name(), Some("http.client"));
        assert_eq!(logger.name(), None);
    }

    #[test]
    fn test_sampling_option() {
        let (logger, memory) = test_logger(Level::Debug);
        let sampled = logger.with_options([LoggerOption::Sampling(SamplingConfig {
            tick_millis: 60_000,
            first: 3,
            thereafter: 0,
        })]);
        for _ in 0..10 {
            sampled.info("repeated");
        }
        assert_eq!(memory.lines().len(), 3);
    }

    struct Unwritable;

    impl io::Write for Unwritable {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl WriteSyncer for Unwritable {}

    #[test]
    fn test_write_failures_go_to_error_output() {
        let errors = MemorySink::new();
        let core = Core::new(
            Arc::new(JsonEncoder::new(EncoderConfig::default())),
            Sink::new("unwritable", Unwritable),
            AtomicLevel::new(Level::Debug),
        );
        let logger = Logger::new(core).with_options([LoggerOption::ErrorOutput(errors.sink())]);

        logger.error("lost");
        let reported = errors.contents();
        assert!(reported.contains("write error"));
        assert!(reported.contains("disk gone"));
    }
}
