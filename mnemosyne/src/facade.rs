//! The reconfigurable logging context.
//!
//! A [`LogFacade`] owns the shared level, the two prebuilt encoders, the
//! mutable encoder configuration and the active [`Logger`]. Logging calls
//! load one snapshot of the active logger; reconfiguration builds a complete
//! replacement and publishes it with a single atomic swap, so a call in
//! flight sees either the old logger or the new one, never a mixture.

use crate::config::{Config, EncoderConfig, Encoding};
use crate::encoder::{build_encoder, Caller, Encoder};
use crate::logger::{Logger, LoggerOption};
use crate::pipeline::Core;
use crate::sink::Sink;
use crate::{AtomicLevel, Field, Level, Result};
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Encoders {
    json: Arc<dyn Encoder>,
    console: Arc<dyn Encoder>,
    selected: Encoding,
}

impl Encoders {
    fn build(config: &EncoderConfig, selected: Encoding) -> Self {
        Self {
            json: build_encoder(Encoding::Json, config),
            console: build_encoder(Encoding::Console, config),
            selected,
        }
    }

    fn active(&self) -> Arc<dyn Encoder> {
        match self.selected {
            Encoding::Json => Arc::clone(&self.json),
            Encoding::Console => Arc::clone(&self.console),
        }
    }
}

#[derive(Debug)]
pub struct LogFacade {
    level: AtomicLevel,
    encoder_config: Mutex<EncoderConfig>,
    encoders: Mutex<Encoders>,
    logger: ArcSwap<Logger>,
}

macro_rules! forward_leveled {
    ($($plain:ident, $formatted:ident, $structured:ident;)*) => {
        $(
            #[track_caller]
            pub fn $plain(&self, message: impl fmt::Display) {
                self.logger.load().$plain(message);
            }

            #[track_caller]
            pub fn $formatted(&self, args: fmt::Arguments<'_>) {
                self.logger.load().$formatted(args);
            }

            #[track_caller]
            pub fn $structured(&self, message: &str, fields: &[Field]) {
                self.logger.load().$structured(message, fields);
            }
        )*
    };
}

impl LogFacade {
    /// Facade with the default configuration: Warn level, console encoding,
    /// caller capture and stack traces from DPanic up
    pub fn new(sink: Sink) -> Self {
        Self::from_config(&Config::default(), sink)
    }

    pub fn from_config(config: &Config, sink: Sink) -> Self {
        let level = AtomicLevel::new(config.level);
        let encoders = Encoders::build(&config.encoder, config.encoding);
        let core = Core::new(encoders.active(), sink, level.clone());

        let mut options = vec![LoggerOption::WithCaller(!config.disable_caller)];
        if !config.disable_stacktrace {
            let threshold = if config.development {
                Level::Error
            } else {
                Level::DPanic
            };
            options.push(LoggerOption::AddStacktrace(threshold));
        }
        if config.development {
            options.push(LoggerOption::Development);
        }
        if let Some(sampling) = config.sampling {
            options.push(LoggerOption::Sampling(sampling));
        }

        Self {
            level,
            encoder_config: Mutex::new(config.encoder.clone()),
            encoders: Mutex::new(encoders),
            logger: ArcSwap::from_pointee(Logger::new(core).with_options(options)),
        }
    }

    fn lock_encoders(&self) -> MutexGuard<'_, Encoders> {
        self.encoders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flush what was accepted under the old threshold, then apply the new one
    pub fn set_level(&self, level: Level) {
        let _ = self.sync();
        self.level.set_level(level);
    }

    pub fn level(&self) -> Level {
        self.level.level()
    }

    /// Handle to the shared threshold
    pub fn atomic_level(&self) -> AtomicLevel {
        self.level.clone()
    }

    pub fn use_json_encoder(&self) {
        self.use_encoder(Encoding::Json);
    }

    pub fn use_console_encoder(&self) {
        self.use_encoder(Encoding::Console);
    }

    /// Switch encoders. Level, sink, name, context fields and logger
    /// options carry over to the new logger.
    pub fn use_encoder(&self, encoding: Encoding) {
        let mut encoders = self.lock_encoders();
        encoders.selected = encoding;
        self.activate(&encoders);
    }

    pub fn encoding(&self) -> Encoding {
        self.lock_encoders().selected
    }

    fn activate(&self, encoders: &Encoders) {
        let encoder = encoders.active();
        self.logger.rcu(|current| {
            current.with_core(current.core().with_encoder(Arc::clone(&encoder)))
        });
    }

    /// Stack traces from Error up, and DPanic records panic. Not for production.
    pub fn enable_development_mode(&self) {
        self.with_options([
            LoggerOption::AddStacktrace(Level::Error),
            LoggerOption::Development,
        ]);
    }

    fn lock_encoder_config(&self) -> MutexGuard<'_, EncoderConfig> {
        self.encoder_config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the editable encoder configuration
    pub fn encoder_config(&self) -> EncoderConfig {
        self.lock_encoder_config().clone()
    }

    /// Edit the encoder configuration in place.
    ///
    /// Edits only reach the output after [`reset_encoder_configs`] runs. The
    /// closure works on a copy, so it may call back into the facade.
    ///
    /// [`reset_encoder_configs`]: LogFacade::reset_encoder_configs
    pub fn edit_encoder_config(&self, edit: impl FnOnce(&mut EncoderConfig)) {
        let mut config = self.encoder_config();
        edit(&mut config);
        *self.lock_encoder_config() = config;
    }

    /// Replace the encoder configuration; applied by the next reset
    pub fn set_encoder_config(&self, config: EncoderConfig) {
        *self.lock_encoder_config() = config;
    }

    /// Rebuild both encoders from the current configuration and put the
    /// selected one into service
    pub fn reset_encoder_configs(&self) {
        let config = self.encoder_config();
        let mut encoders = self.lock_encoders();
        let selected = encoders.selected;
        *encoders = Encoders::build(&config, selected);
        self.activate(&encoders);
    }

    /// Replace the active logger with one carrying additional options
    pub fn with_options(&self, options: impl IntoIterator<Item = LoggerOption>) {
        let options: Vec<LoggerOption> = options.into_iter().collect();
        self.logger
            .rcu(|current| current.with_options(options.iter().cloned()));
    }

    /// Snapshot of the active logger for direct use
    pub fn raw_logger(&self) -> Arc<Logger> {
        self.logger.load_full()
    }

    pub fn sync(&self) -> Result<()> {
        self.logger.load().sync()
    }

    pub fn will_handle(&self, level: Level) -> bool {
        self.logger.load().will_handle(level)
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl fmt::Display, fields: &[Field]) {
        self.logger.load().log(level, message, fields);
    }

    #[track_caller]
    pub fn log_at(&self, level: Level, caller: Caller, message: String, fields: &[Field]) {
        self.logger.load().log_at(level, caller, message, fields);
    }

    forward_leveled! {
        debug, debugf, debugw;
        info, infof, infow;
        warn, warnf, warnw;
        error, errorf, errorw;
        dpanic, dpanicf, dpanicw;
        panic, panicf, panicw;
        fatal, fatalf, fatalw;
    }
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new(Sink::stdout())
    }
}
