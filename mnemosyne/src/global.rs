//! Process-wide facade writing to standard output.
//!
//! These free functions are thin wrappers over [`global()`]; anything that
//! wants its own sink or configuration should own a [`LogFacade`] instead.

use crate::config::{EncoderConfig, Encoding};
use crate::logger::{Logger, LoggerOption};
use crate::sink::Sink;
use crate::{Field, Level, LogFacade, Result};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

static GLOBAL: Lazy<LogFacade> = Lazy::new(|| LogFacade::new(Sink::stdout()));

/// The process-wide facade, built on first use
pub fn global() -> &'static LogFacade {
    &GLOBAL
}

pub fn set_level(level: Level) {
    global().set_level(level);
}

pub fn level() -> Level {
    global().level()
}

pub fn use_json_encoder() {
    global().use_json_encoder();
}

pub fn use_console_encoder() {
    global().use_console_encoder();
}

pub fn encoding() -> Encoding {
    global().encoding()
}

pub fn enable_development_mode() {
    global().enable_development_mode();
}

pub fn encoder_config() -> EncoderConfig {
    global().encoder_config()
}

/// See [`LogFacade::edit_encoder_config`]
pub fn edit_encoder_config(edit: impl FnOnce(&mut EncoderConfig)) {
    global().edit_encoder_config(edit);
}

pub fn set_encoder_config(config: EncoderConfig) {
    global().set_encoder_config(config);
}

pub fn reset_encoder_configs() {
    global().reset_encoder_configs();
}

pub fn with_options(options: impl IntoIterator<Item = LoggerOption>) {
    global().with_options(options);
}

pub fn raw_logger() -> Arc<Logger> {
    global().raw_logger()
}

/// Flush buffered output; call before exiting
pub fn sync() -> Result<()> {
    global().sync()
}

macro_rules! global_leveled {
    ($($plain:ident, $formatted:ident, $structured:ident;)*) => {
        $(
            #[track_caller]
            pub fn $plain(message: impl fmt::Display) {
                global().$plain(message);
            }

            #[track_caller]
            pub fn $formatted(args: fmt::Arguments<'_>) {
                global().$formatted(args);
            }

            #[track_caller]
            pub fn $structured(message: &str, fields: &[Field]) {
                global().$structured(message, fields);
            }
        )*
    };
}

global_leveled! {
    debug, debugf, debugw;
    info, infof, infow;
    warn, warnf, warnw;
    error, errorf, errorw;
    dpanic, dpanicf, dpanicw;
    panic, panicf, panicw;
    fatal, fatalf, fatalw;
}
