#![forbid(unsafe_code)]

//! Process-wide structured logging with switchable output formats.
//!
//! This crate provides:
//! - Ordered severity levels and an atomically shared threshold
//! - Console and JSON encoders built from one editable field-name config
//! - Immutable loggers with caller capture, stack traces and escalation
//!   (DPanic, Panic, Fatal)
//! - A reconfigurable [`LogFacade`] and a process-wide instance behind
//!   free functions and macros
//! - A `tracing` layer forwarding events into a facade

pub mod error;
pub mod level;
pub mod field;
pub mod config;
pub mod encoder;
pub mod sink;
pub mod sampler;
pub mod pipeline;
pub mod logger;
pub mod facade;
pub mod global;
pub mod bridge;
mod callsite;
mod macros;

// Re-export commonly used types
pub use error::{Error, Result};
pub use level::{AtomicLevel, Level, DEFAULT_LOG_LEVEL};
pub use field::Field;
pub use config::{CallerEncoding, Config, EncoderConfig, Encoding, LevelEncoding, TimeEncoding};
pub use encoder::{Caller, ConsoleEncoder, Encoder, Entry, JsonEncoder};
pub use sink::{MemorySink, Sink, WriteSyncer};
pub use sampler::SamplingConfig;
pub use pipeline::Core;
pub use logger::{FatalHook, Logger, LoggerOption};
pub use facade::LogFacade;
pub use global::global;
pub use bridge::FacadeLayer;
