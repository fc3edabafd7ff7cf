//! The encoder + sink + level triple every logger writes through.

use crate::encoder::{Encoder, Entry};
use crate::sampler::{Sampler, SamplingConfig};
use crate::sink::Sink;
use crate::{AtomicLevel, Field, Level, Result};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Core {
    encoder: Arc<dyn Encoder>,
    sink: Sink,
    level: AtomicLevel,
    sampler: Option<Arc<Sampler>>,
}

impl Core {
    pub fn new(encoder: Arc<dyn Encoder>, sink: Sink, level: AtomicLevel) -> Self {
        Self {
            encoder,
            sink,
            level,
            sampler: None,
        }
    }

    pub fn level(&self) -> Level {
        self.level.level()
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.level.enabled(level)
    }

    /// Level check followed by the sampler, if any
    pub fn check(&self, level: Level, message: &str) -> bool {
        self.enabled(level)
            && self
                .sampler
                .as_ref()
                .map_or(true, |sampler| sampler.check(level, message))
    }

    /// Encode and write one record. Records above Error are synced straight away.
    pub fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        let record = self.encoder.encode(entry, fields)?;
        self.sink.write_record(&record)?;
        if entry.level > Level::Error {
            self.sink.sync()?;
        }
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.sink.sync()
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Same sink, level and sampling, different encoder
    pub fn with_encoder(&self, encoder: Arc<dyn Encoder>) -> Self {
        Self {
            encoder,
            ..self.clone()
        }
    }

    pub(crate) fn with_sampling(&self, config: SamplingConfig) -> Self {
        Self {
            sampler: Some(Arc::new(Sampler::new(config))),
            ..self.clone()
        }
    }

    pub fn sampling(&self) -> Option<SamplingConfig> {
        self.sampler.as_ref().map(|sampler| sampler.config())
    }
}
