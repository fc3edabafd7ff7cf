//! Per-message rate limiting.
//!
//! Records are bucketed by level and a hash of their message. Within each
//! tick the first `first` records of a bucket pass, after that only every
//! `thereafter`-th one does.

use crate::Level;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

const COUNTERS_PER_LEVEL: usize = 4096;

/// Sampling parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub tick_millis: u64,
    pub first: u64,
    /// Zero drops everything past `first` until the next tick
    pub thereafter: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            tick_millis: 1000,
            first: 100,
            thereafter: 100,
        }
    }
}

#[derive(Default)]
struct Counter {
    reset_at: AtomicI64,
    count: AtomicU64,
}

impl Counter {
    /// Count one record, starting a fresh window once `now` passes the reset time
    fn inc_check_reset(&self, now: i64, tick: i64) -> u64 {
        let reset_at = self.reset_at.load(Ordering::Acquire);
        if reset_at > now {
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }

        self.count.store(1, Ordering::Release);
        if self
            .reset_at
            .compare_exchange(reset_at, now + tick, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Another thread opened the window first.
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }
        1
    }
}

pub(crate) struct Sampler {
    config: SamplingConfig,
    started: Instant,
    counters: Box<[Counter]>,
}

impl Sampler {
    pub(crate) fn new(config: SamplingConfig) -> Self {
        let counters = (0..Level::ALL.len() * COUNTERS_PER_LEVEL)
            .map(|_| Counter::default())
            .collect();
        Self {
            config,
            started: Instant::now(),
            counters,
        }
    }

    pub(crate) fn config(&self) -> SamplingConfig {
        self.config
    }

    /// Whether a record at `level` with `message` should be written
    pub(crate) fn check(&self, level: Level, message: &str) -> bool {
        self.check_at(level, message, self.started.elapsed())
    }

    fn check_at(&self, level: Level, message: &str, elapsed: Duration) -> bool {
        if level == Level::Invalid {
            return false;
        }
        let slot = level.index() * COUNTERS_PER_LEVEL
            + (fnv32a(message) as usize % COUNTERS_PER_LEVEL);
        let now = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
        let tick = i64::try_from(self.config.tick_millis.saturating_mul(1_000_000)).unwrap_or(i64::MAX);

        let n = self.counters[slot].inc_check_reset(now, tick);
        if n <= self.config.first {
            return true;
        }
        self.config.thereafter > 0 && (n - self.config.first) % self.config.thereafter == 0
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler").field("config", &self.config).finish()
    }
}

fn fnv32a(s: &str) -> u32 {
    const OFFSET: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    s.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(PRIME))
}
