//! Route `tracing` events through a facade.
//!
//! Libraries instrumented with `tracing` end up in the same sink, with the
//! same encoder and level, as direct facade calls.

use crate::encoder::Caller;
use crate::{Error, Field, Level, LogFacade, Result};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field as TracingField, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Level::Error
        } else if level == tracing::Level::WARN {
            Level::Warn
        } else if level == tracing::Level::INFO {
            Level::Info
        } else {
            Level::Debug
        }
    }
}

/// Collects an event's message and fields.
#[derive(Debug, Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<Field>,
}

impl EventVisitor {
    fn push(&mut self, field: &TracingField, value: Value) {
        let name = field.name();
        let name = name.strip_prefix("r#").unwrap_or(name);
        self.fields.push(Field::new(name, value));
    }
}

impl Visit for EventVisitor {
    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::from(value));
        }
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            // Skip fields which are already handled
            name if name.starts_with("log.") => (),
            _ => self.push(field, Value::from(format!("{value:?}"))),
        }
    }
}

#[derive(Clone, Debug)]
enum Target {
    Global,
    Owned(Arc<LogFacade>),
}

/// `tracing_subscriber` layer writing every event through a [`LogFacade`]
#[derive(Clone, Debug)]
pub struct FacadeLayer {
    target: Target,
}

impl FacadeLayer {
    /// Layer feeding the process-wide facade
    pub fn global() -> Self {
        Self {
            target: Target::Global,
        }
    }

    pub fn new(facade: Arc<LogFacade>) -> Self {
        Self {
            target: Target::Owned(facade),
        }
    }

    fn facade(&self) -> &LogFacade {
        match &self.target {
            Target::Global => crate::global(),
            Target::Owned(facade) => facade.as_ref(),
        }
    }
}

impl<S: Subscriber> Layer<S> for FacadeLayer {
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // The facade level can change at runtime, so never cache a verdict.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.facade().will_handle(Level::from(*metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        visitor.fields.push(Field::new("target", metadata.target()));

        let caller = Caller::new(
            metadata.file().unwrap_or("<unknown>"),
            metadata.line().unwrap_or(0),
            0,
            None,
        );
        self.facade().log_at(
            Level::from(*metadata.level()),
            caller,
            visitor.message.unwrap_or_default(),
            &visitor.fields,
        );
    }
}

/// Install the process-wide facade as the global `tracing` subscriber
pub fn init() -> Result<()> {
    install(FacadeLayer::global())
}

/// Install `facade` as the global `tracing` subscriber
pub fn init_with(facade: Arc<LogFacade>) -> Result<()> {
    install(FacadeLayer::new(facade))
}

fn install(layer: FacadeLayer) -> Result<()> {
    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| Error::Subscriber(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn json_facade(level: Level) -> (Arc<LogFacade>, MemorySink) {
        let memory = MemorySink::new();
        let facade = Arc::new(LogFacade::new(memory.sink()));
        facade.use_json_encoder();
        facade.set_level(level);
        (facade, memory)
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(tracing::Level::DEBUG), Level::Debug);
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert_eq!(Level::from(tracing::Level::ERROR), Level::Error);
    }

    #[test]
    fn test_events_are_forwarded() {
        let (facade, memory) = json_facade(Level::Info);
        let subscriber = tracing_subscriber::registry().with(FacadeLayer::new(facade.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("filtered out");
            tracing::warn!(count = 3, sku = "A-17", "low stock");
        });

        let lines = memory.lines();
        assert_eq!(lines.len(), 1);
        let record: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(record["level"], "warn");
        assert_eq!(record["message"], "low stock");
        assert_eq!(record["count"], 3);
        assert_eq!(record["sku"], "A-17");
        assert_eq!(record["target"], "mnemosyne::bridge::tests");
        assert!(record["caller"].as_str().unwrap().starts_with("src/bridge.rs:"));
    }

    #[test]
    fn test_level_changes_apply_to_tracing_events() {
        let (facade, memory) = json_facade(Level::Error);
        let subscriber = tracing_subscriber::registry().with(FacadeLayer::new(facade.clone()));

        tracing::subscriber::with_default(subscriber, || {
            for level in [Level::Error, Level::Info] {
                facade.set_level(level);
                tracing::info!("attempt");
            }
        });

        assert_eq!(memory.lines().len(), 1);
    }
}
