//! Forwarding of log events to a log store, enriched with the attributes of the scope bound to
//! the current context.

use std::{
    collections::BTreeMap,
    fmt,
    io::Write,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use scoped_attributes::{Context, ScopeContextExt};
use serde::Serialize;
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{layer, Layer};

#[derive(Debug, thiserror::Error)]
pub enum LogSinkError {
    #[error("failed to serialize log group: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write log group: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogContent {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Seconds since the unix epoch.
    pub time: u64,
    pub contents: Vec<LogContent>,
}

impl LogRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.contents
            .iter()
            .find(|content| content.key == key)
            .map(|content| content.value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.contents.iter().map(|content| content.key.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogGroup {
    pub topic: String,
    pub source: String,
    pub logs: Vec<LogRecord>,
}

pub trait LogSink: Send + Sync {
    fn send(&self, group: LogGroup) -> Result<(), LogSinkError>;
}

/// Writes every group as one JSON line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn send(&self, group: LogGroup) -> Result<(), LogSinkError> {
        let mut line = serde_json::to_vec(&group)?;
        line.push(b'\n');

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&line)?;
        Ok(())
    }
}

/// Keeps every group in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    groups: Arc<Mutex<Vec<LogGroup>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> Vec<LogGroup> {
        self.groups.lock().clone()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.groups
            .lock()
            .iter()
            .flat_map(|group| group.logs.iter().cloned())
            .collect()
    }
}

impl LogSink for InMemorySink {
    fn send(&self, group: LogGroup) -> Result<(), LogSinkError> {
        self.groups.lock().push(group);
        Ok(())
    }
}

pub struct ScopedLogLayer {
    topic: String,
    source: String,
    sink: Arc<dyn LogSink>,
}

impl ScopedLogLayer {
    pub fn new(
        topic: impl Into<String>,
        source: impl Into<String>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            topic: topic.into(),
            source: source.into(),
            sink,
        }
    }

    fn record(&self, event: &Event<'_>) -> LogRecord {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let level = level_str(event.metadata().level());
        let mut contents = vec![
            content("level", level),
            content("severityText", level),
            content("content", visitor.message.unwrap_or_default()),
        ];

        if let Some(scope) = Context::current().attribute_scope() {
            let sorted: BTreeMap<_, _> = scope.get_all().into_iter().collect();
            contents.extend(sorted.into_iter().map(|(key, value)| LogContent { key, value }));
        }

        contents.extend(visitor.fields);

        LogRecord {
            time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default(),
            contents,
        }
    }
}

impl<S> Layer<S> for ScopedLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        let group = LogGroup {
            topic: self.topic.clone(),
            source: self.source.clone(),
            logs: vec![self.record(event)],
        };

        // A failing sink must never fail the code that logs.
        let _ = self.sink.send(group);
    }
}

fn content(key: &str, value: impl Into<String>) -> LogContent {
    LogContent {
        key: key.to_string(),
        value: value.into(),
    }
}

fn level_str(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<LogContent>,
}

impl EventVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push(content(field.name(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }
}
