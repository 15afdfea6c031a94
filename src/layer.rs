use crate::formatter::JsonFormatter;
use crate::record::{FieldValue, Fields, Level, LogRecord};
use chrono::Utc;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that renders every event as a JSON line
/// using [`JsonFormatter`] and writes it through a [`MakeWriter`].
///
/// Events more verbose than `max_level` are skipped. Formatting and write
/// failures, and user fields lost to a reserved-key collision, are
/// reported on stderr and counted; they never reach the application.
pub struct JsonLayer<W> {
    formatter: JsonFormatter,
    make_writer: W,
    max_level: Level,
    /// Lines successfully written.
    pub written_events: Arc<AtomicU64>,
    /// Events dropped because they could not be formatted or written.
    pub dropped_events: Arc<AtomicU64>,
    /// User `fields.*` values overwritten by a renamed reserved field.
    pub collision_events: Arc<AtomicU64>,
}

impl<W> JsonLayer<W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    /// Create a layer emitting every level up to and including `info`.
    pub fn new(formatter: JsonFormatter, make_writer: W) -> Self {
        Self {
            formatter,
            make_writer,
            max_level: Level::Info,
            written_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
            collision_events: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_max_level(mut self, max_level: Level) -> Self {
        self.max_level = max_level;
        self
    }

    fn write_line(&self, line: &[u8]) {
        let mut writer = self.make_writer.make_writer();
        match writer.write_all(line) {
            Ok(()) => {
                self.written_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("failed to write log line: {}", e);
            }
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = Level::from(*event.metadata().level());
        if level > self.max_level {
            return;
        }

        let mut fields = Fields::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Utc::now().into(),
            level,
            message: message.unwrap_or_default(),
            fields,
        };

        match self.formatter.format_merged(&record) {
            Ok(formatted) => {
                // tracing drops events emitted from inside a layer
                for collision in &formatted.collisions {
                    self.collision_events.fetch_add(1, Ordering::Relaxed);
                    eprintln!(
                        "log field {:?} overwritten by renamed reserved field {:?}; discarded value: {:?}",
                        collision.renamed, collision.key, collision.discarded
                    );
                }
                self.write_line(&formatted.line);
            }
            Err(e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("dropping log record: {}", e);
            }
        }
    }
}

/// Collects event fields into [`Fields`], routing `message` separately.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Fields,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.insert(field, FieldValue::Str(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, FieldValue::Int(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, FieldValue::UInt(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, FieldValue::Float(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, FieldValue::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        // The borrowed error cannot be kept; its description is all that
        // ends up in the output anyway.
        self.insert(field, FieldValue::error(DescribedError(value.to_string())));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, FieldValue::Str(format!("{:?}", value)));
        }
    }
}

/// Owned stand-in for an error borrowed from a tracing event.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
struct DescribedError(String);
