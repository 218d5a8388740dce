use colored::Color;
use std::fmt;
use std::fmt::Write;
use std::fmt::{Debug, Display};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// `[time LVL] target@trace_id{span fields}: message`
pub(super) struct Formatter {
    use_colors: bool,
}

impl Formatter {
    pub(super) fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let now = chrono::Local::now();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut trace_id = String::new();
        let mut span_fields = String::new();
        for span in ctx
            .event_scope()
            .into_iter()
            .flat_map(tracing_subscriber::registry::Scope::from_root)
        {
            let exts = span.extensions();
            let Some(fields) = exts.get::<FormattedFields<N>>() else {
                continue;
            };
            if fields.is_empty() {
                continue;
            }
            if let Some(id) = fields.strip_prefix("trace_id=") {
                write!(trace_id, "@{}", id)?;
                continue;
            }
            span_fields.push_str(if span_fields.is_empty() { "{" } else { " " });
            span_fields.push_str(fields);
        }
        if !span_fields.is_empty() {
            span_fields.push('}');
        }
        let target = meta.target().replace("doorstep", "ds");

        if self.use_colors {
            write!(
                writer,
                "[{} {}] {}",
                Colored(Color::BrightBlack, now.format("%X%.3f")),
                LevelTag::colored(meta.level()),
                Colored(
                    Color::BrightBlack,
                    format!("{target}{trace_id}{span_fields}:")
                ),
            )?;
        } else {
            write!(
                writer,
                "{} {}{}{} {}",
                now.format("%F %X%.3f"),
                target,
                trace_id,
                span_fields,
                LevelTag::plain(meta.level()),
            )?;
        }
        writeln!(writer, " {}{}", visitor.message, visitor.fields)
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

struct LevelTag {
    label: &'static str,
    color: Option<Color>,
}

impl LevelTag {
    fn colored(level: &Level) -> Self {
        let (label, color) = match *level {
            Level::ERROR => ("ERR", Color::BrightRed),
            Level::WARN => ("WRN", Color::BrightYellow),
            Level::INFO => ("INF", Color::BrightBlue),
            Level::DEBUG => ("DBG", Color::BrightMagenta),
            Level::TRACE => ("TRC", Color::BrightWhite),
        };
        Self {
            label,
            color: Some(color),
        }
    }
    fn plain(level: &Level) -> Self {
        let label = match *level {
            Level::ERROR => "[E]",
            Level::WARN => "[W]",
            Level::INFO => "[I]",
            Level::DEBUG => "[D]",
            Level::TRACE => "[T]",
        };
        Self { label, color: None }
    }
}

impl Display for LevelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color {
            Some(color) => write!(f, "{}", Colored(color, self.label)),
            None => f.write_str(self.label),
        }
    }
}

struct Colored<T>(Color, T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x1B[{}m{}\x1B[0m", self.0.to_fg_str(), self.1)
    }
}
