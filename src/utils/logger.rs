use anyhow::Result;
use colored::{Color, Colorize};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Console color for each log level
pub fn level_color(level: Level) -> Color {
    match level {
        Level::TRACE | Level::DEBUG => Color::BrightBlack,
        Level::INFO => Color::Green,
        Level::WARN => Color::Yellow,
        Level::ERROR => Color::Red,
    }
}

/// Prints the bare message, colored by level; errors are bold
struct LevelColorFormat;

impl<S, N> FormatEvent<S, N> for LevelColorFormat
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
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let level = *event.metadata().level();
        let painted = message.color(level_color(level));
        if level == Level::ERROR {
            writeln!(writer, "{}", painted.bold())
        } else {
            writeln!(writer, "{}", painted)
        }
    }
}

/// Initialize the logging system. `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool) -> Result<()> {
    let default = if verbose {
        "codeql_agent=debug,warn"
    } else {
        "codeql_agent=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(LevelColorFormat),
        )
        .init();

    Ok(())
}
