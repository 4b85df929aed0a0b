mod report;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use hourtrack::parsers::{ParsedLog, SessionLogParser};
use hourtrack::services::appender::parse_end_time;
use hourtrack::services::formatting::format_hours_decimal;
use hourtrack::services::{Aggregator, Config, FallbackResolver, SessionAppender};
use hourtrack::types::{AggregateOptions, AggregateResult, SessionRecord};

use report::Selection;

/// Progress tracker for logged study and streaming sessions
#[derive(Parser)]
#[command(name = "hourtrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Session log CSV (overrides config and HOURTRACK_FILE)
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Config file (default: ~/.hourtrack/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show overall statistics (default)
    Summary {
        /// Output the full aggregate as JSON
        #[arg(long)]
        json: bool,
    },

    /// List months, optionally expanding one month and one day
    Months {
        /// Month to expand (YYYY-MM)
        #[arg(long)]
        month: Option<String>,

        /// Day to expand (YYYY-MM-DD)
        #[arg(long)]
        day: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent sessions
    Recent {
        /// Number of sessions (default from config)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the weekly cumulative series
    Cumulative {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append a session for a recorded video
    Add {
        /// Video URL (watch, youtu.be or live link)
        url: String,

        /// When the session ended, local time (default: now)
        #[arg(long, value_name = "YYYY-MM-DDTHH:MM:SS")]
        end: Option<String>,
    },
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(file) = self.file {
            config.sessions_file = file;
        }
        debug!(path = %config.sessions_file.display(), "using session log");

        let mut out = io::stdout().lock();
        match self.command.unwrap_or(Commands::Summary { json: false }) {
            Commands::Summary { json } => {
                let loaded = load_aggregate(&config, config.recent_count);
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&loaded.result)?)?;
                } else {
                    report::render_summary(
                        &mut out,
                        &loaded.result,
                        loaded.unparsed_rows,
                        config.goal_hours,
                    )?;
                }
                Ok(())
            }
            Commands::Months { month, day, json } => {
                let selection =
                    Selection::parse(month.as_deref(), day.as_deref()).map_err(anyhow::Error::msg)?;
                let result = load_aggregate(&config, config.recent_count).result;
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&result.months)?)?;
                } else {
                    report::render_months(&mut out, &result, &selection)?;
                }
                Ok(())
            }
            Commands::Recent { count, json } => {
                let result = load_aggregate(&config, count.unwrap_or(config.recent_count)).result;
                if json {
                    writeln!(
                        out,
                        "{}",
                        serde_json::to_string_pretty(&result.recent_sessions)?
                    )?;
                } else {
                    report::render_recent(&mut out, &result.recent_sessions)?;
                }
                Ok(())
            }
            Commands::Cumulative { json } => {
                let result = load_aggregate(&config, config.recent_count).result;
                if json {
                    writeln!(
                        out,
                        "{}",
                        serde_json::to_string_pretty(&result.cumulative_series)?
                    )?;
                } else {
                    report::render_cumulative(
                        &mut out,
                        &result.cumulative_series,
                        config.goal_hours,
                    )?;
                }
                Ok(())
            }
            Commands::Add { url, end } => {
                let end = end.as_deref().map(parse_end_time).transpose()?;
                let appender = SessionAppender::new(
                    config.sessions_file.clone(),
                    Box::new(FallbackResolver::from_config(&config)),
                );
                writeln!(out, "Fetching video metadata...")?;
                out.flush()?;
                let record = appender
                    .append(&url, end)
                    .with_context(|| format!("Failed to append to {}", appender.path().display()))?;
                write!(out, "{}", render_appended(&record))?;
                Ok(())
            }
        }
    }
}

/// Aggregate plus the rows the parser had to drop
struct LoadedLog {
    result: AggregateResult,
    unparsed_rows: u64,
}

/// Parse and aggregate the session log.
/// An unreadable log renders as empty with a visible error, never a crash.
fn load_aggregate(config: &Config, recent_count: usize) -> LoadedLog {
    let parser = SessionLogParser::with_path(&config.sessions_file);
    let parsed = parser.parse().unwrap_or_else(|e| {
        error!(path = %parser.path().display(), error = %e, "failed to load session data");
        eprintln!("error: failed to load session data ({})", e);
        ParsedLog::default()
    });

    LoadedLog {
        result: Aggregator::aggregate(&parsed.records, &AggregateOptions { recent_count }),
        unparsed_rows: parsed.skipped_rows,
    }
}

fn render_appended(record: &SessionRecord) -> String {
    format!(
        "Appended new row ({}h):\n{}\n",
        format_hours_decimal(record.hours),
        record.to_log_fields().join(",")
    )
}
