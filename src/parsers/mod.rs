//! Parsers for session log files

mod session_log;

pub use session_log::{ParsedLog, RawSessionRow, SessionLogParser};
