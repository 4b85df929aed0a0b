//! Services for session aggregation, formatting and log maintenance

pub mod aggregator;
pub mod appender;
pub mod config;
pub mod formatting;
pub mod metadata;

pub use aggregator::Aggregator;
pub use appender::SessionAppender;
pub use config::Config;
pub use formatting::{format_hours, format_hours_decimal, month_label};
pub use metadata::{FallbackResolver, VideoMetadataResolver};
