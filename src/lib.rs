//! hourtrack: progress tracking for logged study and streaming sessions

pub mod parsers;
pub mod services;
pub mod types;
