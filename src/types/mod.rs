//! Type definitions for hourtrack

mod error;
mod session;

pub use error::*;
pub use session::*;
