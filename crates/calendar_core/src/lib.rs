pub mod date;
pub mod engine;
pub mod error;
pub mod future;
pub mod grid;
pub mod occurrence;
pub mod recurrence;
pub mod reminder;
pub mod snapshot;

pub use crate::engine::CalendarEngine;
pub use crate::error::{CalendarError, Result};
