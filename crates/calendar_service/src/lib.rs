pub mod config;
pub mod logging;
pub mod notifications;
pub mod request;
pub mod service;
pub mod store;

pub use crate::service::{CalendarService, CalendarServiceBuilder};
