use std::path::PathBuf;

use tracing::warn;

const MAX_PRELOAD_YEARS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub store_path: PathBuf,
    /// Years generated on each side of the current year at startup.
    pub preload_years: u32,
    /// Notification hour for reminders without a time range.
    pub notify_hour: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("calendar.json"),
            preload_years: 0,
            notify_hour: 9,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unusable values keep
    /// the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("CALENDAR_STORE_PATH") {
            if !path.trim().is_empty() {
                config.store_path = PathBuf::from(path.trim());
            }
        }
        if let Some(value) = lookup("CALENDAR_PRELOAD_YEARS") {
            match value.trim().parse::<u32>() {
                Ok(years) => config.preload_years = years.min(MAX_PRELOAD_YEARS),
                Err(err) => warn!(%value, %err, "ignoring CALENDAR_PRELOAD_YEARS"),
            }
        }
        if let Some(value) = lookup("CALENDAR_NOTIFY_HOUR") {
            match value.trim().parse::<u32>() {
                Ok(hour) if hour < 24 => config.notify_hour = hour,
                Ok(hour) => warn!(hour, "CALENDAR_NOTIFY_HOUR out of range"),
                Err(err) => warn!(%value, %err, "ignoring CALENDAR_NOTIFY_HOUR"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CALENDAR_STORE_PATH", "/tmp/tab/calendar.json"),
            ("CALENDAR_PRELOAD_YEARS", "2"),
            ("CALENDAR_NOTIFY_HOUR", "7"),
        ]));
        assert_eq!(config.store_path, PathBuf::from("/tmp/tab/calendar.json"));
        assert_eq!(config.preload_years, 2);
        assert_eq!(config.notify_hour, 7);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CALENDAR_PRELOAD_YEARS", "lots"),
            ("CALENDAR_NOTIFY_HOUR", "25"),
            ("CALENDAR_STORE_PATH", "  "),
        ]));
        assert_eq!(config, ServiceConfig::default());

        let capped = ServiceConfig::from_lookup(lookup(&[("CALENDAR_PRELOAD_YEARS", "500")]));
        assert_eq!(capped.preload_years, MAX_PRELOAD_YEARS);
    }
}
