use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calendar_core::snapshot::CalendarSnapshot;
use parking_lot::Mutex;

/// Persistence for reminder rules and the future queue. Implementations never
/// see the materialised grid.
pub trait ReminderStore: Send + Sync {
    fn load(&self) -> Result<CalendarSnapshot>;
    fn save(&self, snapshot: &CalendarSnapshot) -> Result<()>;
}

/// Stores the snapshot as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReminderStore for JsonFileStore {
    fn load(&self) -> Result<CalendarSnapshot> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no reminder store yet, starting empty");
            return Ok(CalendarSnapshot::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading reminder store `{}`", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(CalendarSnapshot::default());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing reminder store `{}`", self.path.display()))
    }

    fn save(&self, snapshot: &CalendarSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("creating reminder store directory `{}`", parent.display())
                })?;
            }
        }
        let payload = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, payload)
            .with_context(|| format!("writing reminder store `{}`", self.path.display()))?;
        Ok(())
    }
}

/// In-process store, handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<CalendarSnapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: CalendarSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> CalendarSnapshot {
        self.snapshot.lock().clone()
    }
}

impl ReminderStore for MemoryStore {
    fn load(&self) -> Result<CalendarSnapshot> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &CalendarSnapshot) -> Result<()> {
        *self.snapshot.lock() = snapshot.clone();
        Ok(())
    }
}
