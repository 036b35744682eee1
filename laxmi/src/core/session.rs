use crate::db::schema::Database;
use crate::utils::error::Result;
use std::sync::{Arc, Mutex};

pub type SharedDatabase = Arc<Mutex<Database>>;

/// The profile whose database is currently open.
#[derive(Clone)]
pub struct ActiveProfile {
    pub name: String,
    pub db: SharedDatabase,
}

/// Holds at most one open profile database.
///
/// Passed explicitly to the operations that open or close profiles, so
/// independent sessions can coexist (one per test, for instance).
#[derive(Default)]
pub struct ProfileSession {
    active: Option<ActiveProfile>,
}

impl ProfileSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `db` the active database, handing back whatever it replaced.
    pub fn activate(&mut self, name: impl Into<String>, db: SharedDatabase) -> Option<ActiveProfile> {
        self.active.replace(ActiveProfile {
            name: name.into(),
            db,
        })
    }

    pub fn active_profile_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    pub fn active_database(&self) -> Option<SharedDatabase> {
        self.active.as_ref().map(|a| Arc::clone(&a.db))
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active_profile_name() == Some(name)
    }

    /// Clear the session. Returns whether anything was open.
    ///
    /// The connection itself closes once the last outstanding handle drops.
    pub fn close(&mut self) -> Result<bool> {
        let Some(active) = self.active.take() else {
            return Ok(false);
        };

        match Arc::try_unwrap(active.db) {
            Ok(mutex) => {
                let db = mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
                db.close()?;
                tracing::info!("Closed profile '{}'", active.name);
            }
            Err(_) => {
                tracing::debug!(
                    "Profile '{}' left the session but is still referenced elsewhere",
                    active.name
                );
            }
        }

        Ok(true)
    }
}
