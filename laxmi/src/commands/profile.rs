use crate::core::profile_manager::ProfileManager;
use crate::core::session::ProfileSession;
use crate::db::schema_version::SchemaVersionStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Shared state behind the UI-facing profile commands.
pub struct AppState {
    pub manager: ProfileManager,
    pub session: Mutex<ProfileSession>,
}

impl AppState {
    pub fn new(manager: ProfileManager) -> Self {
        Self {
            manager,
            session: Mutex::new(ProfileSession::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedProfile {
    pub name: String,
    pub schema_version: u32,
}

pub async fn list_profiles(state: &AppState) -> Result<Vec<String>, String> {
    tracing::info!("List profiles command called");

    Ok(state.manager.list_profiles().await?)
}

pub async fn create_profile(state: &AppState, name: String) -> Result<(), String> {
    tracing::info!("Create profile command called: {}", name);

    Ok(state.manager.create_profile(&name).await?)
}

pub async fn delete_profile(state: &AppState, name: String) -> Result<(), String> {
    tracing::info!("Delete profile command called: {}", name);

    let mut session = state.session.lock().await;
    Ok(state.manager.delete_profile(&name, &mut session).await?)
}

pub async fn open_profile(state: &AppState, name: String) -> Result<OpenedProfile, String> {
    tracing::info!("Open profile command called: {}", name);

    let mut session = state.session.lock().await;
    let db = state.manager.open_profile(&name, &mut session).await?;

    let db = db
        .lock()
        .map_err(|_| "Profile database lock poisoned".to_string())?;
    let schema_version = SchemaVersionStore::current(db.get_connection())?;

    Ok(OpenedProfile {
        name,
        schema_version,
    })
}

pub async fn close_profile(state: &AppState) -> Result<bool, String> {
    tracing::info!("Close profile command called");

    let mut session = state.session.lock().await;
    Ok(state.manager.close_profile(&mut session)?)
}

pub async fn last_opened_profile(state: &AppState) -> Result<Option<String>, String> {
    Ok(state.manager.preferences().last_opened_profile().await?)
}
