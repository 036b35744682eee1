pub mod preferences;
pub mod profile_manager;
pub mod session;
