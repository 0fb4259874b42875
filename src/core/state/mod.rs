mod app_state;
mod config_store;
mod settings;

pub use app_state::{default_workspace, AppState, WORKSPACE_ENV};
pub use config_store::{ConfigData, ConfigStore, CONFIG_FILE};
pub use settings::{Endpoints, LauncherSettings, RESOURCES_URL, SETTINGS_FILE};
