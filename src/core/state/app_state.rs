use std::path::{Path, PathBuf};

use reqwest::Client;

use super::config_store::ConfigStore;
use super::settings::LauncherSettings;
use crate::core::auth::{Account, AuthClient};
use crate::core::error::LauncherResult;
use crate::core::http::build_http_client;
use crate::core::install::{self, InstallContext, InstallRequest};
use crate::core::launch::{self, LaunchSpec};
use crate::core::pipeline::EventSink;
use crate::core::profile::Profile;
use crate::core::version::Platform;

const APP_DIR_NAME: &str = "hearth";

/// Environment variable that overrides the workspace directory.
pub const WORKSPACE_ENV: &str = "HEARTH_HOME";

/// One opened workspace: persisted config, settings and shared clients.
pub struct AppState {
    pub workspace: PathBuf,
    pub settings: LauncherSettings,
    pub http_client: Client,
    pub store: ConfigStore,
    pub platform: Platform,
}

impl AppState {
    pub fn open(workspace: PathBuf) -> LauncherResult<Self> {
        let store = ConfigStore::open(&workspace)?;
        let settings = LauncherSettings::load(&workspace);
        let http_client = build_http_client()?;

        Ok(Self {
            workspace,
            settings,
            http_client,
            store,
            platform: Platform::current(),
        })
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(
            self.http_client.clone(),
            self.settings.endpoints.auth_server.clone(),
            self.store.client_token(),
        )
    }

    pub async fn install(
        &mut self,
        request: InstallRequest,
        events: &dyn EventSink,
    ) -> LauncherResult<Profile> {
        let context = InstallContext::new(
            self.http_client.clone(),
            &self.settings,
            self.platform.clone(),
        );
        install::install(request, context, &mut self.store, events).await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> LauncherResult<Account> {
        let auth = self.auth();
        auth.login(&mut self.store, username, password).await
    }

    pub async fn launch_spec(
        &mut self,
        profile_key: &str,
        account_id: Option<&str>,
    ) -> LauncherResult<LaunchSpec> {
        let auth = self.auth();
        launch::build_launch_spec(&mut self.store, &auth, &self.platform, profile_key, account_id)
            .await
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.store.profiles().cloned().collect()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.store.accounts().cloned().collect()
    }

    pub fn select_account(&mut self, id: &str) -> LauncherResult<()> {
        self.store.select_account(id)
    }
}

/// `<data dir>/hearth`, or the current directory when the platform has none.
pub fn default_workspace() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
