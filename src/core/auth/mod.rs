// ─── Accounts & Authentication ───
// Yggdrasil-style identity service: authenticate, validate, refresh and
// invalidate access tokens for a fixed client token.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::ConfigStore;

pub const AUTH_SERVER_URL: &str = "https://authserver.mojang.com";

/// A logged-in game account as kept in the config store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Game profile id; also the account key.
    pub id: String,
    /// Display name.
    pub name: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_token: String,
    #[serde(default)]
    selected_profile: Option<GameProfile>,
}

#[derive(Debug, Deserialize)]
struct GameProfile {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_message: String,
}

impl SessionResponse {
    fn into_account(self) -> LauncherResult<Account> {
        let profile = self.selected_profile.ok_or(LauncherError::Ownership)?;
        Ok(Account {
            id: profile.id,
            name: profile.name,
            access_token: self.access_token,
        })
    }
}

pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
    client_token: String,
}

impl AuthClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, client_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_token: client_token.into(),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> LauncherResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        Ok(self.client.post(&url).json(&body).send().await?)
    }

    /// POST and require a 200 response; the service's error pair is surfaced otherwise.
    async fn call(&self, path: &str, body: serde_json::Value) -> LauncherResult<reqwest::Response> {
        let response = self.post(path, body).await?;
        if response.status() == reqwest::StatusCode::OK {
            return Ok(response);
        }

        let status = response.status();
        let raw = response.text().await.unwrap_or_default();
        let parsed: ErrorResponse = serde_json::from_str(&raw).unwrap_or_default();
        let error = if parsed.error.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            parsed.error
        };

        Err(LauncherError::AuthService {
            error,
            message: parsed.error_message,
        })
    }

    /// Exchange credentials for an account. Fails with `Ownership` when the
    /// user has no game profile.
    pub async fn authenticate(&self, username: &str, password: &str) -> LauncherResult<Account> {
        let response = self
            .call(
                "/authenticate",
                json!({
                    "username": username,
                    "password": password,
                    "agent": { "name": "Minecraft", "version": 1 },
                    "clientToken": self.client_token,
                }),
            )
            .await?;

        response.json::<SessionResponse>().await?.into_account()
    }

    /// `true` only for a 204 answer.
    pub async fn validate(&self, access_token: &str) -> LauncherResult<bool> {
        let response = self
            .post(
                "/validate",
                json!({ "clientToken": self.client_token, "accessToken": access_token }),
            )
            .await?;
        Ok(response.status() == reqwest::StatusCode::NO_CONTENT)
    }

    pub async fn refresh(&self, access_token: &str) -> LauncherResult<Account> {
        let response = self
            .call(
                "/refresh",
                json!({ "clientToken": self.client_token, "accessToken": access_token }),
            )
            .await?;

        response.json::<SessionResponse>().await?.into_account()
    }

    /// Fire-and-forget: a rejected token is logged, only transport errors fail.
    pub async fn invalidate(&self, access_token: &str) -> LauncherResult<()> {
        let response = self
            .post(
                "/invalidate",
                json!({ "clientToken": self.client_token, "accessToken": access_token }),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Invalidate answered HTTP {}", status.as_u16());
        }
        Ok(())
    }

    /// Authenticate and persist the new account.
    pub async fn login(
        &self,
        store: &mut ConfigStore,
        username: &str,
        password: &str,
    ) -> LauncherResult<Account> {
        let account = self.authenticate(username, password).await?;
        info!("Logged in as {}", account.name);
        store.add_account(account.clone())?;
        Ok(account)
    }

    /// Return a usable session for a stored account, refreshing and
    /// persisting it when the current token no longer validates.
    pub async fn refresh_account(&self, store: &mut ConfigStore, account_id: &str) -> LauncherResult<Account> {
        let account = store
            .account(account_id)
            .cloned()
            .ok_or_else(|| LauncherError::AccountNotFound(account_id.to_string()))?;

        if self.validate(&account.access_token).await? {
            debug!("Token for {} is still valid", account.name);
            return Ok(account);
        }

        warn!("Token for {} expired, refreshing", account.name);
        let mut refreshed = self.refresh(&account.access_token).await?;
        // The stored key stays stable even if the service reports another id.
        refreshed.id = account.id;
        store.add_account(refreshed.clone())?;
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn session(token: &str) -> serde_json::Value {
        json!({
            "accessToken": token,
            "clientToken": "client",
            "selectedProfile": { "id": "abc123", "name": "Steve" }
        })
    }

    #[tokio::test]
    async fn login_stores_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/authenticate"))
            .and(body_partial_json(json!({
                "username": "steve@example.com",
                "agent": { "name": "Minecraft", "version": 1 },
                "clientToken": "client"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session("t1")))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), "client");

        let account = auth.login(&mut store, "steve@example.com", "hunter2").await.unwrap();
        assert_eq!(
            account,
            Account {
                id: "abc123".into(),
                name: "Steve".into(),
                access_token: "t1".into(),
            }
        );
        assert_eq!(store.account("abc123"), Some(&account));
    }

    #[tokio::test]
    async fn missing_profile_means_no_ownership() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/authenticate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "t", "clientToken": "client" })),
            )
            .mount(&server)
            .await;

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), "client");
        let err = auth.authenticate("demo", "pw").await.unwrap_err();
        assert!(matches!(err, LauncherError::Ownership));
    }

    #[tokio::test]
    async fn service_errors_carry_error_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/authenticate"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": "ForbiddenOperationException",
                "errorMessage": "Invalid credentials. Invalid username or password."
            })))
            .mount(&server)
            .await;

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), "client");
        let err = auth.authenticate("steve", "wrong").await.unwrap_err();
        assert!(matches!(
            &err,
            LauncherError::AuthService { error, .. } if error == "ForbiddenOperationException"
        ));
        assert!(err.to_string().starts_with("ForbiddenOperationException: Invalid credentials"));
    }

    #[tokio::test]
    async fn valid_token_is_not_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session("t2")))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        store
            .add_account(Account {
                id: "abc123".into(),
                name: "Steve".into(),
                access_token: "t1".into(),
            })
            .unwrap();

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), store.client_token());
        let account = auth.refresh_account(&mut store, "abc123").await.unwrap();
        assert_eq!(account.access_token, "t1");
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": "ForbiddenOperationException",
                "errorMessage": "Invalid token"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .and(body_partial_json(json!({ "accessToken": "t1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session("t2")))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        store
            .add_account(Account {
                id: "abc123".into(),
                name: "Steve".into(),
                access_token: "t1".into(),
            })
            .unwrap();

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), store.client_token());
        let account = auth.refresh_account(&mut store, "abc123").await.unwrap();
        assert_eq!(account.access_token, "t2");

        let reopened = ConfigStore::open(dir.path()).unwrap();
        assert_eq!(reopened.account("abc123").unwrap().access_token, "t2");
    }

    #[tokio::test]
    async fn refresh_replaces_entry_under_stored_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "t2",
                "clientToken": "client",
                "selectedProfile": { "id": "def456", "name": "Steve" }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        store
            .add_account(Account {
                id: "abc123".into(),
                name: "Steve".into(),
                access_token: "t1".into(),
            })
            .unwrap();

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), store.client_token());
        let account = auth.refresh_account(&mut store, "abc123").await.unwrap();
        assert_eq!(account.id, "abc123");
        assert_eq!(account.access_token, "t2");
        assert_eq!(store.accounts().count(), 1);
        assert!(store.account("def456").is_none());
        assert_eq!(store.account("abc123").unwrap().access_token, "t2");
    }

    #[tokio::test]
    async fn invalidate_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invalidate"))
            .and(body_partial_json(json!({ "accessToken": "t1", "clientToken": "client" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), "client");
        auth.invalidate("t1").await.unwrap();
    }

    #[tokio::test]
    async fn invalidate_tolerates_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invalidate"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": "ForbiddenOperationException",
                "errorMessage": "Invalid token"
            })))
            .mount(&server)
            .await;

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), "client");
        assert!(auth.invalidate("stale").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_account_is_rejected_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        let auth = AuthClient::new(reqwest::Client::new(), "http://127.0.0.1:9", "client");
        let err = auth.refresh_account(&mut store, "ghost").await.unwrap_err();
        assert!(matches!(err, LauncherError::AccountNotFound(id) if id == "ghost"));
    }
}
