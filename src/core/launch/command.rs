// ─── Launch Command ───
// Turns a recorded profile into the program, arguments and working
// directory that start it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info};

use super::classpath::build_classpath;
use crate::core::auth::{Account, AuthClient};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::profile::{ClientRecord, InstallMode, Profile};
use crate::core::state::ConfigStore;
use crate::core::version::version_file::split_legacy_arguments;
use crate::core::version::{GameManifest, Platform};

static TEMPLATE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid template regex"));

/// Everything needed to spawn a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub working_dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

/// Replace every `${name}` with its value; unknown names become empty.
pub fn render_template(template: &str, vars: &HashMap<String, String>) -> String {
    TEMPLATE_VAR
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Servers start from the jar in the profile directory.
pub fn server_spec(profile: &Profile) -> LaunchSpec {
    let jar = if profile.loader_version.is_some() {
        "forge.jar"
    } else {
        "minecraft.jar"
    };

    LaunchSpec {
        working_dir: profile.path.clone(),
        program: "java".to_string(),
        args: vec!["-jar".to_string(), jar.to_string(), "nogui".to_string()],
    }
}

/// Assemble a client command from the profile files and a live session.
pub fn client_spec(
    profile: &Profile,
    record: &ClientRecord,
    manifest: &GameManifest,
    account: &Account,
    platform: &Platform,
) -> LaunchSpec {
    let loader = record.loader.as_ref();

    let mut vars: HashMap<String, String> = HashMap::from([
        ("classpath".to_string(), build_classpath(manifest, platform, loader)),
        ("user_type".to_string(), "mojang".to_string()),
        ("auth_uuid".to_string(), account.id.clone()),
        ("auth_player_name".to_string(), account.name.clone()),
        ("auth_access_token".to_string(), account.access_token.clone()),
    ]);
    vars.extend(record.vars.iter().map(|(k, v)| (k.clone(), v.clone())));

    let jvm_args = manifest.jvm_arguments(platform);
    let (main_class, game_args) = match loader {
        Some(loader) => (
            loader.main_class.clone(),
            split_legacy_arguments(&loader.minecraft_arguments),
        ),
        None => (manifest.main_class.clone(), manifest.game_arguments(platform)),
    };

    let args = jvm_args
        .iter()
        .chain(std::iter::once(&main_class))
        .chain(game_args.iter())
        .map(|arg| render_template(arg, &vars))
        .collect();

    LaunchSpec {
        working_dir: profile.path.clone(),
        program: "java".to_string(),
        args,
    }
}

/// Resolve a profile (by path or name) and build its launch command.
///
/// Client launches pick `account_id` or the selected account, validate the
/// session and refresh it when needed.
pub async fn build_launch_spec(
    store: &mut ConfigStore,
    auth: &AuthClient,
    platform: &Platform,
    profile_key: &str,
    account_id: Option<&str>,
) -> LauncherResult<LaunchSpec> {
    let profile = store
        .profile(profile_key)
        .cloned()
        .ok_or_else(|| LauncherError::ProfileNotFound(profile_key.to_string()))?;

    if profile.mode == InstallMode::Server {
        info!("Starting server profile '{}'", profile.name);
        return Ok(server_spec(&profile));
    }

    let account_id = match account_id {
        Some(id) => id.to_string(),
        None => store.selected_account()?.ok_or(LauncherError::NoAccount)?.id,
    };

    let account = auth.refresh_account(store, &account_id).await?;
    let (record, manifest) = profile.read_client_files().await?;

    info!("Starting '{}' as {}", profile.name, account.name);
    let spec = client_spec(&profile, &record, &manifest, &account, platform);
    debug!("Launch arguments: {} entries", spec.args.len());
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::core::launch::classpath::classpath_separator;
    use crate::core::loaders::LoaderOverride;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn account() -> Account {
        Account {
            id: "uuid-1".into(),
            name: "Steve".into(),
            access_token: "token-1".into(),
        }
    }

    fn profile(mode: InstallMode, loader: Option<&str>, dir: PathBuf) -> Profile {
        Profile {
            name: "p".into(),
            path: dir,
            game_version: "1.12.2".into(),
            loader_version: loader.map(Into::into),
            mode,
        }
    }

    fn legacy_manifest() -> GameManifest {
        serde_json::from_value(json!({
            "id": "1.12.2",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "minecraftArguments": "--username ${auth_player_name} --version ${version_name} --accessToken ${auth_access_token}",
            "libraries": [
                { "name": "a:a:1", "downloads": { "artifact": { "path": "a/a-1.jar", "url": "https://x/a.jar" } } }
            ]
        }))
        .unwrap()
    }

    fn record(loader: Option<LoaderOverride>) -> ClientRecord {
        ClientRecord {
            name: "p".into(),
            vars: BTreeMap::from([
                ("version_name".to_string(), "1.12.2".to_string()),
                ("natives_directory".to_string(), "natives".to_string()),
                ("launcher_name".to_string(), "hearth".to_string()),
            ]),
            loader,
        }
    }

    #[test]
    fn templates_substitute_known_and_blank_unknown() {
        let vars = vars(&[("a", "1"), ("b", "two")]);
        assert_eq!(render_template("${a}-${b}-${c}", &vars), "1-two-");
        assert_eq!(render_template("plain", &vars), "plain");
        assert_eq!(render_template("${}", &vars), "${}");
    }

    #[test]
    fn server_spec_picks_loader_jar() {
        let dir = PathBuf::from("/srv/mc");
        assert_eq!(
            server_spec(&profile(InstallMode::Server, None, dir.clone())).args,
            ["-jar", "minecraft.jar", "nogui"]
        );
        let spec = server_spec(&profile(InstallMode::Server, Some("14.23.5.2847"), dir.clone()));
        assert_eq!(spec.args, ["-jar", "forge.jar", "nogui"]);
        assert_eq!(spec.program, "java");
        assert_eq!(spec.working_dir, dir);
    }

    #[test]
    fn legacy_client_uses_default_jvm_template() {
        let platform = Platform::new("linux", "x86_64", "");
        let spec = client_spec(
            &profile(InstallMode::Client, None, PathBuf::from("/games/p")),
            &record(None),
            &legacy_manifest(),
            &account(),
            &platform,
        );

        let library = std::path::Path::new("libraries")
            .join("a/a-1.jar")
            .to_string_lossy()
            .into_owned();
        let classpath = [library, "minecraft.jar".to_string()].join(classpath_separator());

        assert_eq!(
            spec.args,
            [
                "-Djava.library.path=natives",
                "-Dminecraft.launcher.brand=hearth",
                "-Dminecraft.launcher.version=",
                "-cp",
                classpath.as_str(),
                "net.minecraft.client.main.Main",
                "--username",
                "Steve",
                "--version",
                "1.12.2",
                "--accessToken",
                "token-1",
            ]
        );
        assert!(spec.args.iter().all(|a| !a.contains("${")));
    }

    #[test]
    fn loader_override_replaces_main_class_and_game_args() {
        let platform = Platform::new("linux", "x86_64", "");
        let loader = LoaderOverride {
            main_class: "net.minecraft.launchwrapper.Launch".into(),
            minecraft_arguments: "--username ${auth_player_name}  --tweakClass FMLTweaker".into(),
            libraries: vec!["libraries/forge.jar".into()],
        };
        let spec = client_spec(
            &profile(InstallMode::Client, Some("14.23.5.2847"), PathBuf::from("/games/p")),
            &record(Some(loader)),
            &legacy_manifest(),
            &account(),
            &platform,
        );

        let main_at = spec
            .args
            .iter()
            .position(|a| a == "net.minecraft.launchwrapper.Launch")
            .unwrap();
        assert_eq!(main_at, 5);
        assert_eq!(
            &spec.args[main_at + 1..],
            ["--username", "Steve", "--tweakClass", "FMLTweaker"]
        );
        assert!(spec.args[4].contains("libraries/forge.jar"));
        assert!(spec.args[4].ends_with("minecraft.jar"));
    }

    #[tokio::test]
    async fn client_launch_without_accounts_fails() {
        let workspace = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(workspace.path()).unwrap();
        store
            .add_profile(profile(InstallMode::Client, None, PathBuf::from("/games/p")))
            .unwrap();
        let auth = AuthClient::new(reqwest::Client::new(), "http://127.0.0.1:9", "client");
        let platform = Platform::new("linux", "x86_64", "");

        let err = build_launch_spec(&mut store, &auth, &platform, "p", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::NoAccount));

        let err = build_launch_spec(&mut store, &auth, &platform, "missing", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn client_launch_refreshes_session_and_reads_profile_files() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "fresh",
                "selectedProfile": { "id": "uuid-1", "name": "Steve" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let workspace = tempfile::tempdir().unwrap();
        let game_dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(workspace.path()).unwrap();
        store.add_account(account()).unwrap();

        let p = profile(InstallMode::Client, None, game_dir.path().to_path_buf());
        p.write_client_record(&record(None)).await.unwrap();
        p.write_manifest(&serde_json::to_string(&json!({
            "id": "1.12.2",
            "mainClass": "net.minecraft.client.main.Main",
            "minecraftArguments": "--accessToken ${auth_access_token}"
        }))
        .unwrap())
        .await
        .unwrap();
        store.add_profile(p.clone()).unwrap();

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), store.client_token());
        let platform = Platform::new("linux", "x86_64", "");
        let spec = build_launch_spec(&mut store, &auth, &platform, &p.key(), None)
            .await
            .unwrap();

        assert_eq!(spec.working_dir, game_dir.path());
        assert_eq!(spec.args.last().map(String::as_str), Some("fresh"));
        assert_eq!(store.account("uuid-1").unwrap().access_token, "fresh");
    }

    #[tokio::test]
    async fn client_launch_with_missing_files_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/validate"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let workspace = tempfile::tempdir().unwrap();
        let game_dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(workspace.path()).unwrap();
        store.add_account(account()).unwrap();
        store
            .add_profile(profile(InstallMode::Client, None, game_dir.path().to_path_buf()))
            .unwrap();

        let auth = AuthClient::new(reqwest::Client::new(), server.uri(), "client");
        let platform = Platform::new("linux", "x86_64", "");
        let err = build_launch_spec(&mut store, &auth, &platform, "p", Some("uuid-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::ProfileFilesMissing { .. }));
    }
}
