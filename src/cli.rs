// ─── Command Line ───
// `hearth init | list-profiles | login | start | list-accounts | select-account`

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::InstallRequest;
use crate::core::launch;
use crate::core::pipeline::{EventSink, PipelineEvent};
use crate::core::profile::InstallMode;
use crate::core::state::{default_workspace, AppState, WORKSPACE_ENV};
use crate::core::version::{GameSelector, LoaderSelector};

#[derive(Debug, Parser)]
#[command(name = "hearth", version, about = "Install and launch Minecraft clients and servers")]
pub struct Cli {
    /// Directory holding config.json and settings.json.
    #[arg(short, long, global = true, env = WORKSPACE_ENV)]
    pub workspace: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install a game version into a directory and record it as a profile.
    Init {
        name: String,
        /// Version id, `latest` or `latest-snapshot`.
        #[arg(short, long, default_value = "latest")]
        minecraft: GameSelector,
        /// Forge version, `recommend`, `latest` or `no`.
        #[arg(short = 'F', long)]
        forge: Option<String>,
        /// Install directory; defaults to the current directory.
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// `client` or `server`.
        #[arg(short = 'M', long, default_value = "client")]
        mode: String,
    },
    ListProfiles,
    /// Log in with a Mojang account; the password is prompted for.
    Login { username: String },
    /// Start a profile given by path or name; defaults to the current directory.
    Start {
        profile: Option<String>,
        #[arg(short, long)]
        account: Option<String>,
    },
    ListAccounts,
    SelectAccount { id: String },
}

/// Prints `[i/n] description` per step and a bar for item-level work.
#[derive(Default)]
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn item_bar(total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("  [{bar:40.cyan/blue}] {pos}/{len}") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl EventSink for CliProgress {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StepStarted {
                index,
                total,
                description,
            } => {
                self.clear();
                println!("[{}/{}] {}", index, total, description);
            }
            PipelineEvent::ItemFinished {
                completed, total, ..
            } => {
                if let Ok(mut guard) = self.bar.lock() {
                    let bar = guard.get_or_insert_with(|| Self::item_bar(total));
                    bar.set_position(completed as u64);
                }
            }
            PipelineEvent::Finished => self.clear(),
        }
    }
}

fn absolute(path: &Path) -> LauncherResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| LauncherError::io(path, e))?;
    Ok(cwd.join(path))
}

/// `-F no` and an empty value both mean a vanilla install.
fn loader_selector(forge: Option<String>) -> Option<LoaderSelector> {
    let forge = forge.filter(|f| !f.is_empty() && f != "no")?;
    match forge.parse::<LoaderSelector>() {
        Ok(selector) => Some(selector),
        Err(never) => match never {},
    }
}

pub async fn execute(cli: Cli) -> LauncherResult<()> {
    let workspace = cli.workspace.unwrap_or_else(default_workspace);
    let mut state = AppState::open(workspace)?;

    match cli.command {
        Command::Init {
            name,
            minecraft,
            forge,
            path,
            mode,
        } => {
            let path = absolute(&path.unwrap_or_else(|| PathBuf::from(".")))?;
            let request = InstallRequest {
                name,
                path,
                game: minecraft,
                loader: loader_selector(forge),
                mode: mode.parse::<InstallMode>()?,
            };

            let progress = CliProgress::default();
            let profile = state.install(request, &progress).await?;
            println!(
                "Installed {} [{}][version: {}, forge: {}]",
                profile.name,
                profile.path.display(),
                profile.game_version,
                profile.loader_version.as_deref().unwrap_or("no")
            );
        }
        Command::ListProfiles => {
            for profile in state.profiles() {
                println!(
                    "{} [{}][version: {}, forge: {}, mode: {}]",
                    profile.name,
                    profile.path.display(),
                    profile.game_version,
                    profile.loader_version.as_deref().unwrap_or("no"),
                    profile.mode
                );
            }
        }
        Command::Login { username } => {
            let password = dialoguer::Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(|e| LauncherError::Other(format!("Prompt failed: {}", e)))?;
            let account = state.login(&username, &password).await?;
            println!("Logged in for {}", account.name);
        }
        Command::Start { profile, account } => {
            let key = match profile {
                Some(key) => key,
                None => absolute(Path::new("."))?.to_string_lossy().into_owned(),
            };
            let spec = state.launch_spec(&key, account.as_deref()).await?;
            let status = launch::run(&spec).await?;
            if !status.success() {
                return Err(LauncherError::Other(format!("Minecraft exited with {}", status)));
            }
        }
        Command::ListAccounts => {
            let selected = state.store.selected_account_id().map(ToString::to_string);
            for account in state.accounts() {
                let marker = if selected.as_deref() == Some(account.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {} ({})", marker, account.name, account.id);
            }
        }
        Command::SelectAccount { id } => {
            state.select_account(&id)?;
            println!("Selected account {}", id);
        }
    }

    Ok(())
}
