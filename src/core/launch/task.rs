// ─── Launch Task ───
// Runs a `LaunchSpec` as a child process sharing the launcher's terminal.

use std::process::{ExitStatus, Stdio};

use tracing::{debug, info};

use super::command::LaunchSpec;
use crate::core::error::{LauncherError, LauncherResult};

fn command(spec: &LaunchSpec) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

/// Spawn the process and wait for it to exit.
pub async fn run(spec: &LaunchSpec) -> LauncherResult<ExitStatus> {
    info!("Launching {} in {:?}", spec.program, spec.working_dir);
    debug!("Command: {} {:?}", spec.program, spec.args);

    let mut child = command(spec)
        .spawn()
        .map_err(|e| LauncherError::Other(format!("Failed to start {}: {}", spec.program, e)))?;

    let status = child
        .wait()
        .await
        .map_err(|e| LauncherError::io(&spec.working_dir, e))?;

    info!("Process exited with {}", status);
    Ok(status)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = LaunchSpec {
            working_dir: dir.path().to_path_buf(),
            program: "sh".into(),
            args: vec!["-c".into(), "touch started".into()],
        };

        let status = run(&spec).await.unwrap();
        assert!(status.success());
        assert!(dir.path().join("started").exists());
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let spec = LaunchSpec {
            working_dir: dir.path().to_path_buf(),
            program: "hearth-definitely-not-a-binary".into(),
            args: Vec::new(),
        };
        assert!(run(&spec).await.is_err());
    }
}
