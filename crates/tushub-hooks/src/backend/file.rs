//! Executable hooks.
//!
//! Each hook is a file named after the hook type inside the configured
//! directory. The event JSON is written to the process's stdin and the
//! exit code becomes the return code. A missing file means the hook is
//! simply not installed.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use tushub_core::{AppError, AppResult, HookEvent, HookType};

use super::{HookBackend, HookOutcome};
use crate::error::HookError;

/// Runs `<directory>/<hook-name>` for every invocation.
#[derive(Debug, Clone)]
pub struct FileHook {
    directory: PathBuf,
}

impl FileHook {
    /// Creates a file hook backend rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn command(&self, hook: HookType, event: &HookEvent, capture_output: bool) -> Command {
        let mut cmd = Command::new(self.directory.join(hook.as_str()));
        cmd.env("TUS_ID", event.id())
            .env("TUS_SIZE", event.size().to_string())
            .env("TUS_OFFSET", event.upload.offset.to_string())
            .stdin(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if capture_output {
            cmd.stdout(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
        }

        cmd
    }
}

#[async_trait]
impl HookBackend for FileHook {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn setup(&mut self) -> AppResult<()> {
        let metadata = tokio::fs::metadata(&self.directory).await.map_err(|e| {
            AppError::configuration(format!(
                "Hook directory '{}' is not accessible: {e}",
                self.directory.display()
            ))
        })?;

        if !metadata.is_dir() {
            return Err(AppError::configuration(format!(
                "Hook directory '{}' is not a directory",
                self.directory.display()
            )));
        }

        Ok(())
    }

    async fn invoke_hook(
        &self,
        hook: HookType,
        event: &HookEvent,
        capture_output: bool,
    ) -> HookOutcome {
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => return HookOutcome::failure(e.into(), 0, ""),
        };

        let mut child = match self.command(hook, event, capture_output).spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(hook = %hook, "No hook executable installed");
                return HookOutcome::default();
            }
            Err(e) => return HookOutcome::failure(HookError::Process(e.to_string()), 0, ""),
        };

        // Hooks are free to ignore stdin, so a broken pipe is not an error.
        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&payload).await {
                    tracing::debug!(error = %e, "Hook did not read its payload");
                }
            });
        }

        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(e) => return HookOutcome::failure(HookError::Process(e.to_string()), 0, ""),
        };

        if output.status.success() {
            return HookOutcome::success(output.stdout, 0);
        }

        let code = output.status.code().unwrap_or(-1);
        HookOutcome::failure(HookError::ExitStatus { code }, code, output.stdout)
    }
}
