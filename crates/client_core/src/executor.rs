//! Boundary to the command execution layer.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use shared::protocol::RemoteOperation;
use tokio::process::Command;
use tracing::{debug, warn};

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs a named operation and returns its raw textual payload.
    async fn execute(&self, operation: &RemoteOperation) -> Result<String>;
}

pub struct MissingCommandExecutor;

#[async_trait]
impl CommandExecutor for MissingCommandExecutor {
    async fn execute(&self, operation: &RemoteOperation) -> Result<String> {
        Err(anyhow!(
            "command layer is unavailable; cannot run {}",
            operation.name()
        ))
    }
}

/// Runs `<backend_dir>/<operation>.py` through the configured interpreter with positional arguments.
#[derive(Debug, Clone)]
pub struct ScriptCommandExecutor {
    program: String,
    backend_dir: PathBuf,
    download_dir: PathBuf,
}

impl ScriptCommandExecutor {
    pub fn new(
        program: impl Into<String>,
        backend_dir: impl Into<PathBuf>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            backend_dir: backend_dir.into(),
            download_dir: download_dir.into(),
        }
    }

    pub fn script_path(&self, operation: &RemoteOperation) -> PathBuf {
        self.backend_dir.join(format!("{}.py", operation.name()))
    }

    fn arguments(&self, operation: &RemoteOperation) -> Result<(Vec<String>, Option<PathBuf>)> {
        let arguments = match operation {
            RemoteOperation::ListUserMetadata { user_id }
            | RemoteOperation::ListSharedMetadata { user_id } => {
                (vec![user_id.to_string()], None)
            }
            RemoteOperation::ProcessFile { file_path, user_id } => {
                (vec![file_path.clone(), user_id.to_string()], None)
            }
            RemoteOperation::SummarizeFile { user_id, filename }
            | RemoteOperation::DeleteUserFile { user_id, filename }
            | RemoteOperation::DeleteSharedFile { user_id, filename } => {
                (vec![user_id.to_string(), filename.clone()], None)
            }
            RemoteOperation::DownloadFile { user_id, filename }
            | RemoteOperation::DownloadSharedFile { user_id, filename } => {
                let target = self.download_dir.join(local_file_name(filename)?);
                (
                    vec![
                        user_id.to_string(),
                        filename.clone(),
                        target.display().to_string(),
                    ],
                    Some(target),
                )
            }
            RemoteOperation::RedactFile { user_id, filename } => {
                let target = self
                    .download_dir
                    .join(redacted_name(local_file_name(filename)?));
                (
                    vec![
                        user_id.to_string(),
                        filename.clone(),
                        target.display().to_string(),
                    ],
                    Some(target),
                )
            }
            RemoteOperation::ShareFile {
                user_id,
                filename,
                recipient_email,
            } => (
                vec![
                    user_id.to_string(),
                    filename.clone(),
                    recipient_email.trim().to_string(),
                ],
                None,
            ),
        };
        Ok(arguments)
    }
}

#[async_trait]
impl CommandExecutor for ScriptCommandExecutor {
    async fn execute(&self, operation: &RemoteOperation) -> Result<String> {
        operation.validate()?;

        let script = self.script_path(operation);
        let (args, target) = self.arguments(operation)?;
        if target.is_some() {
            tokio::fs::create_dir_all(&self.download_dir)
                .await
                .with_context(|| {
                    format!(
                        "failed to create download directory '{}'",
                        self.download_dir.display()
                    )
                })?;
        }

        debug!(operation = operation.name(), script = %script.display(), "spawning backend script");
        let output = Command::new(&self.program)
            .arg(&script)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to execute {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(operation = operation.name(), status = %output.status, "backend script failed");
            if stderr.is_empty() {
                bail!("{} exited with {}", operation.name(), output.status);
            }
            bail!(stderr);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        match (operation, target) {
            (
                RemoteOperation::DownloadFile { .. } | RemoteOperation::DownloadSharedFile { .. },
                Some(target),
            ) => Ok(format!(
                "File downloaded successfully to: {}",
                target.display()
            )),
            _ => Ok(stdout),
        }
    }
}

/// Last path component of a listed filename, so downloads always land inside the download directory.
fn local_file_name(filename: &str) -> Result<&str> {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("'{filename}' cannot be saved locally"))
}

/// `report.final.pdf` becomes `report_redacted.pdf`.
pub fn redacted_name(filename: &str) -> String {
    let stem = filename.split('.').next().unwrap_or(filename);
    format!("{stem}_redacted.pdf")
}

pub fn is_uploadable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            matches!(ext.as_str(), "pdf" | "png" | "jpg" | "jpeg")
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "tests/executor_tests.rs"]
mod tests;
