//! Line-oriented front-end driving a `Workspace`.

use std::sync::Arc;

use anyhow::Result;
use client_core::{FileAction, Workspace, WorkspaceEvent};
use shared::error::{ErrorPresentation, WorkspaceError};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::broadcast::{self, error::TryRecvError},
};
use tracing::debug;

use crate::{
    commands::{parse_command, ShellCommand, HELP},
    render::{describe_event, render},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub async fn execute(workspace: &Workspace, command: ShellCommand) -> Result<Flow, WorkspaceError> {
    debug!(command = command.name(), "shell command");
    match command {
        ShellCommand::Login { email, password } => {
            workspace.login(&email, &password).await?;
        }
        ShellCommand::Signup { email, password } => {
            workspace.signup(&email, &password).await?;
        }
        ShellCommand::ResendVerification => workspace.resend_verification().await?,
        ShellCommand::AwaitVerification => {
            workspace.await_verification().await?;
        }
        ShellCommand::CancelVerification => workspace.cancel_verification().await,
        ShellCommand::Logout => workspace.logout().await,
        ShellCommand::Go { section } => workspace.select_section(section).await?,
        ShellCommand::Reload => workspace.reload_section().await?,
        ShellCommand::Open { category } => workspace.enter_category(&category)?,
        ShellCommand::Back => workspace.back()?,
        ShellCommand::Download { filename } => {
            workspace.perform(&filename, FileAction::Download).await?;
        }
        ShellCommand::Delete { filename } => workspace.request_delete(&filename)?,
        ShellCommand::Confirm => {
            workspace.confirm_delete().await?;
        }
        ShellCommand::Share { filename } => workspace.open_share(&filename)?,
        ShellCommand::Recipient { email } => workspace.set_share_recipient(&email)?,
        ShellCommand::Send => {
            workspace.submit_share().await?;
        }
        ShellCommand::Redact { filename } => {
            workspace.perform(&filename, FileAction::Redact).await?;
        }
        ShellCommand::Summarize { filename } => {
            workspace.perform(&filename, FileAction::Summarize).await?;
        }
        ShellCommand::Upload { path } => {
            workspace.upload(&path).await?;
        }
        ShellCommand::Dismiss => workspace.cancel_modal(),
        ShellCommand::Show | ShellCommand::Help => {}
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Reads commands until `quit` or end of input, printing toasts and the current view after each.
pub async fn run<R, W>(workspace: Arc<Workspace>, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = workspace.subscribe_events();
    let mut lines = input.lines();

    output.write_all(render(&workspace.snapshot()).as_bytes()).await?;
    output.write_all(b"> ").await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let mut text = String::new();
        let mut flow = Flow::Continue;
        match parse_command(&line) {
            Ok(ShellCommand::Help) => text.push_str(HELP),
            Ok(command) => match execute(&workspace, command).await {
                Ok(next) => flow = next,
                Err(err) if err.presentation() != ErrorPresentation::Notification => {
                    text.push_str(&format!("{err}\n"));
                }
                Err(_) => {}
            },
            Err(usage) => text.push_str(&format!("{usage}\n")),
        }
        drain_toasts(&mut events, &mut text);
        if flow == Flow::Quit {
            output.write_all(text.as_bytes()).await?;
            break;
        }
        if !text.ends_with('\n') && !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&render(&workspace.snapshot()));
        text.push_str("> ");
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
    }
    output.flush().await?;
    Ok(())
}

fn drain_toasts(events: &mut broadcast::Receiver<WorkspaceEvent>, out: &mut String) {
    loop {
        match events.try_recv() {
            Ok(event) => {
                if let Some(line) = describe_event(&event) {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            Err(TryRecvError::Lagged(skipped)) => {
                out.push_str(&format!("({skipped} messages skipped)\n"));
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
