//! Plain-text views, one renderer per section.

use std::fmt::Write as _;

use client_core::{LoadState, Modal, VerificationState, WorkspaceEvent, WorkspaceSnapshot};
use shared::{
    domain::{ActionKind, Section},
    error::ErrorPresentation,
};

type Renderer = fn(&WorkspaceSnapshot, &mut String);

pub fn renderer_for(section: Section) -> Renderer {
    match section {
        Section::Home => render_home,
        Section::Upload => render_upload,
        Section::Browse | Section::Redact | Section::Summarize | Section::Shared => render_files,
    }
}

pub fn render(snapshot: &WorkspaceSnapshot) -> String {
    let mut out = String::new();
    if snapshot.user_id.is_none() {
        render_signed_out(snapshot, &mut out);
        return out;
    }
    let _ = writeln!(out, "== {} ==", snapshot.section);
    renderer_for(snapshot.section)(snapshot, &mut out);
    out
}

/// Line for an event worth showing as a toast; `None` for events the view already reflects.
pub fn describe_event(event: &WorkspaceEvent) -> Option<String> {
    match event {
        WorkspaceEvent::Notice(text) => Some(text.clone()),
        WorkspaceEvent::Error(err) if err.presentation() == ErrorPresentation::Notification => {
            Some(format!("error: {err}"))
        }
        _ => None,
    }
}

fn render_signed_out(snapshot: &WorkspaceSnapshot, out: &mut String) {
    match &snapshot.verification {
        Some(VerificationState::Pending { attempts }) => {
            let _ = writeln!(
                out,
                "Waiting for email verification ({attempts} checks so far). Commands: wait, resend, cancel"
            );
        }
        Some(VerificationState::Expired { attempts }) => {
            let _ = writeln!(
                out,
                "Verification not confirmed after {attempts} checks. Use resend, or cancel to go back to login"
            );
        }
        _ => {
            let _ = writeln!(out, "Not signed in. Commands: login, signup");
        }
    }
}

fn render_home(snapshot: &WorkspaceSnapshot, out: &mut String) {
    if let Some(user_id) = &snapshot.user_id {
        let _ = writeln!(out, "Signed in as {user_id}");
    }
    if !snapshot.email_verified {
        let _ = writeln!(out, "Email not verified; file sections are unavailable");
    }
    let sections: Vec<&str> = Section::ALL
        .iter()
        .filter(|s| **s != Section::Home)
        .map(|s| s.as_str())
        .collect();
    let _ = writeln!(out, "Sections: {}", sections.join(", "));
}

fn render_upload(_snapshot: &WorkspaceSnapshot, out: &mut String) {
    let _ = writeln!(out, "upload <path> sends a pdf, png, jpg or jpeg file");
}

fn render_files(snapshot: &WorkspaceSnapshot, out: &mut String) {
    match &snapshot.load {
        LoadState::Idle | LoadState::Loading => {
            let _ = writeln!(out, "Loading...");
            return;
        }
        LoadState::Failed(err) => {
            let _ = writeln!(out, "error: {err}");
            return;
        }
        LoadState::Ready => {}
    }

    let Some(category) = &snapshot.open_category else {
        if snapshot.categories.is_empty() {
            let _ = writeln!(out, "No files found");
        }
        for (category, count) in &snapshot.categories {
            let _ = writeln!(out, "  {category} ({count})");
        }
        return;
    };

    let _ = writeln!(out, "{category}:");
    if snapshot.files.is_empty() {
        let _ = writeln!(out, "  (empty)");
    }
    for file in &snapshot.files {
        let mut line = format!("  {}", file.filename);
        for kind in &file.pending {
            let _ = write!(line, " [{kind} pending]");
        }
        let _ = writeln!(out, "{line}");
    }
    let actions: Vec<&str> = [
        ActionKind::Download,
        ActionKind::Share,
        ActionKind::Delete,
        ActionKind::Redact,
        ActionKind::Summarize,
    ]
    .into_iter()
    .filter(|kind| snapshot.section.allows(*kind))
    .map(ActionKind::as_str)
    .collect();
    let _ = writeln!(out, "Actions: {} <file>, back", actions.join(", "));

    if let Some(modal) = &snapshot.modal {
        render_modal(modal, out);
    }
}

fn render_modal(modal: &Modal, out: &mut String) {
    match modal {
        Modal::Share {
            filename,
            recipient,
        } => {
            let _ = writeln!(
                out,
                "Share {filename} with: {recipient}  (to <email>, send, dismiss)"
            );
        }
        Modal::ConfirmDelete { filename } => {
            let _ = writeln!(out, "Delete {filename}? (confirm, dismiss)");
        }
        Modal::Summary { filename, summary } => {
            let _ = writeln!(out, "Summary of {filename}:\n{summary}\n(dismiss)");
        }
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
