use super::*;
use client_core::workspace::FileEntry;
use shared::{domain::UserId, error::WorkspaceError};

fn snapshot(section: Section) -> WorkspaceSnapshot {
    WorkspaceSnapshot {
        user_id: Some(UserId::new("uid-1")),
        email_verified: true,
        verification: None,
        section,
        load: LoadState::Ready,
        categories: vec![("invoice".into(), 2), ("Uncategorized".into(), 1)],
        open_category: None,
        files: Vec::new(),
        modal: None,
    }
}

#[test]
fn grid_lists_categories_with_counts() {
    let text = render(&snapshot(Section::Browse));
    assert!(text.contains("== browse =="));
    assert!(text.contains("  invoice (2)"));
    assert!(text.contains("  Uncategorized (1)"));
}

#[test]
fn file_list_shows_pending_actions_and_section_actions() {
    let mut view = snapshot(Section::Shared);
    view.open_category = Some("Shared".into());
    view.files = vec![FileEntry {
        filename: "x.pdf".into(),
        pending: vec![ActionKind::Delete],
    }];

    let text = render(&view);
    assert!(text.contains("x.pdf [delete pending]"));
    assert!(text.contains("Actions: download, delete <file>, back"));
}

#[test]
fn failed_load_is_shown_in_place_of_the_grid() {
    let mut view = snapshot(Section::Redact);
    view.load = LoadState::Failed(WorkspaceError::SessionMissing);
    let text = render(&view);
    assert!(text.contains("error: User not authenticated"));
    assert!(!text.contains("invoice"));
}

#[test]
fn summary_modal_is_rendered_over_file_list() {
    let mut view = snapshot(Section::Summarize);
    view.open_category = Some("invoice".into());
    view.modal = Some(Modal::Summary {
        filename: "a.pdf".into(),
        summary: "Two lines.".into(),
    });
    assert!(render(&view).contains("Summary of a.pdf:\nTwo lines."));
}

#[test]
fn signed_out_view_mentions_pending_verification() {
    let mut view = snapshot(Section::Home);
    view.user_id = None;
    view.verification = Some(VerificationState::Pending { attempts: 4 });
    assert!(render(&view).contains("4 checks so far"));
}

#[test]
fn each_section_has_a_renderer() {
    for section in Section::ALL {
        let mut out = String::new();
        renderer_for(section)(&snapshot(section), &mut out);
        assert!(!out.is_empty(), "{section} rendered nothing");
    }
}

#[test]
fn only_notifications_become_toasts() {
    assert_eq!(
        describe_event(&WorkspaceEvent::Error(WorkspaceError::remote(
            "Delete failed",
            "denied"
        ))),
        Some("error: Delete failed: denied".into())
    );
    assert_eq!(
        describe_event(&WorkspaceEvent::Error(WorkspaceError::SessionMissing)),
        None
    );
    assert_eq!(
        describe_event(&WorkspaceEvent::Notice("Deleted a.pdf".into())),
        Some("Deleted a.pdf".into())
    );
}
