use super::*;

#[test]
fn same_file_and_kind_cannot_be_claimed_twice() {
    let pending = PendingActionSet::new();
    let guard = pending.try_begin("a.pdf", ActionKind::Delete).expect("claim");
    assert!(pending.is_pending("a.pdf", ActionKind::Delete));

    let err = pending
        .try_begin("a.pdf", ActionKind::Delete)
        .err()
        .expect("duplicate rejected");
    assert_eq!(
        err,
        WorkspaceError::ActionInFlight {
            filename: "a.pdf".into(),
            kind: ActionKind::Delete,
        }
    );

    drop(guard);
    assert!(!pending.is_pending("a.pdf", ActionKind::Delete));
    assert!(pending.try_begin("a.pdf", ActionKind::Delete).is_ok());
}

#[test]
fn distinct_pairs_are_independent() {
    let pending = PendingActionSet::new();
    let _a = pending.try_begin("a.pdf", ActionKind::Delete).expect("a");
    let _b = pending.try_begin("b.pdf", ActionKind::Delete).expect("b");
    let _c = pending.try_begin("a.pdf", ActionKind::Download).expect("c");
    assert_eq!(pending.len(), 3);

    let mut kinds = pending.pending_kinds("a.pdf");
    kinds.sort_by_key(|k| k.as_str());
    assert_eq!(kinds, vec![ActionKind::Delete, ActionKind::Download]);
}

#[test]
fn guard_releases_on_drop() {
    let pending = PendingActionSet::new();
    {
        let guard = pending.try_begin("a.pdf", ActionKind::Share).expect("claim");
        assert_eq!(guard.filename(), "a.pdf");
    }
    assert!(pending.is_empty());
}
