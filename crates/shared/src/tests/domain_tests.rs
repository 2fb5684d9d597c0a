use super::*;

#[test]
fn file_bearing_sections_pick_their_listing() {
    assert_eq!(Section::Browse.listing(), Some(ListingSource::Own));
    assert_eq!(Section::Summarize.listing(), Some(ListingSource::Own));
    assert_eq!(Section::Shared.listing(), Some(ListingSource::Shared));
    assert!(!Section::Home.is_file_bearing());
    assert!(!Section::Upload.is_file_bearing());
}

#[test]
fn default_bucket_depends_on_listing() {
    assert_eq!(ListingSource::Own.default_category(), "Uncategorized");
    assert_eq!(ListingSource::Shared.default_category(), "Shared");
}

#[test]
fn shared_section_offers_download_and_delete_only() {
    assert!(Section::Shared.allows(ActionKind::Download));
    assert!(Section::Shared.allows(ActionKind::Delete));
    assert!(!Section::Shared.allows(ActionKind::Share));
    assert!(!Section::Shared.allows(ActionKind::Redact));
    assert!(Section::Redact.allows(ActionKind::Redact));
    assert!(!Section::Redact.allows(ActionKind::Download));
}

#[test]
fn sections_parse_from_their_names() {
    for section in Section::ALL {
        assert_eq!(Section::parse(section.as_str()), Some(section));
    }
    assert_eq!(Section::parse(" BROWSE "), Some(Section::Browse));
    assert_eq!(Section::parse("settings"), None);
}

#[test]
fn newtypes_serialize_transparently() {
    let id = UserId::new("uid-1");
    assert_eq!(serde_json::to_string(&id).expect("json"), "\"uid-1\"");
    assert!(SessionToken::new("").is_empty());
}
