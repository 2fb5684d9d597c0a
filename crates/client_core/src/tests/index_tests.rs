use super::*;

fn sample() -> Vec<FileMetadataRecord> {
    vec![
        FileMetadataRecord::new("a.pdf", Some("invoice")),
        FileMetadataRecord::new("b.pdf", Some("invoice")),
        FileMetadataRecord::new("c.png", None),
    ]
}

fn pairs(items: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    items
        .iter()
        .map(|(c, files)| {
            (
                c.to_string(),
                files.iter().map(|f| f.to_string()).collect(),
            )
        })
        .collect()
}

#[test]
fn groups_example_listing() {
    let index = CategoryIndex::build(&sample(), "Uncategorized");
    assert_eq!(
        index.to_pairs(),
        pairs(&[
            ("invoice", &["a.pdf", "b.pdf"]),
            ("Uncategorized", &["c.png"]),
        ])
    );
}

#[test]
fn every_record_lands_in_exactly_one_bucket_and_no_bucket_is_empty() {
    let records = vec![
        FileMetadataRecord::new("1", Some("x")),
        FileMetadataRecord::new("2", Some("")),
        FileMetadataRecord::new("3", Some("y")),
        FileMetadataRecord::new("4", Some("  ")),
        FileMetadataRecord::new("5", Some("x")),
        FileMetadataRecord::new("6", None),
    ];
    let index = CategoryIndex::build(&records, "Shared");

    assert_eq!(index.file_count(), records.len());
    for record in &records {
        let holders = index
            .categories()
            .filter(|(c, _)| index.files(c).contains(&record.filename))
            .count();
        assert_eq!(holders, 1, "{} must be in exactly one bucket", record.filename);
    }
    assert!(index.categories().all(|(_, count)| count > 0));
    assert_eq!(index.files("Shared"), ["2", "4", "6"]);
}

#[test]
fn grouping_is_stable_and_idempotent() {
    let records = vec![
        FileMetadataRecord::new("z.pdf", Some("b")),
        FileMetadataRecord::new("a.pdf", Some("a")),
        FileMetadataRecord::new("m.pdf", Some("b")),
    ];
    let first = CategoryIndex::build(&records, "Uncategorized");
    let second = CategoryIndex::build(&records, "Uncategorized");
    assert_eq!(first, second);
    assert_eq!(
        first.categories().map(|(c, _)| c).collect::<Vec<_>>(),
        ["b", "a"]
    );
    assert_eq!(first.files("b"), ["z.pdf", "m.pdf"]);
}

#[test]
fn empty_listing_builds_empty_index() {
    let index = CategoryIndex::build(&[], "Uncategorized");
    assert_eq!(index.category_count(), 0);
    assert!(index.files("anything").is_empty());
}

#[test]
fn deleting_a_file_shrinks_its_bucket() {
    let mut index = CategoryIndex::build(&sample(), "Uncategorized");
    assert!(index.remove_file("a.pdf"));
    assert_eq!(
        index.to_pairs(),
        pairs(&[("invoice", &["b.pdf"]), ("Uncategorized", &["c.png"])])
    );
}

#[test]
fn removing_last_member_drops_bucket_and_repeat_is_noop() {
    let mut index = CategoryIndex::build(&sample(), "Uncategorized");
    assert!(index.remove_file("c.png"));
    assert!(!index.contains_category("Uncategorized"));
    let after_first = index.clone();

    assert!(!index.remove_file("c.png"));
    assert_eq!(index, after_first);
}
