use chrono::{TimeZone, Utc};
use remarks_core::{
    validate_kind, Remark, RemarkCollection, RemarkKind, RemarkState, RemarkValidationError,
};

fn fixed(id: &str, kind: RemarkKind, branch: &str, body: &str) -> Remark {
    let at = Utc.with_ymd_and_hms(2024, 11, 2, 9, 30, 15)
        .single()
        .expect("fixture timestamp should be valid");
    Remark::with_id(id, kind, branch, body, at).expect("fixture remark should be valid")
}

#[test]
fn notes_document_roundtrip_is_exact() {
    let mut resolved = fixed("0000beef", RemarkKind::Decision, "main", "went with plan B");
    resolved.resolve();
    let collection = RemarkCollection::from(vec![
        fixed("a1b2c3d4", RemarkKind::Todo, "main", "fix X\n\nthen ship: yes"),
        resolved,
    ]);

    let document = collection.to_yaml().expect("collection should serialize");
    assert!(document.starts_with("remarks:"));
    assert!(document.contains("type: todo"));
    assert!(document.contains("state: resolved"));
    assert!(document.contains("2024-11-02T09:30:15Z"));

    let parsed = RemarkCollection::from_yaml(&document).expect("yaml should parse");
    assert_eq!(parsed, collection);
    assert_eq!(parsed.to_yaml().expect("collection should serialize"), document);
}

#[test]
fn parses_document_written_by_hand() {
    let document = r#"remarks:
- id: 3f9a0c11
  type: doubt
  branch: feature/login
  state: active
  created_at: 2024-06-01T08:00:00Z
  body: |-
    is this retry loop bounded?
"#;
    let parsed = RemarkCollection::from_yaml(document).expect("yaml should parse");
    let remark = parsed.find_by_id("3f9a0c11").expect("lookup should succeed");
    assert_eq!(remark.kind, RemarkKind::Doubt);
    assert_eq!(remark.branch, "feature/login");
    assert_eq!(remark.body, "is this retry loop bounded?");
    assert!(remark.is_active());
}

#[test]
fn unknown_kind_in_document_is_rejected() {
    let document = "remarks:\n- id: aa\n  type: rant\n  branch: main\n  state: active\n  created_at: 2024-06-01T08:00:00Z\n  body: x\n";
    assert!(RemarkCollection::from_yaml(document).is_err());
}

#[test]
fn construction_validates_kind_and_body() {
    assert_eq!(
        "rant".parse::<RemarkKind>(),
        Err(RemarkValidationError::InvalidKind("rant".to_string()))
    );
    assert_eq!(
        Remark::new(RemarkKind::Thought, "main", " \n\t").unwrap_err(),
        RemarkValidationError::EmptyBody
    );
    assert!(validate_kind("decision"));
    assert!(!validate_kind("Decision"));

    let remark = Remark::new(RemarkKind::Todo, "main", "fix X").expect("remark should be valid");
    assert_eq!(remark.state, RemarkState::Active);
    assert_eq!(remark.id.len(), 8);
    assert!(remark.id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn active_filter_keeps_matching_branch_and_order() {
    let mut resolved = fixed("00000003", RemarkKind::Todo, "main", "done");
    resolved.resolve();
    let collection = RemarkCollection::from(vec![
        fixed("00000001", RemarkKind::Thought, "main", "first"),
        fixed("00000002", RemarkKind::Thought, "feature", "other branch"),
        resolved,
        fixed("00000004", RemarkKind::Doubt, "main", "second"),
    ]);

    let ids: Vec<&str> = collection
        .filter_active_for_branch("main")
        .into_iter()
        .map(|remark| remark.id.as_str())
        .collect();
    assert_eq!(ids, vec!["00000001", "00000004"]);
    assert!(collection.filter_active_for_branch("release").is_empty());
    assert_eq!(collection.active_count(), 3);
}

#[test]
fn merge_appends_after_existing_entries() {
    let mut target = RemarkCollection::from(vec![
        fixed("00000001", RemarkKind::Thought, "main", "t1"),
        fixed("00000002", RemarkKind::Thought, "main", "t2"),
    ]);
    let source = RemarkCollection::from(vec![
        fixed("00000010", RemarkKind::Todo, "main", "s1"),
        fixed("00000011", RemarkKind::Todo, "main", "s2"),
    ]);

    let report = target.merge(source);
    assert_eq!(report.appended, 2);
    let bodies: Vec<&str> = target.iter().map(|remark| remark.body.as_str()).collect();
    assert_eq!(bodies, vec!["t1", "t2", "s1", "s2"]);
}
