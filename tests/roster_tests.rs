use quizgrade::roster::{Roster, create_roster_from_responses};
use serde_json::json;

fn sample() -> Roster {
    create_roster_from_responses(
        &json!({"responses": [
            {"respondentEmail": "alice@school.edu", "responseId": "r1", "respondentName": "Alice"},
            {"email": "bob@school.edu"}
        ]}),
        "export.json",
    )
}

#[test]
fn yaml_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("roster.yaml");

    let roster = sample();
    roster.save(&path).expect("save");
    let text = std::fs::read_to_string(&path).expect("read");
    assert!(text.contains("students:"));
    assert!(!text.trim_start().starts_with('{'));

    assert_eq!(Roster::load(&path).expect("load"), roster);
}

#[test]
fn json_used_for_other_extensions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("roster.json");

    let roster = sample();
    roster.save(&path).expect("save");
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(value["students"]["s001"]["email"], json!("alice@school.edu"));
    assert_eq!(value["students"]["s002"]["responseId"], json!(null));

    let loaded = Roster::load(&path).expect("load");
    assert_eq!(loaded.lookup_by_email("BOB@school.edu").map(|(id, _)| id), Some("s002"));
}

#[test]
fn create_reads_export_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("export.json");
    std::fs::write(&path, r#"[{"Email": "carol@school.edu", "Name": "Carol"}]"#).expect("write");

    let roster = Roster::create(&path).expect("create");
    let entry = roster.lookup_by_id("s001").expect("s001");
    assert_eq!(entry.email, "carol@school.edu");
    assert_eq!(entry.name.as_deref(), Some("Carol"));
    assert!(roster.source.ends_with("export.json"));
}

#[test]
fn missing_roster_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Roster::load(dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, quizgrade::ConfigError::Read { .. }));
}
