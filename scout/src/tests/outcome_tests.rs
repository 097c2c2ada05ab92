use crate::outcome::{Outcomes, Verdict};
use crate::AutomationError;

#[test]
fn test_verdicts_accumulate() {
    let outcomes = Outcomes::new();
    assert!(outcomes.compare("Succeeded.", "Succeeded.", "label"));
    assert!(!outcomes.compare(2, 1, "count"));
    assert!(outcomes.verify(true, "exists"));
    outcomes.warning("Could not find resultLabel", Some("maybe failed early"));
    outcomes.log("just a note");

    let summary = outcomes.summary();
    assert_eq!(summary.passes, 2);
    assert_eq!(summary.fails, 1);
    assert_eq!(summary.warnings, 1);
    assert!(!summary.succeeded());

    let fail = &outcomes.records()[1];
    assert_eq!(fail.verdict, Verdict::Fail);
    assert_eq!(fail.detail.as_deref(), Some("expected 1, got 2"));
}

#[test]
fn test_fatal_and_escaped_errors() {
    let outcomes = Outcomes::new();
    outcomes.fatal("Cloning failed", Some("Finish never enabled"));
    let record = &outcomes.records()[0];
    assert_eq!(record.verdict, Verdict::Fatal);
    assert_eq!(record.detail.as_deref(), Some("Finish never enabled"));
    assert_eq!(outcomes.summary().fatals, 1);
    assert!(!outcomes.summary().succeeded());

    outcomes.record_error("step", &AutomationError::Timeout("slow".into()));
    assert_eq!(outcomes.summary().fatals, 2);
    outcomes.record_error("step", &AutomationError::AssertionMismatch("typed".into()));
    assert_eq!(outcomes.summary().fails, 1);
}

#[test]
fn test_clones_share_records_and_scenario_tag() {
    let outcomes = Outcomes::new();
    let other = outcomes.clone();
    outcomes.set_scenario(Some("git-clone"));
    other.passes("from the clone");
    outcomes.set_scenario(None);
    outcomes.passes("untagged");

    let records = outcomes.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].scenario.as_deref(), Some("git-clone"));
    assert_eq!(records[1].scenario, None);
}

#[test]
fn test_records_serialize() {
    let outcomes = Outcomes::new();
    outcomes.fail("The checked out project was not being opened.", Some("details"));
    let json = serde_json::to_value(outcomes.records()).unwrap();
    assert_eq!(json[0]["verdict"], "fail");
    assert_eq!(json[0]["detail"], "details");
    assert!(json[0].get("scenario").is_none());

    let at = json[0]["at"].as_str().expect("timestamp string");
    let parsed = chrono::DateTime::parse_from_rfc3339(at).unwrap();
    assert!(chrono::Utc::now().signed_duration_since(parsed) < chrono::Duration::seconds(60));

    let back: Vec<crate::Record> = serde_json::from_value(json).unwrap();
    assert_eq!(back, outcomes.records());
}
