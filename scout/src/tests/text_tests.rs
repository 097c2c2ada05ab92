use crate::outcome::{Outcomes, Verdict};
use crate::text::{check_log, count_occurrences, LogExpectation};

const CLONE_LOG: &str = "Cloning into 'myCloneOfIfw'...\n\
remote: Enumerating objects: 10, done.\n\
remote: Total 10 (delta 2), reused 0 (delta 0)\n\
Receiving objects: 100% (10/10), done.\n\
Resolving deltas: 100% (2/2), done.\n";

#[test]
fn test_count_occurrences_is_non_overlapping() {
    assert_eq!(count_occurrences("aaaa", "aa"), 2);
    assert_eq!(count_occurrences(CLONE_LOG, "remote: Total"), 1);
    assert_eq!(count_occurrences(CLONE_LOG, "remote:"), 2);
    assert_eq!(count_occurrences(CLONE_LOG, ""), 0);
    assert_eq!(count_occurrences("", "x"), 0);
}

#[test]
fn test_expectations() {
    assert!(LogExpectation::Contains("'myCloneOfIfw'...".into()).holds(CLONE_LOG));
    assert!(LogExpectation::Absent("Stopping...".into()).holds(CLONE_LOG));
    assert!(LogExpectation::Count("Receiving objects:".into(), 1).holds(CLONE_LOG));
    assert!(!LogExpectation::Count("Receiving objects:".into(), 2).holds(CLONE_LOG));
}

#[test]
fn test_check_log_records_every_expectation() {
    let outcomes = Outcomes::new();
    let all = check_log(
        &outcomes,
        CLONE_LOG,
        &[
            LogExpectation::Count("remote: Total".into(), 1),
            LogExpectation::Contains("fatal: ".into()),
            LogExpectation::Absent("Stopping...".into()),
        ],
    );
    assert!(!all);
    let verdicts: Vec<Verdict> = outcomes.records().iter().map(|r| r.verdict).collect();
    assert_eq!(verdicts, vec![Verdict::Pass, Verdict::Fail, Verdict::Pass]);
}
