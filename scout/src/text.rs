//! Checks on free-form log text scraped from the application

use crate::outcome::Outcomes;

/// Non-overlapping occurrences of `needle`, scanning left to right.
/// An empty needle never matches.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// One expectation about a log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogExpectation {
    Contains(String),
    Absent(String),
    /// Exactly this many non-overlapping occurrences
    Count(String, usize),
}

impl LogExpectation {
    pub fn holds(&self, log: &str) -> bool {
        match self {
            LogExpectation::Contains(s) => log.contains(s.as_str()),
            LogExpectation::Absent(s) => !log.contains(s.as_str()),
            LogExpectation::Count(s, n) => count_occurrences(log, s) == *n,
        }
    }

    /// Records the expectation's verdict and returns whether it held
    pub fn record(&self, outcomes: &Outcomes, log: &str) -> bool {
        match self {
            LogExpectation::Contains(s) => {
                outcomes.verify(log.contains(s.as_str()), &format!("Searching for {s:?} in log"))
            }
            LogExpectation::Absent(s) => outcomes.verify(
                !log.contains(s.as_str()),
                &format!("Verifying {s:?} is absent from log"),
            ),
            LogExpectation::Count(s, n) => outcomes.compare(
                count_occurrences(log, s),
                *n,
                &format!("Counting occurrences of {s:?} in log"),
            ),
        }
    }
}

/// Records every expectation; true only if all held
pub fn check_log(outcomes: &Outcomes, log: &str, expectations: &[LogExpectation]) -> bool {
    expectations
        .iter()
        .fold(true, |all, e| e.record(outcomes, log) && all)
}
