//! Verdict recording.
//!
//! Assertions never panic and never return early: they append a [`Record`]
//! and hand back whether the check held, so a scenario can keep going after a
//! failed comparison. A step aborts by returning an [`AutomationError`], which
//! the runner records as Fatal through [`Outcomes::record_error`].

use crate::errors::AutomationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    Fatal,
    Warning,
    /// Informational entry, not a verdict
    Log,
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Fail | Verdict::Fatal)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Fatal => "FATAL",
            Verdict::Warning => "WARNING",
            Verdict::Log => "LOG",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub verdict: Verdict,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Scenario that was running when the record was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub passes: usize,
    pub fails: usize,
    pub fatals: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn succeeded(&self) -> bool {
        self.fails == 0 && self.fatals == 0
    }
}

#[derive(Default)]
struct State {
    records: Vec<Record>,
    scenario: Option<String>,
}

/// Shared recorder. Clones append to the same list.
#[derive(Clone, Default)]
pub struct Outcomes {
    state: Arc<Mutex<State>>,
}

impl Debug for Outcomes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outcomes")
            .field("summary", &self.summary())
            .finish()
    }
}

impl Outcomes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags subsequent records with `scenario`
    pub fn set_scenario(&self, scenario: Option<&str>) {
        if let Ok(mut state) = self.state.lock() {
            state.scenario = scenario.map(str::to_string);
        }
    }

    fn push(&self, verdict: Verdict, message: &str, detail: Option<String>) {
        match verdict {
            Verdict::Pass => info!(%message, "PASS"),
            Verdict::Log => info!(%message, "LOG"),
            Verdict::Warning => warn!(%message, detail = detail.as_deref().unwrap_or(""), "WARNING"),
            Verdict::Fail | Verdict::Fatal => {
                error!(%message, detail = detail.as_deref().unwrap_or(""), "{verdict}")
            }
        }
        // a poisoned lock still holds the records collected so far
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        let scenario = state.scenario.clone();
        state.records.push(Record {
            verdict,
            message: message.to_string(),
            detail,
            scenario,
            at: Utc::now(),
        });
    }

    /// Records Pass when `actual == expected`, Fail otherwise
    pub fn compare<T>(&self, actual: T, expected: T, message: &str) -> bool
    where
        T: PartialEq + Debug,
    {
        if actual == expected {
            self.push(Verdict::Pass, message, None);
            true
        } else {
            self.push(
                Verdict::Fail,
                message,
                Some(format!("expected {expected:?}, got {actual:?}")),
            );
            false
        }
    }

    /// Records Pass when `condition` holds, Fail otherwise
    pub fn verify(&self, condition: bool, message: &str) -> bool {
        if condition {
            self.push(Verdict::Pass, message, None);
        } else {
            self.push(Verdict::Fail, message, Some("condition was false".to_string()));
        }
        condition
    }

    pub fn passes(&self, message: &str) {
        self.push(Verdict::Pass, message, None);
    }

    pub fn fail(&self, message: &str, detail: Option<&str>) {
        self.push(Verdict::Fail, message, detail.map(str::to_string));
    }

    pub fn warning(&self, message: &str, detail: Option<&str>) {
        self.push(Verdict::Warning, message, detail.map(str::to_string));
    }

    pub fn log(&self, message: &str) {
        self.push(Verdict::Log, message, None);
    }

    /// Records a Fatal verdict. The caller decides whether the scenario goes on.
    pub fn fatal(&self, message: &str, detail: Option<&str>) {
        self.push(Verdict::Fatal, message, detail.map(str::to_string));
    }

    /// Records an error that escaped a scenario step
    pub fn record_error(&self, context: &str, error: &AutomationError) {
        let verdict = match error {
            AutomationError::AssertionMismatch(_) => Verdict::Fail,
            _ => Verdict::Fatal,
        };
        self.push(verdict, context, Some(error.to_string()));
    }

    pub fn records(&self) -> Vec<Record> {
        match self.state.lock() {
            Ok(state) => state.records.clone(),
            Err(poisoned) => poisoned.into_inner().records.clone(),
        }
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for record in self.records() {
            match record.verdict {
                Verdict::Pass => summary.passes += 1,
                Verdict::Fail => summary.fails += 1,
                Verdict::Fatal => summary.fatals += 1,
                Verdict::Warning => summary.warnings += 1,
                Verdict::Log => {}
            }
        }
        summary
    }
}
