//! Scripted GUI scenarios for a desktop IDE
//!
//! Scenarios address UI objects through typed [`Selector`]s, resolve them to
//! live [`UIElement`] handles with a [`Locator`], and synchronize with the
//! application through the condition poller in [`poll`]. Everything runs
//! against an [`AutomationEngine`] owned by a [`Session`].

pub mod config;
pub mod element;
pub mod errors;
pub mod locator;
pub mod names;
pub mod object_map;
pub mod outcome;
pub mod platforms;
pub mod poll;
pub mod scenarios;
pub mod selector;
pub mod session;
pub mod simulation;
#[cfg(test)]
mod tests;
pub mod text;

pub use config::SessionConfig;
pub use element::{UIElement, UIElementAttributes};
pub use errors::AutomationError;
pub use locator::{Locator, Resolution};
pub use object_map::ObjectMap;
pub use outcome::{Outcomes, Record, Summary, Verdict};
pub use platforms::AutomationEngine;
pub use poll::{wait_for, WaitCondition, Waited};
pub use scenarios::{run_scenario, Scenario};
pub use selector::Selector;
pub use session::Session;
