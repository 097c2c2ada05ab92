//! Symbolic names for selectors.
//!
//! An object map is line oriented text, one entry per line:
//!
//! ```text
//! :Git Repository Clone.Finish_QPushButton	{text='Finish' type='QPushButton' visible='1'}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Real names may point at
//! other entries through `window=':Other Name'`.

use crate::errors::AutomationError;
use crate::selector::Selector;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMap {
    entries: BTreeMap<String, String>,
}

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses object-map text. Entries are validated lazily, on resolve.
    pub fn parse(text: &str) -> Result<Self, AutomationError> {
        let mut map = ObjectMap::new();
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((symbolic, real)) = split_entry(line) else {
                return Err(AutomationError::InvalidSelector(format!(
                    "object map line {}: expected '<:name> <{{real name}}>', got {line:?}",
                    line_no + 1
                )));
            };
            if !symbolic.starts_with(':') {
                return Err(AutomationError::InvalidSelector(format!(
                    "object map line {}: symbolic name {symbolic:?} must start with ':'",
                    line_no + 1
                )));
            }
            if map.entries.insert(symbolic.to_string(), real.to_string()).is_some() {
                return Err(AutomationError::InvalidSelector(format!(
                    "object map line {}: duplicate symbolic name {symbolic:?}",
                    line_no + 1
                )));
            }
        }
        debug!(entries = map.entries.len(), "parsed object map");
        Ok(map)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::InvalidArgument(format!("cannot read object map {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Adds or replaces an entry
    pub fn insert(&mut self, symbolic: impl Into<String>, real_name: impl Into<String>) {
        self.entries.insert(symbolic.into(), real_name.into());
    }

    /// Entries of `other` override entries of `self`
    pub fn merge(&mut self, other: ObjectMap) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn symbolic_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn real_name(&self, symbolic: &str) -> Option<&str> {
        self.entries.get(symbolic).map(String::as_str)
    }

    /// Turns a symbolic name (`:...`) or a real name (`{...}`) into a selector
    pub fn resolve(&self, name: &str) -> Result<Selector, AutomationError> {
        let mut stack = Vec::new();
        self.resolve_inner(name.trim(), &mut stack)
    }

    fn resolve_inner(&self, name: &str, stack: &mut Vec<String>) -> Result<Selector, AutomationError> {
        if name.starts_with('{') {
            return Selector::parse_with(name, &mut |reference: &str| {
                self.resolve_inner(reference.trim(), stack)
            });
        }
        if !name.starts_with(':') {
            return Err(AutomationError::InvalidSelector(format!(
                "{name:?} is neither a symbolic name nor a real name"
            )));
        }
        if stack.iter().any(|seen| seen == name) {
            stack.push(name.to_string());
            return Err(AutomationError::InvalidSelector(format!(
                "cyclic object map reference: {}",
                stack.join(" -> ")
            )));
        }
        let real = self.entries.get(name).ok_or_else(|| {
            AutomationError::InvalidSelector(format!("unknown symbolic name {name:?}"))
        })?;
        stack.push(name.to_string());
        let resolved = Selector::parse_with(real, &mut |reference: &str| {
            self.resolve_inner(reference.trim(), stack)
        });
        stack.pop();
        resolved
    }

    /// Resolves every entry, collecting the failures
    pub fn validate(&self) -> Vec<(String, AutomationError)> {
        self.entries
            .keys()
            .filter_map(|name| self.resolve(name).err().map(|e| (name.clone(), e)))
            .collect()
    }
}

/// Splits at the tab, or else at the first whitespace before the opening brace
fn split_entry(line: &str) -> Option<(&str, &str)> {
    if let Some((symbolic, real)) = line.split_once('\t') {
        return Some((symbolic.trim(), real.trim())).filter(|(_, r)| r.starts_with('{'));
    }
    let brace = line.find('{')?;
    let symbolic = line[..brace].trim();
    if symbolic.is_empty() {
        return None;
    }
    Some((symbolic, line[brace..].trim()))
}
