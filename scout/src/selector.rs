use crate::element::{UIElement, UIElementAttributes};
use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Structured address of a UI element.
///
/// Every populated field is a constraint that a candidate element has to
/// satisfy; fields left as `None` are not checked. A selector is resolved
/// freshly on each lookup, it never caches the element it found.
///
/// Build one with [`Selector::builder`] or parse the property-list form:
///
/// ```
/// use scout::Selector;
/// let sel: Selector = "{name='Repo' type='QLineEdit' visible='1'}".parse()?;
/// assert_eq!(sel.type_name(), Some("QLineEdit"));
/// # Ok::<(), scout::AutomationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    container: Option<Box<Selector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unnamed: Option<bool>,
    /// 1-based index among all matches, in traversal order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    occurrence: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
}

impl Selector {
    pub fn builder() -> SelectorBuilder {
        SelectorBuilder::default()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn container(&self) -> Option<&Selector> {
        self.container.as_deref()
    }

    pub fn visible(&self) -> Option<bool> {
        self.visible
    }

    pub fn unnamed(&self) -> Option<bool> {
        self.unnamed
    }

    pub fn occurrence(&self) -> Option<usize> {
        self.occurrence
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Copy of this selector without the occurrence index. Used when the
    /// caller wants every match rather than one of them.
    pub fn without_occurrence(&self) -> Selector {
        Selector {
            occurrence: None,
            ..self.clone()
        }
    }

    /// Checks the element's own properties. The container constraint is
    /// ignored here, see [`Selector::matches_element`].
    pub fn matches_attributes(&self, attrs: &UIElementAttributes) -> bool {
        if let Some(type_name) = &self.type_name {
            if &attrs.type_name != type_name {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if attrs.name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        if let Some(unnamed) = self.unnamed {
            let has_name = attrs.name.as_deref().is_some_and(|n| !n.is_empty());
            if unnamed == has_name {
                return false;
            }
        }
        if let Some(text) = &self.text {
            if attrs.text.as_deref() != Some(text.as_str()) {
                return false;
            }
        }
        if let Some(visible) = self.visible {
            if attrs.visible != visible {
                return false;
            }
        }
        self.properties
            .iter()
            .all(|(key, value)| attrs.properties.get(key) == Some(value))
    }

    /// Full structural match: own properties plus, when a container is set,
    /// at least one ancestor matching the container selector.
    pub fn matches_element(&self, element: &UIElement) -> bool {
        if !self.matches_attributes(&element.attributes()) {
            return false;
        }
        let Some(container) = self.container.as_deref() else {
            return true;
        };
        let mut current = element.parent().ok().flatten();
        while let Some(ancestor) = current {
            if container.matches_element(&ancestor) {
                return true;
            }
            current = ancestor.parent().ok().flatten();
        }
        false
    }

    /// Picks the element the selector designates out of all structural
    /// matches: the `occurrence`-th one when set, otherwise the first.
    pub fn pick(&self, mut matches: Vec<UIElement>) -> Option<UIElement> {
        let index = self.occurrence.unwrap_or(1).checked_sub(1)?;
        if index < matches.len() {
            Some(matches.swap_remove(index))
        } else {
            None
        }
    }

    /// Parses a property-list selector, resolving `window`/`container`
    /// references through `resolve_ref`.
    pub fn parse_with<F>(input: &str, resolve_ref: &mut F) -> Result<Selector, AutomationError>
    where
        F: FnMut(&str) -> Result<Selector, AutomationError>,
    {
        let mut parser = RealNameParser::new(input);
        let selector = parser.parse_object(resolve_ref)?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(AutomationError::InvalidSelector(format!(
                "trailing input after selector at offset {}: {input:?}",
                parser.pos
            )));
        }
        Ok(selector)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(container) = &self.container {
            parts.push(format!("container={container}"));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name='{}'", escape(name)));
        }
        if let Some(occurrence) = self.occurrence {
            parts.push(format!("occurrence='{occurrence}'"));
        }
        for (key, value) in &self.properties {
            parts.push(format!("{key}='{}'", escape(value)));
        }
        if let Some(text) = &self.text {
            parts.push(format!("text='{}'", escape(text)));
        }
        if let Some(type_name) = &self.type_name {
            parts.push(format!("type='{}'", escape(type_name)));
        }
        if let Some(unnamed) = self.unnamed {
            parts.push(format!("unnamed='{}'", u8::from(unnamed)));
        }
        if let Some(visible) = self.visible {
            parts.push(format!("visible='{}'", u8::from(visible)));
        }
        write!(f, "{{{}}}", parts.join(" "))
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

impl FromStr for Selector {
    type Err = AutomationError;

    /// Parses `{key='value' ...}`. Symbolic references are rejected here
    /// because resolving them needs an [`crate::ObjectMap`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse_with(s, &mut |reference: &str| {
            Err(AutomationError::InvalidSelector(format!(
                "symbolic reference {reference:?} needs an object map"
            )))
        })
    }
}

impl TryFrom<&str> for Selector {
    type Error = AutomationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Builder that validates the selector when [`SelectorBuilder::build`] is called.
#[derive(Debug, Default, Clone)]
pub struct SelectorBuilder {
    inner: SelectorFields,
}

#[derive(Debug, Default, Clone)]
struct SelectorFields {
    type_name: Option<String>,
    name: Option<String>,
    text: Option<String>,
    container: Option<Selector>,
    visible: Option<bool>,
    unnamed: Option<bool>,
    occurrence: Option<usize>,
    properties: BTreeMap<String, String>,
}

impl SelectorBuilder {
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.inner.type_name = Some(type_name.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = Some(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.inner.text = Some(text.into());
        self
    }

    pub fn container(mut self, container: Selector) -> Self {
        self.inner.container = Some(container);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.inner.visible = Some(visible);
        self
    }

    pub fn unnamed(mut self, unnamed: bool) -> Self {
        self.inner.unnamed = Some(unnamed);
        self
    }

    pub fn occurrence(mut self, occurrence: usize) -> Self {
        self.inner.occurrence = Some(occurrence);
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.properties.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Selector, AutomationError> {
        let f = self.inner;
        let has_constraint = f.type_name.is_some()
            || f.name.is_some()
            || f.text.is_some()
            || f.container.is_some()
            || f.visible.is_some()
            || f.unnamed.is_some()
            || !f.properties.is_empty();
        if !has_constraint {
            return Err(AutomationError::InvalidSelector(
                "selector has no constraints and would match every element".to_string(),
            ));
        }
        for (label, value) in [("type", &f.type_name), ("name", &f.name)] {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(AutomationError::InvalidSelector(format!(
                    "'{label}' must not be empty"
                )));
            }
        }
        if f.occurrence == Some(0) {
            return Err(AutomationError::InvalidSelector(
                "occurrence is 1-based, got 0".to_string(),
            ));
        }
        if let Some(key) = f.properties.keys().find(|k| k.trim().is_empty()) {
            return Err(AutomationError::InvalidSelector(format!(
                "property key {key:?} must not be blank"
            )));
        }
        Ok(Selector {
            type_name: f.type_name,
            name: f.name,
            text: f.text,
            container: f.container.map(Box::new),
            visible: f.visible,
            unnamed: f.unnamed,
            occurrence: f.occurrence,
            properties: f.properties,
        })
    }
}

/// Value of a `key=value` pair before it is applied to the builder
enum RawValue {
    Quoted(String),
    Nested(Selector),
}

struct RealNameParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> RealNameParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: &str) -> AutomationError {
        AutomationError::InvalidSelector(format!(
            "{message} at offset {} in {:?}",
            self.pos, self.input
        ))
    }

    fn expect(&mut self, expected: char) -> Result<(), AutomationError> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{expected}'"))),
        }
    }

    fn parse_object<F>(&mut self, resolve_ref: &mut F) -> Result<Selector, AutomationError>
    where
        F: FnMut(&str) -> Result<Selector, AutomationError>,
    {
        self.skip_whitespace();
        self.expect('{')?;
        let mut builder = Selector::builder();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("unterminated selector")),
                _ => {}
            }
            let key = self.parse_key()?;
            self.skip_whitespace();
            self.expect('=')?;
            self.skip_whitespace();
            let value = self.parse_value(resolve_ref)?;
            builder = apply(builder, &key, value, resolve_ref).map_err(|e| match e {
                AutomationError::InvalidSelector(msg) => {
                    AutomationError::InvalidSelector(format!("{msg} (key '{key}')"))
                }
                other => other,
            })?;
        }
        builder.build()
    }

    fn parse_key(&mut self) -> Result<String, AutomationError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.bump();
        }
        if start == self.pos {
            return Err(self.error("expected property name"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_value<F>(&mut self, resolve_ref: &mut F) -> Result<RawValue, AutomationError>
    where
        F: FnMut(&str) -> Result<Selector, AutomationError>,
    {
        match self.peek() {
            Some('\'') | Some('"') => self.parse_quoted().map(RawValue::Quoted),
            Some('{') => self.parse_object(resolve_ref).map(RawValue::Nested),
            Some(_) => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_whitespace() && c != '}')
                {
                    self.bump();
                }
                Ok(RawValue::Quoted(self.input[start..self.pos].to_string()))
            }
            None => Err(self.error("expected value")),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, AutomationError> {
        let quote = self.bump().ok_or_else(|| self.error("expected quote"))?;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("dangling escape")),
                },
                Some(ch) if ch == quote => return Ok(value),
                Some(ch) => value.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, AutomationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(AutomationError::InvalidSelector(format!(
            "expected a boolean flag, got {other:?}"
        ))),
    }
}

fn apply<F>(
    builder: SelectorBuilder,
    key: &str,
    value: RawValue,
    resolve_ref: &mut F,
) -> Result<SelectorBuilder, AutomationError>
where
    F: FnMut(&str) -> Result<Selector, AutomationError>,
{
    match (key, value) {
        ("window" | "container", RawValue::Nested(selector)) => Ok(builder.container(selector)),
        ("window" | "container", RawValue::Quoted(reference)) => {
            if reference.trim_start().starts_with('{') {
                let selector = Selector::parse_with(&reference, resolve_ref)?;
                Ok(builder.container(selector))
            } else {
                Ok(builder.container(resolve_ref(&reference)?))
            }
        }
        (_, RawValue::Nested(_)) => Err(AutomationError::InvalidSelector(
            "only window/container accept a nested selector".to_string(),
        )),
        ("type", RawValue::Quoted(v)) => Ok(builder.type_name(v)),
        ("name", RawValue::Quoted(v)) => Ok(builder.name(v)),
        ("text", RawValue::Quoted(v)) => Ok(builder.text(v)),
        ("visible", RawValue::Quoted(v)) => Ok(builder.visible(parse_flag(&v)?)),
        ("unnamed", RawValue::Quoted(v)) => Ok(builder.unnamed(parse_flag(&v)?)),
        ("occurrence", RawValue::Quoted(v)) => {
            let occurrence = v.trim().parse::<usize>().map_err(|_| {
                AutomationError::InvalidSelector(format!("invalid occurrence {v:?}"))
            })?;
            Ok(builder.occurrence(occurrence))
        }
        (other, RawValue::Quoted(v)) => Ok(builder.property(other, v)),
    }
}
