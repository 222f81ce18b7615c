//! Link resolution against entity link tables.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use super::Linked;
use super::template::UriTemplate;
use crate::error::{Error, Result};

/// A value that can be bound to a URI template variable.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// A string, bound as-is.
    Str(String),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number.
    Float(f64),
    /// A boolean, bound as `true`/`false`.
    Bool(bool),
    /// A UTC timestamp, bound as a round-trippable RFC 3339 string.
    Timestamp(DateTime<Utc>),
}

impl ParameterValue {
    /// Render the value as the string bound into the template.
    pub fn render(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            Self::Int(value) => value.to_string(),
            Self::UInt(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Timestamp(value) => value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParameterValue {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<u64> for ParameterValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for ParameterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Named parameters for link resolution.
///
/// Parameters iterate in name order, which keeps the listing in
/// unknown-parameter errors stable.
///
/// # Example
///
/// ```ignore
/// let params = Parameters::new()
///     .with("count", 50)
///     .with("fromDateUtc", Utc::now());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(BTreeMap<String, ParameterValue>);

impl Parameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any previous value under the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a parameter in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// The number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Resolve a named link on an entity into an expanded href.
///
/// The href string is relative or absolute exactly as the server sent it;
/// [`SeqClient::resolve_link`](crate::SeqClient::resolve_link) joins it
/// against the server base URL. Fails without touching the network when
/// the link is missing or a supplied parameter has no matching template
/// variable.
pub fn resolve_link<E: Linked>(
    entity: &E,
    link: &str,
    parameters: Option<&Parameters>,
) -> Result<String> {
    let href = entity
        .links()
        .get(link)
        .ok_or_else(|| Error::LinkNotAvailable {
            link: link.to_string(),
            entity: entity_name::<E>(),
        })?
        .href();

    let template = UriTemplate::parse(href)?;

    let mut values = BTreeMap::new();
    if let Some(parameters) = parameters {
        let declared = template.variable_names();
        let unknown: Vec<&str> = parameters
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !declared.contains(name))
            .collect();
        if !unknown.is_empty() {
            return Err(Error::UnknownParameters {
                names: unknown.join(", "),
            });
        }

        for (name, value) in parameters.iter() {
            values.insert(name.to_string(), value.render());
        }
    }

    Ok(template.expand(&values))
}

/// Short type name for link errors, without the module path.
fn entity_name<E>() -> String {
    let name = std::any::type_name::<E>();
    name.rsplit("::").next().unwrap_or(name).to_string()
}
