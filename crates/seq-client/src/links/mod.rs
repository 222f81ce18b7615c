//! Hypermedia link tables and resolution.
//!
//! Seq resources describe the operations available on them through named
//! links whose hrefs are RFC 6570 URI templates. Anything that implements
//! [`Linked`] can be navigated: [`resolve_link`] looks a link up by name,
//! checks the supplied [`Parameters`] against the template's variables and
//! expands it into a concrete href, all without touching the network.

mod resolve;
mod template;

pub use resolve::{ParameterValue, Parameters, resolve_link};
pub use template::UriTemplate;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named hypermedia link; the href may be a URI template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link {
    href: String,
}

impl Link {
    /// Create a link from an href or href template.
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    /// The raw href template.
    pub fn href(&self) -> &str {
        &self.href
    }
}

/// The link table carried by a Seq resource.
///
/// On the wire this is a JSON object mapping link names to href strings,
/// so names are unique within one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkCollection(HashMap<String, Link>);

impl LinkCollection {
    /// Create an empty link table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a link by name.
    pub fn get(&self, name: &str) -> Option<&Link> {
        self.0.get(name)
    }

    /// Whether a link with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Add a link, replacing any previous one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, link: Link) {
        self.0.insert(name.into(), link);
    }

    /// The number of links.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the links in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Link)> {
        self.0.iter().map(|(name, link)| (name.as_str(), link))
    }
}

/// Implemented by resources that carry a link table.
pub trait Linked {
    /// The resource's link table.
    fn links(&self) -> &LinkCollection;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_collection_deserializes_from_wire_shape() {
        let json = r#"{
            "Self": "api/signals/signal-m33301",
            "Group": "api/signals{?ownerId,shared,partial}"
        }"#;

        let links: LinkCollection = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(links.len(), 2);
        assert!(links.contains("Self"));
        assert_eq!(
            links.get("Group").map(Link::href),
            Some("api/signals{?ownerId,shared,partial}")
        );
    }

    #[test]
    fn test_link_serializes_as_plain_string() {
        let link = Link::new("api/events{?count}");
        let json = serde_json::to_string(&link).expect("Failed to serialize");
        assert_eq!(json, r#""api/events{?count}""#);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut links = LinkCollection::new();
        links.insert("Self", Link::new("api/old"));
        links.insert("Self", Link::new("api/new"));

        assert_eq!(links.len(), 1);
        assert_eq!(links.get("Self").map(Link::href), Some("api/new"));
    }
}
