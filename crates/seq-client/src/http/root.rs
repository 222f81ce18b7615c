//! The server's root API document.

use serde::{Deserialize, Serialize};

use crate::links::{LinkCollection, Linked};

/// The root API document returned by `GET {server}/api`.
///
/// Navigation starts here: the root's link table advertises the resource
/// groups the server exposes, and each group links onward to its
/// collections and items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RootDocument {
    /// Product name reported by the server.
    pub product: Option<String>,
    /// Server version.
    pub version: Option<String>,
    /// Operator-assigned instance name; empty for the default instance.
    pub instance_name: Option<String>,
    /// Links to the server's resource groups.
    pub links: LinkCollection,
}

impl Linked for RootDocument {
    fn links(&self) -> &LinkCollection {
        &self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_document_deserializes_pascal_case() {
        let json = r#"{
            "Product": "Seq",
            "Version": "2024.3.11034",
            "InstanceName": "",
            "Links": {
                "Events": "api/events/resources",
                "Signals": "api/signals/resources"
            }
        }"#;

        let root: RootDocument = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(root.product.as_deref(), Some("Seq"));
        assert_eq!(root.version.as_deref(), Some("2024.3.11034"));
        assert!(root.links().contains("Events"));
        assert!(root.links().contains("Signals"));
    }

    #[test]
    fn test_missing_fields_default() {
        let root: RootDocument = serde_json::from_str("{}").expect("Failed to deserialize");
        assert!(root.product.is_none());
        assert!(root.links().is_empty());
    }
}
