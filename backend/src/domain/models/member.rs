use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date-independent mapping from member id to display name
pub type NameRegistry = BTreeMap<String, String>;

/// Domain model representing one member on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    id: String,
    pub name: String,
}

impl Member {
    pub fn new(ordinal: usize) -> Self {
        Self {
            id: Self::generate_id(ordinal),
            name: Self::placeholder_name(ordinal),
        }
    }

    /// Zero-padded ordinal, at least 3 digits ("007", "042", "1000")
    pub fn generate_id(ordinal: usize) -> String {
        format!("{:03}", ordinal)
    }

    pub fn placeholder_name(ordinal: usize) -> String {
        format!("Member {}", ordinal)
    }

    /// Immutable once assigned
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name as it is persisted: surrounding whitespace removed
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}
